// src/strategy/implementations.rs

use crate::error::Result;
use crate::model::action::{Action, ActionBounds, INJECT_SIGNAL};
use crate::model::factory::FactoryState;
use crate::simulation::codec::decode_actions;
use crate::strategy::exploration::ExplorationNoise;
use crate::strategy::traits::{ContinuousActor, DecisionContext, RoutingPolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform signal in `[-1, machines)` for every product.
pub fn random_actions<R: Rng + ?Sized>(state: &FactoryState, rng: &mut R) -> Result<Vec<Action>> {
    let machines = state.machine_count();
    (0..state.product_count())
        .map(|product| {
            let signal = rng.gen_range(INJECT_SIGNAL..machines as i64);
            Action::from_signal(product, signal, machines, ActionBounds::Reject)
        })
        .collect()
}

// =========================================================================
// 1. Random Policy
// =========================================================================

/// Picks a random action for every product, every tick.
/// Useful as a lower bound when comparing trained agents.
#[derive(Debug)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl RoutingPolicy for RandomPolicy {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Vec<Action>> {
        random_actions(ctx.state, &mut self.rng)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

// =========================================================================
// 2. Linear FIFO Policy
// =========================================================================

/// Sends each product to the machine numbered like its next step and injects
/// it once it is there.
///
/// Only sensible on lines where machine `m` owns step `m`.
#[derive(Debug, Clone, Default)]
pub struct LinearFifoPolicy;

impl LinearFifoPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl RoutingPolicy for LinearFifoPolicy {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Vec<Action>> {
        let state = ctx.state;
        Ok((0..state.product_count())
            .map(|product| match state.next_required_step(product) {
                Some(step) if state.product_bucket[product] != Some(step) => {
                    Action::MoveTo(step)
                }
                _ => Action::Inject,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fifo"
    }
}

// =========================================================================
// 3. Actor Policy
// =========================================================================

/// Drives the factory with a continuous actor, optionally adding
/// exploration noise before decoding.
#[derive(Debug)]
pub struct ActorPolicy<A: ContinuousActor> {
    actor: A,
    noise: Option<ExplorationNoise>,
    rng: StdRng,
}

impl<A: ContinuousActor> ActorPolicy<A> {
    pub fn new(actor: A) -> Self {
        Self {
            actor,
            noise: None,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_exploration(mut self, noise: ExplorationNoise, seed: Option<u64>) -> Self {
        self.noise = Some(noise);
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        self
    }
}

impl<A: ContinuousActor> RoutingPolicy for ActorPolicy<A> {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Vec<Action>> {
        let mut raw = self.actor.select_action(ctx.observation);
        if let Some(noise) = self.noise.as_mut() {
            noise.apply(&mut raw, &mut self.rng)?;
        }
        decode_actions(
            &raw,
            ctx.state.product_count(),
            ctx.state.machine_count(),
        )
    }

    fn name(&self) -> &'static str {
        "actor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::matrix::Matrix;
    use crate::simulation::codec::encode_state;

    fn diagonal_line() -> FactoryState {
        FactoryState::from_matrices(
            Matrix::from_rows(
                "wt",
                vec![
                    vec![Some(1), None, None],
                    vec![None, Some(1), None],
                    vec![None, None, Some(1)],
                ],
            )
            .unwrap(),
            Matrix::from_rows("pd", vec![vec![true; 3], vec![true; 3]]).unwrap(),
            Matrix::from_rows(
                "tt",
                vec![
                    vec![None, Some(1), Some(2)],
                    vec![Some(1), None, Some(1)],
                    vec![Some(2), Some(1), None],
                ],
            )
            .unwrap(),
            vec![Some(0), Some(2)],
        )
        .unwrap()
    }

    #[derive(Debug)]
    struct FixedActor(Vec<f32>);

    impl ContinuousActor for FixedActor {
        fn select_action(&mut self, _observation: &[f32]) -> Vec<f32> {
            self.0.clone()
        }
    }

    #[test]
    fn fifo_injects_at_the_right_machine_and_moves_otherwise() {
        let mut state = diagonal_line();
        let obs = encode_state(&state);
        let ctx = DecisionContext {
            state: &state,
            observation: &obs,
            timestep: 0,
        };
        let actions = LinearFifoPolicy::new().decide(&ctx).unwrap();
        assert_eq!(actions, vec![Action::Inject, Action::MoveTo(0)]);

        state.product_design.row_mut(1).fill(false);
        let ctx = DecisionContext {
            state: &state,
            observation: &obs,
            timestep: 1,
        };
        let actions = LinearFifoPolicy::new().decide(&ctx).unwrap();
        assert_eq!(actions[1], Action::Inject);
    }

    #[test]
    fn random_policy_stays_in_range() {
        let state = diagonal_line();
        let mut policy = RandomPolicy::new(Some(5));
        let obs = encode_state(&state);
        let ctx = DecisionContext {
            state: &state,
            observation: &obs,
            timestep: 0,
        };
        for _ in 0..100 {
            for action in policy.decide(&ctx).unwrap() {
                if let Action::MoveTo(m) = action {
                    assert!(m < 3);
                }
            }
        }
    }

    #[test]
    fn actor_policy_decodes_raw_scores() {
        let state = diagonal_line();
        let obs = encode_state(&state);
        let ctx = DecisionContext {
            state: &state,
            observation: &obs,
            timestep: 0,
        };
        let raw = vec![0.9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.8];
        let mut policy = ActorPolicy::new(FixedActor(raw));
        let actions = policy.decide(&ctx).unwrap();
        assert_eq!(actions, vec![Action::Inject, Action::MoveTo(2)]);
    }

    #[test]
    fn actor_with_wrong_width_is_an_error() {
        let state = diagonal_line();
        let obs = encode_state(&state);
        let ctx = DecisionContext {
            state: &state,
            observation: &obs,
            timestep: 0,
        };
        let mut policy = ActorPolicy::new(FixedActor(vec![0.0; 3]))
            .with_exploration(ExplorationNoise::default(), Some(1));
        assert!(policy.decide(&ctx).is_err());
    }
}
