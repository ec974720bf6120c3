//! Property-based tests for the factory step pipeline.
//!
//! Random factories are driven with random action sequences and the
//! structural invariants are checked after every tick.

use cell_flow::model::action::Action;
use cell_flow::model::builder::FactoryBuilder;
use cell_flow::model::factory::FactoryState;
use cell_flow::simulation::codec::{decode_actions, encode_state, observation_dim};
use cell_flow::simulation::config::{FactoryConfig, FailureConfig, LineLayout};
use cell_flow::simulation::pipeline::{factory_step, inject};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ===========================================================================
// Generators
// ===========================================================================

fn build(seed: u64, machines: usize, products: usize) -> FactoryState {
    let config = FactoryConfig {
        layout: LineLayout::Random,
        machines,
        products,
        extra_skill_machines: machines / 2,
        extra_skills: machines / 2,
        ..FactoryConfig::default()
    };
    let builder = FactoryBuilder::new(config).unwrap();
    builder.build(&mut StdRng::seed_from_u64(seed)).unwrap()
}

fn to_actions(signals: &[i64], machines: usize) -> Vec<Action> {
    signals
        .iter()
        .map(|&s| {
            let s = s.rem_euclid(machines as i64 + 1) - 1;
            if s < 0 {
                Action::Inject
            } else {
                Action::MoveTo(s as usize)
            }
        })
        .collect()
}

fn noisy_failures() -> FailureConfig {
    FailureConfig {
        probability: 0.2,
        min_downtime: 1,
        max_downtime: 6,
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every product is in exactly one place, and design cells never come back.
    #[test]
    fn ticks_preserve_structural_invariants(
        seed in any::<u64>(),
        machines in 2usize..6,
        products in 1usize..6,
        ticks in proptest::collection::vec(proptest::collection::vec(any::<i64>(), 6), 1..80),
    ) {
        let mut state = build(seed, machines, products);
        let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
        let failure = noisy_failures();

        for (step, signals) in ticks.iter().enumerate() {
            let before = state.product_design.clone();
            let actions = to_actions(&signals[..products], machines);
            factory_step(&mut state, &actions, step as u32, 1_000, 0, &failure, &mut rng).unwrap();

            prop_assert!(state.check_invariants().is_empty(), "{:?}", state.check_invariants());
            for (was, now) in before.iter().zip(state.product_design.iter()) {
                prop_assert!(*was || !*now, "a finished step became required again");
            }
        }
    }

    /// Occupants always run a step their machine can perform now or could
    /// perform before it failed.
    #[test]
    fn occupants_match_machine_capabilities(
        seed in any::<u64>(),
        ticks in proptest::collection::vec(proptest::collection::vec(any::<i64>(), 4), 1..60),
    ) {
        let mut state = build(seed, 4, 4);
        let mut rng = StdRng::seed_from_u64(seed);
        let failure = noisy_failures();

        for (step, signals) in ticks.iter().enumerate() {
            let actions = to_actions(signals, 4);
            factory_step(&mut state, &actions, step as u32, 1_000, 0, &failure, &mut rng).unwrap();

            for (machine, slot) in state.occupancy.iter().enumerate() {
                if let Some(o) = slot {
                    let capable = state.working_time[(machine, o.step)].is_some()
                        || state.failure_info[(machine, o.step)].is_some();
                    prop_assert!(capable);
                    prop_assert!(state.product_design[(o.product, o.step)]);
                }
            }
        }
    }

    /// Once nothing is required, further ticks keep reporting done.
    #[test]
    fn termination_is_monotonic(
        seed in any::<u64>(),
        ticks in proptest::collection::vec(proptest::collection::vec(any::<i64>(), 3), 1..20),
    ) {
        let mut state = build(seed, 3, 3);
        state.product_design.row_mut(0).fill(false);
        state.product_design.row_mut(1).fill(false);
        state.product_design.row_mut(2).fill(false);
        let mut rng = StdRng::seed_from_u64(seed);

        for (step, signals) in ticks.iter().enumerate() {
            let actions = to_actions(signals, 3);
            let out = factory_step(&mut state, &actions, step as u32, 100, 0, &noisy_failures(), &mut rng)
                .unwrap();
            prop_assert!(out.done);
        }
    }

    /// Injecting a second time right after an injection changes nothing.
    #[test]
    fn repeated_inject_is_idempotent(seed in any::<u64>(), products in 1usize..6) {
        let mut state = build(seed, 4, products);
        let all_inject = vec![Action::Inject; products];

        inject(&mut state, &all_inject);
        let settled = state.clone();
        inject(&mut state, &all_inject);
        prop_assert_eq!(state, settled);
    }

    /// Observations always have the declared width and stay in [-1, 1].
    #[test]
    fn observations_are_bounded(
        seed in any::<u64>(),
        machines in 2usize..6,
        products in 1usize..6,
        ticks in 0usize..40,
    ) {
        let mut state = build(seed, machines, products);
        let mut rng = StdRng::seed_from_u64(seed);
        let actions = vec![Action::Inject; products];
        for step in 0..ticks {
            factory_step(&mut state, &actions, step as u32, 1_000, 0, &noisy_failures(), &mut rng)
                .unwrap();
        }

        let obs = encode_state(&state);
        prop_assert_eq!(obs.len(), observation_dim(products, machines));
        prop_assert!(obs.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    /// Decoded actions are always in range for the factory.
    #[test]
    fn decoded_actions_are_in_range(
        raw in proptest::collection::vec(-10.0f32..10.0, 3 * 5),
    ) {
        let actions = decode_actions(&raw, 3, 4).unwrap();
        prop_assert_eq!(actions.len(), 3);
        for action in actions {
            if let Action::MoveTo(m) = action {
                prop_assert!(m < 4);
            }
        }
    }
}
