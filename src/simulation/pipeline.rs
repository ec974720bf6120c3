// src/simulation/pipeline.rs

//! One discrete tick of the factory.
//!
//! The sub-steps run in a fixed order and later ones observe what earlier ones
//! did in the same tick: a product ejected in step 2 can be dispatched in step
//! 4, a machine that recovers in step 5 can accept work in step 6.

use crate::error::{FactoryError, Result};
use crate::model::action::Action;
use crate::model::factory::{FactoryState, Occupancy, Transit};
use crate::simulation::config::FailureConfig;
use rand::Rng;
use tracing::debug;

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f64,
    pub done: bool,
}

/// Advances `state` by one tick.
///
/// `step` is the zero-based index of this tick in the episode and
/// `finished_baseline` the number of finished steps that should not be
/// credited to the caller (e.g. progress made during a random warm-up).
pub fn factory_step<R: Rng + ?Sized>(
    state: &mut FactoryState,
    actions: &[Action],
    step: u32,
    max_timesteps: u32,
    finished_baseline: usize,
    failure: &FailureConfig,
    rng: &mut R,
) -> Result<StepOutcome> {
    validate_actions(state, actions)?;

    advance_work(state);
    eject(state);
    advance_travel(state);
    dispatch(state, actions);
    induce_failure(state, failure, rng);
    inject(state, actions);

    let reward = reward(state, step, max_timesteps, finished_baseline);
    let done = is_done(state);
    if done {
        debug!(step, "all products finished");
    }

    Ok(StepOutcome { reward, done })
}

fn validate_actions(state: &FactoryState, actions: &[Action]) -> Result<()> {
    if actions.len() != state.product_count() {
        return Err(FactoryError::DimensionMismatch {
            what: "action vector",
            expected: state.product_count(),
            found: actions.len(),
        });
    }
    let machines = state.machine_count();
    for (product, action) in actions.iter().enumerate() {
        if let Action::MoveTo(target) = *action {
            if target >= machines {
                return Err(FactoryError::InvalidAction {
                    product,
                    signal: target as i64,
                    machines,
                });
            }
        }
    }
    Ok(())
}

/// 1. Every occupied machine works one tick.
pub fn advance_work(state: &mut FactoryState) {
    for slot in state.occupancy.iter_mut().flatten() {
        if let Some(remaining) = slot.remaining {
            let left = remaining.saturating_sub(1);
            slot.remaining = (left > 0).then_some(left);
        }
    }
}

/// 2. Finished products leave their machine and the step is marked done.
pub fn eject(state: &mut FactoryState) {
    for machine in 0..state.occupancy.len() {
        if let Some(Occupancy {
            product,
            remaining: None,
            step,
        }) = state.occupancy[machine]
        {
            state.product_design[(product, step)] = false;
            state.product_bucket[product] = Some(machine);
            state.occupancy[machine] = None;
        }
    }
}

/// 3. Travelling products move one tick closer; arrivals land in the target bucket.
pub fn advance_travel(state: &mut FactoryState) {
    for product in 0..state.transit.len() {
        if let Some(transit) = state.transit[product].as_mut() {
            transit.remaining = transit.remaining.saturating_sub(1);
            if transit.remaining == 0 {
                state.product_bucket[product] = Some(transit.target);
                state.transit[product] = None;
            }
        }
    }
}

/// 4. Stationary products with a move order start travelling.
pub fn dispatch(state: &mut FactoryState, actions: &[Action]) {
    for (product, action) in actions.iter().enumerate() {
        let Action::MoveTo(target) = *action else {
            continue;
        };
        let Some(position) = state.product_bucket[product] else {
            continue;
        };
        if position == target {
            continue;
        }
        // Off-diagonal travel times are guaranteed by construction.
        if let Some(remaining) = state.travel_time[(position, target)] {
            state.transit[product] = Some(Transit { target, remaining });
            state.product_bucket[product] = None;
        }
    }
}

/// 5. Failed machines recover, then idle machines may break down.
pub fn induce_failure<R: Rng + ?Sized>(
    state: &mut FactoryState,
    failure: &FailureConfig,
    rng: &mut R,
) {
    recover_machines(state);
    trigger_failures(state, failure, rng);
}

pub fn recover_machines(state: &mut FactoryState) {
    for machine in 0..state.machine_count() {
        let Some(counter) = state.failure_counter[machine] else {
            continue;
        };
        let counter = counter.saturating_sub(1);
        if counter > 0 {
            state.failure_counter[machine] = Some(counter);
            continue;
        }

        let saved: Vec<Option<u32>> = state.failure_info.row(machine).to_vec();
        state.working_time.row_mut(machine).copy_from_slice(&saved);
        state.failure_info.row_mut(machine).fill(None);
        state.failure_counter[machine] = None;
        debug!(machine, "machine recovered");
    }
}

pub fn trigger_failures<R: Rng + ?Sized>(
    state: &mut FactoryState,
    failure: &FailureConfig,
    rng: &mut R,
) {
    for machine in 0..state.machine_count() {
        // One draw per machine per tick keeps seeded runs reproducible.
        let draw: f64 = rng.gen();
        if draw >= failure.probability {
            continue;
        }
        if state.occupancy[machine].is_some() || state.is_failed(machine) {
            continue;
        }

        let downtime = rng.gen_range(failure.min_downtime..=failure.max_downtime);
        fail_machine(state, machine, downtime);
        debug!(machine, downtime, "machine failed");
    }
}

/// Takes a machine offline for `downtime` ticks, parking its capabilities.
pub fn fail_machine(state: &mut FactoryState, machine: usize, downtime: u32) {
    state.failure_counter[machine] = Some(downtime);
    let skills: Vec<Option<u32>> = state.working_time.row(machine).to_vec();
    state.failure_info.row_mut(machine).copy_from_slice(&skills);
    state.working_time.row_mut(machine).fill(None);
}

/// 6. Products told to inject enter the machine they are waiting at, if it
/// is free and currently able to perform their next step.
pub fn inject(state: &mut FactoryState, actions: &[Action]) {
    for (product, action) in actions.iter().enumerate() {
        if *action != Action::Inject {
            continue;
        }
        let Some(machine) = state.product_bucket[product] else {
            continue;
        };
        let Some(step) = state.next_required_step(product) else {
            continue;
        };
        if state.occupancy[machine].is_some() {
            continue;
        }
        let Some(ticks) = state.working_time[(machine, step)] else {
            continue;
        };

        state.occupancy[machine] = Some(Occupancy {
            product,
            remaining: Some(ticks),
            step,
        });
        state.product_bucket[product] = None;
    }
}

/// 7. Sparse terminal reward.
///
/// Finishing everything pays the cube of the unused budget plus the cube of
/// the steps finished since the baseline; running out of time pays only the
/// latter. Every other tick pays nothing.
pub fn reward(
    state: &FactoryState,
    step: u32,
    max_timesteps: u32,
    finished_baseline: usize,
) -> f64 {
    // f64 throughout: the cubes leave i64 range for budgets above ~2M ticks.
    let finished = state.finished_steps() as f64 - finished_baseline as f64;

    if is_done(state) {
        let unused = f64::from(max_timesteps) - f64::from(step);
        unused.powi(3) + finished.powi(3)
    } else if step + 1 == max_timesteps {
        finished.powi(3)
    } else {
        0.0
    }
}

/// 8. The episode is over once no step is required anywhere.
pub fn is_done(state: &FactoryState) -> bool {
    state.is_complete()
}
