// src/simulation/codec.rs

//! Translation between the factory and a continuous-control agent.

use crate::error::{FactoryError, Result};
use crate::model::action::Action;
use crate::model::factory::FactoryState;

/// Value every `None` cell is encoded as.
const ABSENT: f32 = -1.0;

/// Failure counters are scaled down so long downtimes do not dominate the max.
const FAILURE_SCALE: f32 = 5.0;

/// Width of the raw policy output: one block of `machines + 1` scores per product.
pub fn action_dim(products: usize, machines: usize) -> usize {
    products * (machines + 1)
}

/// Length of the vector produced by [`encode_state`].
pub fn observation_dim(products: usize, machines: usize) -> usize {
    // design + bucket + transit (target, remaining) + occupancy triple + failure counter
    products * machines + products + 2 * products + 3 * machines + machines
}

/// Decodes a raw policy output into one action per product.
///
/// Within each block the highest score wins; ties go to the lowest index. Index
/// 0 means inject, index `k` means move to machine `k - 1`. A NaN score is
/// never selected unless the whole block is NaN, which decodes to inject.
pub fn decode_actions(raw: &[f32], products: usize, machines: usize) -> Result<Vec<Action>> {
    let expected = action_dim(products, machines);
    if raw.len() != expected {
        return Err(FactoryError::DimensionMismatch {
            what: "raw action vector",
            expected,
            found: raw.len(),
        });
    }

    Ok(raw
        .chunks(machines + 1)
        .map(|block| match argmax(block) {
            0 => Action::Inject,
            k => Action::MoveTo(k - 1),
        })
        .collect())
}

/// Index of the largest non-NaN value, first one on ties. Unlike numpy a NaN
/// never wins; an all-NaN slice yields 0.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        // NaN compares false and so never replaces the current best.
        if v > values[best] || (values[best].is_nan() && !v.is_nan()) {
            best = i;
        }
    }
    best
}

/// Flattens the dynamic part of the factory into a vector in `[-1, 1]`.
///
/// Layout: product design (required = 1), product buckets, transit
/// (target, remaining) per product, occupancy (product, remaining, step) per
/// machine, failure counters divided by 5. Missing values become -1 and the
/// whole vector is mapped linearly from `[-1, max]` onto `[-1, 1]`.
pub fn encode_state(state: &FactoryState) -> Vec<f32> {
    let products = state.product_count();
    let machines = state.machine_count();
    let mut obs = Vec::with_capacity(observation_dim(products, machines));

    obs.extend(
        state
            .product_design
            .iter()
            .map(|&required| if required { 1.0 } else { ABSENT }),
    );
    obs.extend(state.product_bucket.iter().map(|&b| index_or_absent(b)));
    for transit in &state.transit {
        obs.push(index_or_absent(transit.map(|t| t.target)));
        obs.push(ticks_or_absent(transit.map(|t| t.remaining)));
    }
    for slot in &state.occupancy {
        obs.push(index_or_absent(slot.map(|o| o.product)));
        obs.push(ticks_or_absent(slot.and_then(|o| o.remaining)));
        obs.push(index_or_absent(slot.map(|o| o.step)));
    }
    obs.extend(
        state
            .failure_counter
            .iter()
            .map(|c| c.map_or(ABSENT, |ticks| ticks as f32 / FAILURE_SCALE)),
    );

    normalize(&mut obs);
    obs
}

fn index_or_absent(value: Option<usize>) -> f32 {
    value.map_or(ABSENT, |v| v as f32)
}

fn ticks_or_absent(value: Option<u32>) -> f32 {
    value.map_or(ABSENT, |v| v as f32)
}

/// Linear map from `[-1, max]` to `[-1, 1]`; values above stay clamped to 1.
fn normalize(obs: &mut [f32]) {
    let max = obs.iter().copied().fold(ABSENT, f32::max);
    let span = max - ABSENT;
    if span <= 0.0 {
        obs.fill(ABSENT);
        return;
    }
    for v in obs.iter_mut() {
        *v = ((*v - ABSENT) / span * 2.0 - 1.0).clamp(-1.0, 1.0);
    }
}
