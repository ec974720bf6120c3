// src/model/action.rs

use crate::error::{FactoryError, Result};

/// Integer signal meaning "inject into the machine I am standing at".
pub const INJECT_SIGNAL: i64 = -1;

/// Routing decision for one product in one tick.
///
/// Decisions that make no sense for the product's current situation (moving a
/// product that is travelling, injecting into a busy machine, ...) are not
/// errors: the step pipeline simply ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Inject,
    MoveTo(usize),
}

/// What to do with an integer signal outside `[-1, machines)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionBounds {
    #[default]
    Reject,
    Clamp,
}

impl Action {
    /// Converts a raw signal (`-1` = inject, `k` = machine `k`).
    pub fn from_signal(
        product: usize,
        signal: i64,
        machines: usize,
        bounds: ActionBounds,
    ) -> Result<Self> {
        let upper = machines as i64 - 1;
        let signal = if (INJECT_SIGNAL..=upper).contains(&signal) {
            signal
        } else {
            match bounds {
                ActionBounds::Reject => {
                    return Err(FactoryError::InvalidAction {
                        product,
                        signal,
                        machines,
                    })
                }
                ActionBounds::Clamp => signal.clamp(INJECT_SIGNAL, upper.max(INJECT_SIGNAL)),
            }
        };

        if signal == INJECT_SIGNAL {
            Ok(Action::Inject)
        } else {
            Ok(Action::MoveTo(signal as usize))
        }
    }
}

/// Converts a whole vector of signals, one per product.
pub fn actions_from_signals(
    signals: &[i64],
    machines: usize,
    bounds: ActionBounds,
) -> Result<Vec<Action>> {
    signals
        .iter()
        .enumerate()
        .map(|(product, &signal)| Action::from_signal(product, signal, machines, bounds))
        .collect()
}
