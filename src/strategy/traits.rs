// src/strategy/traits.rs

use crate::error::Result;
use crate::model::action::Action;
use crate::model::factory::FactoryState;
use std::fmt::Debug;

/// Everything a policy may look at when routing products.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub state: &'a FactoryState,
    /// Normalized observation of `state`, as produced by the state encoder.
    pub observation: &'a [f32],
    pub timestep: u32,
}

/// Decides one action per product each tick.
///
/// We require `Debug` so the runner can log which policy it is driving, and
/// `Send` so episodes can be moved to worker threads.
pub trait RoutingPolicy: Debug + Send {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Vec<Action>>;

    /// Short label used in reports.
    fn name(&self) -> &'static str;
}

/// A continuous-control agent (e.g. a TD3 actor network).
///
/// Given an observation it returns a raw score vector of width
/// `products * (machines + 1)`, decoded by the action codec.
pub trait ContinuousActor: Debug + Send {
    fn select_action(&mut self, observation: &[f32]) -> Vec<f32>;
}
