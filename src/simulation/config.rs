// src/simulation/config.rs

use crate::error::{FactoryError, Result};
use crate::model::action::ActionBounds;

/// Which factory the builder produces at every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineLayout {
    /// Fixed five-cell line: each cell owns one step and can help its neighbours slowly.
    #[default]
    Reference,
    /// Fixed seven-cell variant of the reference line.
    Reference7,
    /// Randomized diagonal line with optional cross-trained cells.
    Random,
}

#[derive(Debug, Clone)]
pub struct FactoryConfig {
    pub layout: LineLayout,
    pub products: usize,
    /// Only used by `LineLayout::Random`; the reference layouts fix their own size.
    pub machines: usize,
    pub min_working_time: u32,
    pub max_working_time: u32,
    pub min_travel_time: u32,
    pub max_travel_time: u32,
    /// How many (possibly repeated) cells receive extra skills.
    pub extra_skill_machines: usize,
    /// How many (possibly repeated) extra skills each of those cells receives.
    pub extra_skills: usize,
    /// Whether the first and last step may be taught to other cells.
    pub first_and_last_replaceable: bool,
    /// Whether the first and last cell may learn extra steps.
    pub first_and_last_cross_trained: bool,
    /// Inclusive range added to the owner's time for a cross-trained step.
    pub transfer_penalty: (u32, u32),
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            layout: LineLayout::Reference,
            products: 5,
            machines: 5,
            min_working_time: 2,
            max_working_time: 3,
            min_travel_time: 2,
            max_travel_time: 3,
            extra_skill_machines: 0,
            extra_skills: 0,
            first_and_last_replaceable: true,
            first_and_last_cross_trained: true,
            transfer_penalty: (5, 10),
        }
    }
}

impl FactoryConfig {
    pub fn machine_count(&self) -> usize {
        match self.layout {
            LineLayout::Reference => 5,
            LineLayout::Reference7 => 7,
            LineLayout::Random => self.machines,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.products == 0 {
            return invalid("a factory needs at least one product");
        }
        if self.layout == LineLayout::Random {
            if self.machines == 0 {
                return invalid("a random line needs at least one machine");
            }
            if self.min_working_time == 0 || self.min_working_time > self.max_working_time {
                return invalid("working time range must be positive and ordered");
            }
            if self.min_travel_time == 0 || self.min_travel_time > self.max_travel_time {
                return invalid("travel time range must be positive and ordered");
            }
            if self.transfer_penalty.0 > self.transfer_penalty.1 {
                return invalid("transfer penalty range must be ordered");
            }
            if self.extra_skill_machines > self.machines || self.extra_skills > self.machines {
                return invalid("extra skills cannot exceed the machine count");
            }
        }
        Ok(())
    }
}

/// Stochastic machine breakdowns.
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// Chance per machine per tick that an idle, working machine breaks down.
    pub probability: f64,
    pub min_downtime: u32,
    pub max_downtime: u32,
}

impl Default for FailureConfig {
    fn default() -> Self {
        Self {
            probability: 0.025,
            min_downtime: 40,
            max_downtime: 70,
        }
    }
}

impl FailureConfig {
    /// Breakdowns switched off; useful for deterministic runs.
    pub fn disabled() -> Self {
        Self {
            probability: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return invalid("failure probability must be within [0, 1]");
        }
        if self.min_downtime == 0 || self.min_downtime > self.max_downtime {
            return invalid("downtime range must be positive and ordered");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Timestep budget of one episode.
    pub max_timesteps: u32,
    /// Random ticks played before the controlling policy takes over.
    pub warmup_steps: u32,
    /// Seed for construction and failure draws. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub factory: FactoryConfig,
    pub failure: FailureConfig,
    pub action_bounds: ActionBounds,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_timesteps: 70,
            warmup_steps: 10,
            seed: None,
            factory: FactoryConfig::default(),
            failure: FailureConfig::default(),
            action_bounds: ActionBounds::Reject,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_timesteps == 0 {
            return invalid("max_timesteps must be at least 1");
        }
        self.factory.validate()?;
        self.failure.validate()
    }
}

fn invalid(reason: &str) -> Result<()> {
    Err(FactoryError::InvalidConfig(reason.to_string()))
}
