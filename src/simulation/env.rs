// src/simulation/env.rs

use crate::error::{FactoryError, Result};
use crate::model::action::{actions_from_signals, Action};
use crate::model::builder::FactoryBuilder;
use crate::model::factory::FactoryState;
use crate::simulation::codec::{action_dim, decode_actions, encode_state, observation_dim};
use crate::simulation::config::SimulationConfig;
use crate::simulation::pipeline::factory_step;
use crate::strategy::implementations::random_actions;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// What the learning side receives after every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub observation: Vec<f32>,
    pub reward: f64,
    pub done: bool,
    /// Timestep the action was applied at.
    pub timestep: u32,
}

/// Episodic wrapper around the factory: build, warm up, step until done or
/// out of time.
#[derive(Debug)]
pub struct FactoryEnv {
    config: SimulationConfig,
    builder: FactoryBuilder,
    rng: StdRng,
    state: FactoryState,
    timestep: u32,
    finished_baseline: usize,
    done: bool,
}

impl FactoryEnv {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let builder = FactoryBuilder::new(config.factory.clone())?;
        let mut rng = seeded_rng(config.seed);
        let state = builder.build(&mut rng)?;

        Ok(Self {
            config,
            builder,
            rng,
            state,
            timestep: 0,
            finished_baseline: 0,
            done: false,
        })
    }

    /// Starts an episode from a caller-supplied factory, without warm-up.
    ///
    /// The RNG stream starts untouched, so a seeded env drives failures
    /// exactly like `StdRng::seed_from_u64(seed)` would.
    pub fn with_state(config: SimulationConfig, state: FactoryState) -> Result<Self> {
        config.validate()?;
        let builder = FactoryBuilder::new(config.factory.clone())?;
        let rng = seeded_rng(config.seed);

        Ok(Self {
            config,
            builder,
            rng,
            timestep: 0,
            finished_baseline: state.finished_steps(),
            done: state.is_complete(),
            state,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &FactoryState {
        &self.state
    }

    pub fn timestep(&self) -> u32 {
        self.timestep
    }

    pub fn finished_baseline(&self) -> usize {
        self.finished_baseline
    }

    pub fn observation_dim(&self) -> usize {
        observation_dim(self.state.product_count(), self.state.machine_count())
    }

    pub fn action_dim(&self) -> usize {
        action_dim(self.state.product_count(), self.state.machine_count())
    }

    pub fn observation(&self) -> Vec<f32> {
        encode_state(&self.state)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_terminal(&self) -> bool {
        self.done || self.timestep >= self.config.max_timesteps
    }

    /// Builds a fresh factory, plays the random warm-up and returns the first
    /// observation the controlling policy sees.
    ///
    /// Warm-up ticks are all evaluated as timestep 0 and their progress is
    /// recorded as the baseline, so it is never credited to the policy.
    pub fn reset(&mut self) -> Result<Vec<f32>> {
        self.state = self.builder.build(&mut self.rng)?;
        self.timestep = 0;
        self.finished_baseline = 0;
        self.done = false;

        for _ in 0..self.config.warmup_steps {
            let actions = random_actions(&self.state, &mut self.rng)?;
            let outcome = factory_step(
                &mut self.state,
                &actions,
                0,
                self.config.max_timesteps,
                0,
                &self.config.failure,
                &mut self.rng,
            )?;
            self.done = outcome.done;
        }

        self.finished_baseline = self.state.finished_steps();
        debug!(
            baseline = self.finished_baseline,
            done = self.done,
            "episode reset"
        );
        Ok(self.observation())
    }

    pub fn step_actions(&mut self, actions: &[Action]) -> Result<Transition> {
        if self.is_terminal() {
            return Err(FactoryError::EpisodeFinished {
                timestep: self.timestep,
            });
        }

        let timestep = self.timestep;
        let outcome = factory_step(
            &mut self.state,
            actions,
            timestep,
            self.config.max_timesteps,
            self.finished_baseline,
            &self.config.failure,
            &mut self.rng,
        )?;
        self.timestep += 1;
        self.done = outcome.done;

        Ok(Transition {
            observation: self.observation(),
            reward: outcome.reward,
            done: outcome.done,
            timestep,
        })
    }

    /// Steps with integer signals (`-1` inject, `k` machine), bounded per config.
    pub fn step_signals(&mut self, signals: &[i64]) -> Result<Transition> {
        let actions = actions_from_signals(
            signals,
            self.state.machine_count(),
            self.config.action_bounds,
        )?;
        self.step_actions(&actions)
    }

    /// Steps with a raw policy output of width [`Self::action_dim`].
    pub fn step(&mut self, raw: &[f32]) -> Result<Transition> {
        let actions = decode_actions(
            raw,
            self.state.product_count(),
            self.state.machine_count(),
        )?;
        self.step_actions(&actions)
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}
