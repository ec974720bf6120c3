// src/simulation/engine.rs

use crate::error::Result;
use crate::simulation::env::FactoryEnv;
use crate::strategy::traits::{DecisionContext, RoutingPolicy};
use serde::Serialize;
use tracing::info;

// We make this Serialize so we can write it to CSV later
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub episode: usize,
    pub timestep: u32,
    pub reward: f64,
    pub remaining_steps: usize,
    pub finished_steps: usize,
    pub in_transit: usize,
    pub in_machines: usize,
    pub failed_machines: usize,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub policy: String,
    pub total_reward: f64,
    pub timesteps: u32,
    pub finished_baseline: usize,
    pub finished_steps: usize,
    pub completed: bool,
}

/// Runs episodes of a factory line under one routing policy.
pub struct LineSimulation {
    env: FactoryEnv,
    policy: Box<dyn RoutingPolicy>,
    episodes_run: usize,
    pub history: Vec<HistoryRecord>,
    pub summaries: Vec<EpisodeSummary>,
}

impl LineSimulation {
    pub fn new(env: FactoryEnv, policy: Box<dyn RoutingPolicy>) -> Self {
        Self {
            env,
            policy,
            episodes_run: 0,
            history: Vec::new(),
            summaries: Vec::new(),
        }
    }

    pub fn run(&mut self, episodes: usize) -> Result<()> {
        for _ in 0..episodes {
            self.run_episode()?;
        }
        Ok(())
    }

    /// Resets the factory and drives it until it is finished or out of time.
    pub fn run_episode(&mut self) -> Result<EpisodeSummary> {
        let episode = self.episodes_run;
        let mut observation = self.env.reset()?;
        let mut total_reward = 0.0;

        while !self.env.is_terminal() {
            let actions = self.policy.decide(&DecisionContext {
                state: self.env.state(),
                observation: &observation,
                timestep: self.env.timestep(),
            })?;
            let transition = self.env.step_actions(&actions)?;
            total_reward += transition.reward;
            self.record_history(episode, transition.timestep, transition.reward);
            observation = transition.observation;
        }

        let state = self.env.state();
        let summary = EpisodeSummary {
            episode,
            policy: self.policy.name().to_string(),
            total_reward,
            timesteps: self.env.timestep(),
            finished_baseline: self.env.finished_baseline(),
            finished_steps: state.finished_steps(),
            completed: self.env.is_done(),
        };
        info!(
            episode,
            reward = summary.total_reward,
            timesteps = summary.timesteps,
            finished = summary.finished_steps,
            completed = summary.completed,
            "episode finished"
        );

        self.episodes_run += 1;
        self.summaries.push(summary.clone());
        Ok(summary)
    }

    fn record_history(&mut self, episode: usize, timestep: u32, reward: f64) {
        let state = self.env.state();
        self.history.push(HistoryRecord {
            episode,
            timestep,
            reward,
            remaining_steps: state.remaining_steps(),
            finished_steps: state.finished_steps(),
            in_transit: state.products_in_transit(),
            in_machines: state.products_in_machines(),
            failed_machines: state.failed_machines(),
            done: self.env.is_done(),
        });
    }

    /// Mean total reward over all episodes run so far.
    pub fn average_reward(&self) -> f64 {
        if self.summaries.is_empty() {
            return 0.0;
        }
        self.summaries.iter().map(|s| s.total_reward).sum::<f64>() / self.summaries.len() as f64
    }

    /// Share of episodes in which every product was finished.
    pub fn completion_rate(&self) -> f64 {
        if self.summaries.is_empty() {
            return 0.0;
        }
        let completed = self.summaries.iter().filter(|s| s.completed).count();
        completed as f64 / self.summaries.len() as f64
    }
}
