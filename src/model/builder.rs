// src/model/builder.rs

use crate::error::Result;
use crate::model::factory::FactoryState;
use crate::model::layouts::{
    line_travel_times, to_rows, REFERENCE7_WORKING_TIME, REFERENCE_WORKING_TIME,
};
use crate::model::matrix::Matrix;
use crate::simulation::config::{FactoryConfig, LineLayout};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Produces a fresh `FactoryState` for every episode.
#[derive(Debug, Clone)]
pub struct FactoryBuilder {
    config: FactoryConfig,
}

impl FactoryBuilder {
    pub fn new(config: FactoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Builds a factory with every step required and products scattered
    /// uniformly over the machines.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<FactoryState> {
        let (working_time, travel_time) = match self.config.layout {
            LineLayout::Reference => (
                to_rows(&REFERENCE_WORKING_TIME),
                line_travel_times(REFERENCE_WORKING_TIME.len()),
            ),
            LineLayout::Reference7 => (
                to_rows(&REFERENCE7_WORKING_TIME),
                line_travel_times(REFERENCE7_WORKING_TIME.len()),
            ),
            LineLayout::Random => (
                self.random_working_time(rng),
                self.random_travel_time(rng),
            ),
        };

        let machines = working_time.len();
        let products = self.config.products;
        let product_design = vec![vec![true; machines]; products];
        let product_bucket = (0..products)
            .map(|_| Some(rng.gen_range(0..machines)))
            .collect();

        debug!(machines, products, layout = ?self.config.layout, "building factory");

        FactoryState::from_matrices(
            Matrix::from_rows("working time", working_time)?,
            Matrix::from_rows("product design", product_design)?,
            Matrix::from_rows("travel time", travel_time)?,
            product_bucket,
        )
    }

    fn random_working_time<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vec<Option<u32>>> {
        let cfg = &self.config;
        let n = cfg.machines;
        let mut wt = vec![vec![None; n]; n];
        let own: Vec<u32> = (0..n)
            .map(|_| rng.gen_range(cfg.min_working_time..=cfg.max_working_time))
            .collect();
        for (m, &ticks) in own.iter().enumerate() {
            wt[m][m] = Some(ticks);
        }

        let learners = inner_range(n, cfg.first_and_last_cross_trained);
        let skills = inner_range(n, cfg.first_and_last_replaceable);
        if learners.is_empty() || skills.is_empty() {
            return wt;
        }

        // Both picks are with replacement, so fewer distinct cells/skills may result.
        let chosen_machines: Vec<usize> = (0..cfg.extra_skill_machines)
            .filter_map(|_| learners.choose(rng).copied())
            .collect();
        let chosen_skills: Vec<usize> = (0..cfg.extra_skills)
            .filter_map(|_| skills.choose(rng).copied())
            .collect();

        let (low, high) = cfg.transfer_penalty;
        for &machine in &chosen_machines {
            for &skill in &chosen_skills {
                if skill != machine {
                    wt[machine][skill] = Some(own[skill] + rng.gen_range(low..=high));
                }
            }
        }
        wt
    }

    fn random_travel_time<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vec<Option<u32>>> {
        let cfg = &self.config;
        let n = cfg.machines;
        (0..n)
            .map(|from| {
                (0..n)
                    .map(|to| {
                        (to != from)
                            .then(|| rng.gen_range(cfg.min_travel_time..=cfg.max_travel_time))
                    })
                    .collect()
            })
            .collect()
    }
}

/// `0..n`, or `1..n-1` when the ends of the line are excluded.
fn inner_range(n: usize, include_ends: bool) -> Vec<usize> {
    if include_ends {
        (0..n).collect()
    } else {
        (1..n.saturating_sub(1)).collect()
    }
}
