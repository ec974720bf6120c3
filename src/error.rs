// src/error.rs

use thiserror::Error;

/// Everything that can go wrong while building or driving a factory.
///
/// Stepping a well-formed factory with in-range actions never fails; the
/// variants below cover malformed input and misuse of the environment.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("product {product} has no starting machine")]
    UnplacedProduct { product: usize },

    #[error("no usable travel time from machine {from} to machine {to}")]
    MissingTravelTime { from: usize, to: usize },

    #[error("action signal {signal} for product {product} is outside [-1, {machines})")]
    InvalidAction {
        product: usize,
        signal: i64,
        machines: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("episode already finished at timestep {timestep}")]
    EpisodeFinished { timestep: u32 },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FactoryError>;
