//! Cell-based manufacturing line simulation exposed as a reinforcement
//! learning environment.
//!
//! Products travel between machines, get processed one step at a time and
//! machines occasionally break down. A routing policy decides every tick
//! whether each product should be injected into the machine it waits at or
//! sent to another machine.

pub mod error;
pub mod io;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{FactoryError, Result};
