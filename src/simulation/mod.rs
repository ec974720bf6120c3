pub mod codec;
pub mod config;
pub mod engine;
pub mod env;
pub mod pipeline;
