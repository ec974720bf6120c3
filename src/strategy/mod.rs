pub mod exploration;
pub mod implementations;
pub mod traits;
