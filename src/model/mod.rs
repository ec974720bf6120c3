pub mod action;
pub mod builder;
pub mod factory;
pub mod layouts;
pub mod matrix;
