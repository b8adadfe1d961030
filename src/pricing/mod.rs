//! Provider cost models, the cost calculator and the comparison engine.

pub mod calculator;
pub mod comparison;
pub mod model;
pub mod registry;
