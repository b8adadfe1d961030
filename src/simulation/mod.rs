//! Scenario analysis built on the comparison engine.

pub mod fx_shock;
pub mod sweep;
pub mod what_if;
