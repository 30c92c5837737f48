//! Command-line workflow, independent of argument parsing

pub mod orchestration;

pub use orchestration::{calculate_variables, effective_config, run, CalculationReport, RunArgs};
