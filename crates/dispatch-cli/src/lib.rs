//! Dispatch CLI - loaders, generators and reports around `dispatch-core`.
//!
//! Binaries:
//! - plan_fleet: plan one scenario with either or both strategies
//! - benchmark: time both strategies over generated scenarios

pub mod config;
pub mod generator;
pub mod report;
pub mod scenario;

pub use config::Config;
pub use generator::ScenarioGenerator;
pub use report::{BenchmarkReport, BenchmarkRow, PlanReport};
pub use scenario::{default_scenario, load_scenario, save_scenario};
