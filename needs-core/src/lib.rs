//! Housing-needs projection engine for intercommunal territories (EPCIs).
//!
//! Estimates the number of housing units a territory needs over a projection
//! horizon, split into a flow component (demographic growth, stock turnover,
//! vacancy and secondary-residence dynamics) and a stock component (the five
//! pre-existing inadequate-housing situations). Deterministic, multi-year,
//! driven by a user-chosen [`Scenario`] and read-only reference datasets
//! supplied through the traits in [`data`].
//!
//! [`NeedsCalculationOrchestrator::calculate`] is the entry point external
//! callers should use.

pub mod coefficients;
pub mod data;
pub mod demography;
pub mod error;
pub mod flow;
pub mod orchestrator;
pub mod ratios;
pub mod scenario;
pub mod stock_needs;
pub mod turnover;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use coefficients::*;
pub use data::*;
pub use demography::*;
pub use error::*;
pub use flow::*;
pub use orchestrator::*;
pub use ratios::*;
pub use scenario::*;
pub use stock_needs::*;
pub use turnover::*;
pub use types::*;
