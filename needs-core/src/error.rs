use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{TerritoryId, Year};

/// Failure kinds of the projection engine.
///
/// Expected-sparse reference rows (the five inadequacy tables) are *not*
/// errors: those calculators recover absence as zero. Everything here aborts
/// the current territory's computation; other territories in the same batch
/// still complete.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum EngineError {
    #[error("no demographic projection for territory {territory} in {year}")]
    MissingProjection { territory: TerritoryId, year: Year },

    #[error("no stock snapshot for territory {territory}")]
    MissingSnapshot { territory: TerritoryId },

    #[error("missing {kind} rate for territory {territory} in {year}")]
    MissingRate {
        territory: TerritoryId,
        year: Year,
        kind: String,
    },

    #[error("degenerate residual occupancy rate {rate} for territory {territory}")]
    DegenerateOccupancyRate { territory: TerritoryId, rate: f64 },

    #[error("invalid resorption horizon: {horizon} years")]
    InvalidHorizon { horizon: i32 },

    #[error("unknown ratio name: {0}")]
    UnknownRatio(String),
}

/// A territory whose computation aborted, reported distinctly from a
/// territory with a zero result.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("territory {territory}: {error}")]
pub struct TerritoryFailure {
    pub territory: TerritoryId,
    pub error: EngineError,
}
