//! Rate annualization, re-compounding, and horizon proration.
//!
//! Observed reference rates are multi-year compounds; scenario inputs are
//! annual percentages. Every conversion between the two runs through here so
//! that the rounding points stay identical across callers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{RegionCode, round10};

/// Base coefficient applied when a region has no entry of its own.
pub const DEFAULT_BASE_COEFFICIENT: f64 = 6.0;

/// Region-specific divisors used to annualize multi-year observed rates.
/// Metropolitan regions share the standard observation window; overseas
/// regions were observed over a shorter one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCoefficients {
    coefficients: HashMap<RegionCode, f64>,
    default: f64,
}

impl Default for RegionCoefficients {
    fn default() -> Self {
        let coefficients = [
            ("11", 6.0),
            ("24", 6.0),
            ("27", 6.0),
            ("28", 6.0),
            ("32", 6.0),
            ("44", 6.0),
            ("52", 6.0),
            ("53", 6.0),
            ("75", 6.0),
            ("76", 6.0),
            ("84", 6.0),
            ("93", 6.0),
            ("94", 6.0),
            ("01", 5.0),
            ("02", 5.0),
            ("03", 5.0),
            ("04", 5.0),
        ]
        .into_iter()
        .map(|(code, coeff)| (RegionCode::new(code), coeff))
        .collect();

        Self {
            coefficients,
            default: DEFAULT_BASE_COEFFICIENT,
        }
    }
}

impl RegionCoefficients {
    pub fn new(coefficients: HashMap<RegionCode, f64>, default: f64) -> Self {
        Self {
            coefficients,
            default,
        }
    }

    /// Base coefficient for a region; unknown regions fall back silently to
    /// the default.
    pub fn base_coefficient(&self, region: &RegionCode) -> f64 {
        self.coefficients.get(region).copied().unwrap_or(self.default)
    }

    /// Convert a compounded observed rate into an annual-equivalent rate and
    /// add the scenario's additional rate.
    ///
    /// The additional rate arrives as a percentage and is added arithmetically
    /// — no re-compounding. Intermediates are rounded to 10 decimal digits so
    /// callers sharing the value cannot drift apart.
    pub fn compound_annual_rate(
        &self,
        current_rate: f64,
        additional_rate_pct: f64,
        region: &RegionCode,
    ) -> f64 {
        let base = self.base_coefficient(region);
        let annual = round10((1.0 + current_rate).powf(1.0 / base) - 1.0);
        round10(annual + additional_rate_pct / 100.0)
    }
}

/// Re-compound an annual rate over a period of years.
pub fn project_rate(annual_rate: f64, period_years: i32) -> f64 {
    (1.0 + annual_rate).powi(period_years) - 1.0
}

/// Linear time-proration factor scaling a one-shot stock need down to the
/// portion attributable to the current projection window. Clamped at 1 when
/// the window covers the whole horizon.
pub fn horizon_proration_factor(
    resorption_horizon_years: i32,
    period_years: i32,
) -> Result<f64, EngineError> {
    if resorption_horizon_years <= 0 {
        return Err(EngineError::InvalidHorizon {
            horizon: resorption_horizon_years,
        });
    }
    Ok(if period_years < resorption_horizon_years {
        period_years as f64 / resorption_horizon_years as f64
    } else {
        1.0
    })
}
