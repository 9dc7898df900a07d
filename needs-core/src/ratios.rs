//! Cross-category reallocation ratios.
//!
//! Inadequate-housing situations overlap: a household can be both
//! financially over-stretched and in a poor-quality dwelling. The four
//! ratios here are the fixed shares of one category already counted inside
//! another; the downstream calculators multiply them against upstream
//! results to avoid double-counting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::RegionCode;

/// Effort-rate split point, in percent. Fixed policy, not configurable.
pub const EFFORT_RATE_SPLIT: f64 = 35.0;

/// A ratio that depends on which side of the 35% effort-rate threshold the
/// scenario sits on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatio {
    pub below35: f64,
    pub above35: f64,
}

impl SplitRatio {
    pub fn at(&self, effort_rate_pct: f64) -> f64 {
        if effort_rate_pct < EFFORT_RATE_SPLIT {
            self.below35
        } else {
            self.above35
        }
    }
}

/// The four cross-deduction ratios for one region.
///
/// - `ratio41`: share of overcrowded households already counted as poor quality
/// - `ratio42`: share of overcrowded households already counted as hosted
/// - `ratio43`: share of over-effort households already counted as poor quality
/// - `ratio44`: share of over-effort households already counted as hosted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionRatios {
    pub ratio41: f64,
    pub ratio42: f64,
    pub ratio43: SplitRatio,
    pub ratio44: SplitRatio,
}

/// Region-keyed ratio table with a default entry for regions without their
/// own calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioTable {
    regions: HashMap<RegionCode, RegionRatios>,
    default: RegionRatios,
}

impl Default for RatioTable {
    fn default() -> Self {
        let default = RegionRatios {
            ratio41: 0.17,
            ratio42: 0.06,
            ratio43: SplitRatio {
                below35: 0.22,
                above35: 0.34,
            },
            ratio44: SplitRatio {
                below35: 0.04,
                above35: 0.09,
            },
        };

        let mut regions = HashMap::new();
        // Île-de-France overlaps more: dense stock concentrates overcrowding
        // and price pressure in the same dwellings.
        regions.insert(
            RegionCode::new("11"),
            RegionRatios {
                ratio41: 0.24,
                ratio42: 0.08,
                ratio43: SplitRatio {
                    below35: 0.29,
                    above35: 0.41,
                },
                ratio44: SplitRatio {
                    below35: 0.06,
                    above35: 0.12,
                },
            },
        );
        regions.insert(
            RegionCode::new("93"),
            RegionRatios {
                ratio41: 0.20,
                ratio42: 0.07,
                ratio43: SplitRatio {
                    below35: 0.25,
                    above35: 0.37,
                },
                ratio44: SplitRatio {
                    below35: 0.05,
                    above35: 0.10,
                },
            },
        );

        Self { regions, default }
    }
}

impl RatioTable {
    pub fn new(regions: HashMap<RegionCode, RegionRatios>, default: RegionRatios) -> Self {
        Self { regions, default }
    }

    /// Ratios for a region; unknown regions fall back silently to the
    /// default entry.
    pub fn for_region(&self, region: &RegionCode) -> &RegionRatios {
        self.regions.get(region).unwrap_or(&self.default)
    }

    /// Name-keyed lookup. An unrecognized name is a programming defect, not
    /// data sparsity, and fails loudly.
    pub fn lookup(
        &self,
        name: &str,
        region: &RegionCode,
        effort_rate_pct: Option<f64>,
    ) -> Result<f64, EngineError> {
        let ratios = self.for_region(region);
        let effort = effort_rate_pct.unwrap_or(0.0);
        match name {
            "ratio41" => Ok(ratios.ratio41),
            "ratio42" => Ok(ratios.ratio42),
            "ratio43" => Ok(ratios.ratio43.at(effort)),
            "ratio44" => Ok(ratios.ratio44.at(effort)),
            other => Err(EngineError::UnknownRatio(other.to_string())),
        }
    }
}
