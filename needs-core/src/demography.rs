//! Demographic projections and the anchored delta series.

use serde::{Deserialize, Serialize};

use crate::data::DemographicSource;
use crate::error::EngineError;
use crate::scenario::DemographicVariant;
use crate::types::{TerritoryId, Year, YearlySeries};

/// Year-over-year change in household count for one territory and one
/// variant, anchored so the first emitted year differences against the last
/// pre-projection observed value. Produced by a fold; min/max are part of
/// the record, not running accumulators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicDelta {
    pub series: YearlySeries,
    pub min: f64,
    pub max: f64,
}

impl DemographicDelta {
    pub fn first_year(&self) -> Option<Year> {
        self.series.first_year()
    }

    pub fn last_year(&self) -> Option<Year> {
        self.series.last_year()
    }
}

/// Point and series lookups over the reference demographic dataset. The
/// table must be fully populated; a missing row is a `NotFound`-class error,
/// never an extrapolation.
pub struct DemographicProjector<'a, D: DemographicSource + ?Sized> {
    source: &'a D,
}

impl<'a, D: DemographicSource + ?Sized> DemographicProjector<'a, D> {
    pub fn new(source: &'a D) -> Self {
        Self { source }
    }

    pub fn projection(
        &self,
        territory: &TerritoryId,
        variant: DemographicVariant,
        year: Year,
    ) -> Result<f64, EngineError> {
        self.source
            .projection(territory, variant, year)
            .ok_or(EngineError::MissingProjection {
                territory: territory.clone(),
                year,
            })
    }

    pub fn projection_series(
        &self,
        territory: &TerritoryId,
        variant: DemographicVariant,
        max_year: Year,
    ) -> Vec<(Year, f64)> {
        self.source.projection_series(territory, variant, max_year)
    }

    /// First-difference series over every projected year strictly after
    /// `anchor_year`. The anchor's own value is only the starting point of
    /// the differencing, it is not emitted. A gap in the projection table is
    /// reported as the first missing year.
    pub fn delta(
        &self,
        territory: &TerritoryId,
        variant: DemographicVariant,
        anchor_year: Year,
        max_year: Year,
    ) -> Result<DemographicDelta, EngineError> {
        let anchor_value = self.projection(territory, variant, anchor_year)?;

        let projected: Vec<(Year, f64)> = self
            .projection_series(territory, variant, max_year)
            .into_iter()
            .filter(|&(year, _)| year > anchor_year)
            .collect();

        if projected.is_empty() {
            return Err(EngineError::MissingProjection {
                territory: territory.clone(),
                year: anchor_year + 1,
            });
        }

        let folded = projected.into_iter().try_fold(
            (anchor_year, anchor_value, YearlySeries::new(), f64::INFINITY, f64::NEG_INFINITY),
            |(prev_year, prev_value, mut series, min, max), (year, value)| {
                if year != prev_year + 1 {
                    return Err(EngineError::MissingProjection {
                        territory: territory.clone(),
                        year: prev_year + 1,
                    });
                }
                let delta = value - prev_value;
                series.insert(year, delta);
                Ok((year, value, series, min.min(delta), max.max(delta)))
            },
        )?;

        let (_, _, series, min, max) = folded;
        Ok(DemographicDelta { series, min, max })
    }
}
