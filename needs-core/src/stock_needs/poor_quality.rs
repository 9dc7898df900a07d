//! Poor-quality dwellings: occupied units lacking basic comfort, optionally
//! widened to units in poor physical condition.

use crate::data::InadequacySource;
use crate::scenario::{PoorQualityConfig, QualityFilter, Territory};
use crate::stock_needs::{CategoryResults, TerritoryNeed, apply_reallocation};
use crate::types::TerritoryId;

pub struct PoorQualityCalculator<'a, S: InadequacySource + ?Sized> {
    source: &'a S,
    config: &'a PoorQualityConfig,
}

impl<'a, S: InadequacySource + ?Sized> PoorQualityCalculator<'a, S> {
    pub fn new(source: &'a S, config: &'a PoorQualityConfig) -> Self {
        Self { source, config }
    }

    pub fn raw(&self, territory: &TerritoryId) -> f64 {
        match self.source.poor_quality_row(territory) {
            Some(row) => match self.config.filter {
                QualityFilter::WithoutComfort => row.without_comfort,
                QualityFilter::WithoutComfortOrPoorCondition => {
                    row.without_comfort + row.poor_condition
                }
            },
            None => 0.0,
        }
    }

    pub fn compute_by_territory(&self, territory: &TerritoryId) -> f64 {
        apply_reallocation(self.raw(territory), self.config.reallocation_pct)
    }

    /// Batch view over several territories.
    pub fn compute(&self, territories: &[Territory]) -> CategoryResults {
        CategoryResults::from_values(
            territories
                .iter()
                .map(|territory| TerritoryNeed {
                    territory: territory.id.clone(),
                    value: self.compute_by_territory(&territory.id),
                })
                .collect(),
        )
    }
}
