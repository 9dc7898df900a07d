//! Unsheltered situations: people without any housing of their own
//! (street homelessness, makeshift housing, long-stay hotel rooms), read
//! from the scenario-selected source dataset.

use crate::data::InadequacySource;
use crate::scenario::{Territory, UnshelteredConfig};
use crate::stock_needs::{CategoryResults, TerritoryNeed, apply_reallocation};
use crate::types::TerritoryId;

pub struct UnshelteredCalculator<'a, S: InadequacySource + ?Sized> {
    source: &'a S,
    config: &'a UnshelteredConfig,
}

impl<'a, S: InadequacySource + ?Sized> UnshelteredCalculator<'a, S> {
    pub fn new(source: &'a S, config: &'a UnshelteredConfig) -> Self {
        Self { source, config }
    }

    /// Selected counts before reallocation. A sparse row counts as zero.
    pub fn raw(&self, territory: &TerritoryId) -> f64 {
        self.source
            .unsheltered_row(territory, self.config.source)
            .map(|row| row.total())
            .unwrap_or(0.0)
    }

    /// Post-reallocation value, before the horizon coefficient.
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
