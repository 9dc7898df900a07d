//! Physically inadequate situations: overcrowded households at the
//! scenario-selected severity, net of the overlaps already counted as poor
//! quality or hosted.

use crate::data::InadequacySource;
use crate::ratios::RatioTable;
use crate::scenario::{PhysicalConfig, Territory};
use crate::stock_needs::{CategoryResults, TerritoryNeed, apply_reallocation};

pub struct PhysicalCalculator<'a, S: InadequacySource + ?Sized> {
    source: &'a S,
    config: &'a PhysicalConfig,
    ratios: &'a RatioTable,
}

impl<'a, S: InadequacySource + ?Sized> PhysicalCalculator<'a, S> {
    pub fn new(source: &'a S, config: &'a PhysicalConfig, ratios: &'a RatioTable) -> Self {
        Self {
            source,
            config,
            ratios,
        }
    }

    pub fn raw(&self, territory: &Territory) -> f64 {
        self.source
            .overcrowding_count(&territory.id, self.config.level)
            .unwrap_or(0.0)
    }

    pub fn compute_by_territory(&self, territory: &Territory, poor_quality: f64, hosted: f64) -> f64 {
        let ratios = self.ratios.for_region(&territory.region);
        let deducted =
            self.raw(territory) - ratios.ratio41 * poor_quality - ratios.ratio42 * hosted;
        apply_reallocation(deducted.max(0.0), self.config.reallocation_pct)
    }

    /// Batch view: deducts against the upstream batch results per territory.
    pub fn compute(
        &self,
        territories: &[Territory],
        poor_quality: &CategoryResults,
        hosted: &CategoryResults,
    ) -> CategoryResults {
        CategoryResults::from_values(
            territories
                .iter()
                .map(|territory| TerritoryNeed {
                    territory: territory.id.clone(),
                    value: self.compute_by_territory(
                        territory,
                        poor_quality.value_for(&territory.id),
                        hosted.value_for(&territory.id),
                    ),
                })
                .collect(),
        )
    }
}
