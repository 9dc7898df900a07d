//! Financially inadequate situations: households whose housing effort rate
//! exceeds the scenario threshold. Deducts the shares already counted as
//! poor quality or hosted before reallocation.

use crate::data::InadequacySource;
use crate::ratios::RatioTable;
use crate::scenario::{FinancialConfig, Territory};
use crate::stock_needs::{CategoryResults, TerritoryNeed, apply_reallocation};

pub struct FinancialCalculator<'a, S: InadequacySource + ?Sized> {
    source: &'a S,
    config: &'a FinancialConfig,
    ratios: &'a RatioTable,
}

impl<'a, S: InadequacySource + ?Sized> FinancialCalculator<'a, S> {
    pub fn new(source: &'a S, config: &'a FinancialConfig, ratios: &'a RatioTable) -> Self {
        Self {
            source,
            config,
            ratios,
        }
    }

    pub fn raw(&self, territory: &Territory) -> f64 {
        self.source
            .financial_count(&territory.id, self.config.effort_threshold)
            .unwrap_or(0.0)
    }

    /// Raw count minus the overlaps with upstream categories, floored at
    /// zero, then reduced by the reallocation share.
    pub fn compute_by_territory(&self, territory: &Territory, poor_quality: f64, hosted: f64) -> f64 {
        let ratios = self.ratios.for_region(&territory.region);
        let effort = self.config.effort_threshold.as_percent();
        let deducted = self.raw(territory)
            - ratios.ratio43.at(effort) * poor_quality
            - ratios.ratio44.at(effort) * hosted;
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
