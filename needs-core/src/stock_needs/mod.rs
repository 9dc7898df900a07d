//! Stock need: the five static inadequate-housing calculators and their
//! aggregation.
//!
//! The calculators form a fixed, non-cyclic dependency chain — unsheltered,
//! hosted, poor quality, then financial and physical, which deduct overlaps
//! against the upstream results. The chain is evaluated as an explicit
//! ordered pipeline per territory; territories themselves are independent
//! and fan out in parallel.

pub mod financial;
pub mod hosted;
pub mod physical;
pub mod poor_quality;
pub mod unsheltered;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::InadequacySource;
use crate::ratios::RatioTable;
use crate::scenario::{Scenario, Territory};
use crate::types::{TerritoryId, round_unit};

pub use financial::FinancialCalculator;
pub use hosted::HostedCalculator;
pub use physical::PhysicalCalculator;
pub use poor_quality::PoorQualityCalculator;
pub use unsheltered::UnshelteredCalculator;

/// Units expected to resolve through internal reallocation are not built.
pub(crate) fn apply_reallocation(value: f64, reallocation_pct: f64) -> f64 {
    value * (1.0 - reallocation_pct / 100.0)
}

/// Final step of every calculator: scale by the horizon-adjusted coefficient
/// and round to whole units.
pub(crate) fn apply_coefficient(value: f64, coefficient: f64) -> f64 {
    round_unit(value * coefficient)
}

// ============================================================================
// Results
// ============================================================================

/// One calculator's value for one territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryNeed {
    pub territory: TerritoryId,
    pub value: f64,
}

/// One calculator's batch output over a set of territories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResults {
    pub per_territory: Vec<TerritoryNeed>,
    pub total: f64,
}

impl CategoryResults {
    pub(crate) fn from_values(per_territory: Vec<TerritoryNeed>) -> Self {
        let total = per_territory.iter().map(|t| t.value).sum();
        Self {
            per_territory,
            total,
        }
    }

    /// The batch value for one territory; a territory outside the batch
    /// counts as zero.
    pub fn value_for(&self, territory: &TerritoryId) -> f64 {
        self.per_territory
            .iter()
            .find(|t| &t.territory == territory)
            .map_or(0.0, |t| t.value)
    }
}

/// Per-category stock need for one territory, in evaluation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub unsheltered: f64,
    pub hosted: f64,
    pub poor_quality: f64,
    pub financial: f64,
    pub physical: f64,
}

impl CategoryBreakdown {
    pub fn total(&self) -> f64 {
        self.unsheltered + self.hosted + self.poor_quality + self.financial + self.physical
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryStockNeed {
    pub territory: TerritoryId,
    pub breakdown: CategoryBreakdown,
    pub total: f64,
}

/// Aggregated stock need: category breakdown, per-territory totals, and the
/// combined total used to size deficit reduction in the flow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockNeedResults {
    pub per_category: CategoryBreakdown,
    pub per_territory: Vec<TerritoryStockNeed>,
    pub total: f64,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Ordered evaluation of the five calculators for one territory.
pub struct StockNeedPipeline<'a, S: InadequacySource + ?Sized> {
    source: &'a S,
    scenario: &'a Scenario,
    ratios: &'a RatioTable,
}

impl<'a, S: InadequacySource + ?Sized> StockNeedPipeline<'a, S> {
    pub fn new(source: &'a S, scenario: &'a Scenario, ratios: &'a RatioTable) -> Self {
        Self {
            source,
            scenario,
            ratios,
        }
    }

    /// Evaluate the chain in dependency order, then apply the coefficient to
    /// each category as the final step. Total over its domain: sparse
    /// reference rows count as zero.
    pub fn evaluate(&self, territory: &Territory, coefficient: f64) -> CategoryBreakdown {
        let unsheltered = UnshelteredCalculator::new(self.source, &self.scenario.unsheltered)
            .compute_by_territory(&territory.id);
        let hosted = HostedCalculator::new(self.source, &self.scenario.hosted)
            .compute_by_territory(&territory.id);
        let poor_quality = PoorQualityCalculator::new(self.source, &self.scenario.poor_quality)
            .compute_by_territory(&territory.id);
        let financial = FinancialCalculator::new(self.source, &self.scenario.financial, self.ratios)
            .compute_by_territory(territory, poor_quality, hosted);
        let physical = PhysicalCalculator::new(self.source, &self.scenario.physical, self.ratios)
            .compute_by_territory(territory, poor_quality, hosted);

        CategoryBreakdown {
            unsheltered: apply_coefficient(unsheltered, coefficient),
            hosted: apply_coefficient(hosted, coefficient),
            poor_quality: apply_coefficient(poor_quality, coefficient),
            financial: apply_coefficient(financial, coefficient),
            physical: apply_coefficient(physical, coefficient),
        }
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Runs the pipeline across territories in parallel and sums the results.
pub struct StockNeedAggregator<'a, S: InadequacySource + ?Sized> {
    pipeline: StockNeedPipeline<'a, S>,
}

impl<'a, S: InadequacySource + ?Sized> StockNeedAggregator<'a, S> {
    pub fn new(source: &'a S, scenario: &'a Scenario, ratios: &'a RatioTable) -> Self {
        Self {
            pipeline: StockNeedPipeline::new(source, scenario, ratios),
        }
    }

    pub fn aggregate(&self, territories: &[Territory], coefficient: f64) -> StockNeedResults {
        let per_territory: Vec<TerritoryStockNeed> = territories
            .par_iter()
            .map(|territory| {
                let breakdown = self.pipeline.evaluate(territory, coefficient);
                TerritoryStockNeed {
                    territory: territory.id.clone(),
                    total: breakdown.total(),
                    breakdown,
                }
            })
            .collect();

        let per_category = per_territory.iter().fold(
            CategoryBreakdown::default(),
            |acc, t| CategoryBreakdown {
                unsheltered: acc.unsheltered + t.breakdown.unsheltered,
                hosted: acc.hosted + t.breakdown.hosted,
                poor_quality: acc.poor_quality + t.breakdown.poor_quality,
                financial: acc.financial + t.breakdown.financial,
                physical: acc.physical + t.breakdown.physical,
            },
        );
        let total = per_category.total();

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "stock_need",
            territories = territories.len(),
            coefficient,
            total,
        );

        StockNeedResults {
            per_category,
            per_territory,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MemoryDataset, PoorQualityRow, UnshelteredRow};
    use crate::scenario::{
        EffortRateThreshold, EstablishmentKind, OvercrowdingLevel, UnshelteredSource,
    };

    fn populated_dataset(t: &TerritoryId) -> MemoryDataset {
        let mut data = MemoryDataset::new();
        data.set_unsheltered(
            t,
            UnshelteredSource::Census,
            UnshelteredRow {
                homeless: 100.0,
                makeshift_housing: 20.0,
                hotel_rooms: 5.0,
            },
        );
        data.set_hosted(t, EstablishmentKind::EmergencyShelter, 60.0);
        data.set_poor_quality(
            t,
            PoorQualityRow {
                without_comfort: 200.0,
                poor_condition: 50.0,
            },
        );
        data.set_financial(t, EffortRateThreshold::Over35, 500.0);
        data.set_overcrowding(t, OvercrowdingLevel::Moderate, 300.0);
        data
    }

    #[test]
    fn pipeline_feeds_upstream_results_into_downstream_deductions() {
        let territory = Territory::new("200000001", "Test EPCI", "unknown-region");
        let data = populated_dataset(&territory.id);
        let scenario = Scenario::with_horizon(2030, 2041);
        let ratios = RatioTable::default();

        let breakdown = StockNeedPipeline::new(&data, &scenario, &ratios).evaluate(&territory, 1.0);

        assert_eq!(breakdown.unsheltered, 125.0);
        assert_eq!(breakdown.hosted, 60.0);
        assert_eq!(breakdown.poor_quality, 200.0);
        // financial: 500 - 0.34*200 - 0.09*60 = 426.6 -> 427
        assert_eq!(breakdown.financial, 427.0);
        // physical: 300 - 0.17*200 - 0.06*60 = 262.4 -> 262
        assert_eq!(breakdown.physical, 262.0);
        assert_eq!(breakdown.total(), 125.0 + 60.0 + 200.0 + 427.0 + 262.0);
    }

    #[test]
    fn coefficient_scales_and_rounds_each_category() {
        let territory = Territory::new("200000001", "Test EPCI", "unknown-region");
        let data = populated_dataset(&territory.id);
        let scenario = Scenario::with_horizon(2030, 2041);
        let ratios = RatioTable::default();

        let half = StockNeedPipeline::new(&data, &scenario, &ratios).evaluate(&territory, 0.5);
        assert_eq!(half.unsheltered, 63.0, "125 * 0.5 rounds to 63");
        assert_eq!(half.hosted, 30.0);
        assert_eq!(half.poor_quality, 100.0);
    }

    #[test]
    fn all_zero_calculators_aggregate_to_exactly_zero() {
        let territory = Territory::new("200000099", "Sparse EPCI", "11");
        let data = MemoryDataset::new();
        let scenario = Scenario::with_horizon(2030, 2041);
        let ratios = RatioTable::default();

        let results =
            StockNeedAggregator::new(&data, &scenario, &ratios).aggregate(&[territory], 1.0);
        assert_eq!(results.total, 0.0);
        assert_eq!(results.per_territory[0].total, 0.0);
        assert_eq!(results.per_category, CategoryBreakdown::default());
    }

    #[test]
    fn sparse_territory_is_zero_while_populated_territory_counts() {
        let populated = Territory::new("200000001", "Populated EPCI", "unknown-region");
        let sparse = Territory::new("200000099", "Sparse EPCI", "unknown-region");
        let data = populated_dataset(&populated.id);
        let scenario = Scenario::with_horizon(2030, 2041);
        let ratios = RatioTable::default();

        let results = StockNeedAggregator::new(&data, &scenario, &ratios)
            .aggregate(&[populated, sparse], 1.0);

        assert_eq!(results.per_territory.len(), 2);
        assert!(results.per_territory[0].total > 0.0);
        assert_eq!(
            results.per_territory[1].total, 0.0,
            "sparse rows are zero, never an error"
        );
        assert_eq!(results.total, results.per_territory[0].total);
    }

    #[test]
    fn each_calculator_exposes_a_batch_view_matching_the_pipeline() {
        let populated = Territory::new("200000001", "Populated EPCI", "unknown-region");
        let sparse = Territory::new("200000099", "Sparse EPCI", "unknown-region");
        let data = populated_dataset(&populated.id);
        let scenario = Scenario::with_horizon(2030, 2041);
        let ratios = RatioTable::default();
        let territories = [populated.clone(), sparse.clone()];

        let unsheltered =
            UnshelteredCalculator::new(&data, &scenario.unsheltered).compute(&territories);
        assert_eq!(unsheltered.total, 125.0);
        assert_eq!(unsheltered.value_for(&populated.id), 125.0);
        assert_eq!(unsheltered.value_for(&sparse.id), 0.0);

        let hosted = HostedCalculator::new(&data, &scenario.hosted).compute(&territories);
        let poor_quality =
            PoorQualityCalculator::new(&data, &scenario.poor_quality).compute(&territories);
        let financial = FinancialCalculator::new(&data, &scenario.financial, &ratios).compute(
            &territories,
            &poor_quality,
            &hosted,
        );

        // Matches the single-territory chain: 500 - 0.34*200 - 0.09*60.
        let expected = 500.0 - 0.34 * 200.0 - 0.09 * 60.0;
        assert_eq!(financial.value_for(&populated.id), expected);
        assert_eq!(financial.value_for(&sparse.id), 0.0);
        assert_eq!(financial.total, expected);
    }
}
