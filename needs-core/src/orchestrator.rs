//! Top-level entry point: runs the flow engine and the stock-need
//! aggregator for a simulation and merges their totals.

use serde::{Deserialize, Serialize};

use crate::coefficients::{RegionCoefficients, horizon_proration_factor};
use crate::data::ReferenceData;
use crate::error::EngineError;
use crate::flow::{FlowRequirementEngine, FlowResults};
use crate::ratios::RatioTable;
use crate::scenario::{EngineConfig, Simulation};
use crate::stock_needs::{StockNeedAggregator, StockNeedResults};

/// Merged output of one simulation run. The grand total is flow plus stock;
/// the two adjustment fields track non-positive vacancy dynamics that reduce
/// effective need but are reported separately rather than netted in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResults {
    pub flow: FlowResults,
    pub stock: StockNeedResults,
    pub total_flow: f64,
    pub total_stock: f64,
    pub total: f64,
    pub vacant_accommodation_adjustment: f64,
    pub secondary_residence_adjustment: f64,
}

pub struct NeedsCalculationOrchestrator<'a, D: ReferenceData + ?Sized> {
    data: &'a D,
    config: EngineConfig,
    coefficients: RegionCoefficients,
    ratios: RatioTable,
}

impl<'a, D: ReferenceData + ?Sized> NeedsCalculationOrchestrator<'a, D> {
    pub fn new(data: &'a D) -> Self {
        Self::with_config(
            data,
            EngineConfig::default(),
            RegionCoefficients::default(),
            RatioTable::default(),
        )
    }

    pub fn with_config(
        data: &'a D,
        config: EngineConfig,
        coefficients: RegionCoefficients,
        ratios: RatioTable,
    ) -> Self {
        Self {
            data,
            config,
            coefficients,
            ratios,
        }
    }

    /// The flow view alone: per-territory yearly series and totals.
    pub fn calculate_flow_requirement(&self, simulation: &Simulation) -> FlowResults {
        FlowRequirementEngine::new(self.data, &self.config, &self.coefficients, &self.ratios)
            .run(&simulation.scenario, &simulation.territories)
    }

    /// The standalone stock-need view, prorated down to the share of the
    /// resorption horizon covered by the observation window.
    pub fn calculate_stock_need(
        &self,
        simulation: &Simulation,
    ) -> Result<StockNeedResults, EngineError> {
        let horizon_years = simulation
            .scenario
            .resorption_horizon_years(self.config.base_year);
        let proration =
            horizon_proration_factor(horizon_years, self.config.observation_period_years)?;
        Ok(
            StockNeedAggregator::new(self.data, &simulation.scenario, &self.ratios)
                .aggregate(&simulation.territories, proration),
        )
    }

    /// The sole entry point external callers should use: both views merged.
    pub fn calculate(&self, simulation: &Simulation) -> Result<CalculationResults, EngineError> {
        let flow = self.calculate_flow_requirement(simulation);
        let stock = self.calculate_stock_need(simulation)?;

        let total_flow: f64 = flow
            .territories
            .iter()
            .map(|t| t.totals.housing_needs)
            .sum();
        let total_stock = stock.total;

        // Only territories whose long-term vacancy dynamics released stock
        // on net contribute to the adjustments; net tightening is already
        // priced into the construction series.
        let mut vacant_accommodation_adjustment = 0.0;
        let mut secondary_residence_adjustment = 0.0;
        for territory in &flow.territories {
            if territory.totals.vacant_long_term <= 0.0 {
                vacant_accommodation_adjustment += territory.totals.vacant_long_term;
                secondary_residence_adjustment += territory.totals.secondary_residences;
            }
        }

        let total = total_flow + total_stock;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "orchestrator",
            simulation = %simulation.name,
            total_flow,
            total_stock,
            total,
            failures = flow.failures.len(),
        );

        Ok(CalculationResults {
            flow,
            stock,
            total_flow,
            total_stock,
            total,
            vacant_accommodation_adjustment,
            secondary_residence_adjustment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MemoryDataset, UnshelteredRow, VacancyKind};
    use crate::fixtures::pass_through_dataset;
    use crate::scenario::{Scenario, Territory, UnshelteredSource};
    use crate::types::YearlySeries;

    fn simulation(data_territory: &Territory, horizon: i32) -> Simulation {
        Simulation::new(
            "test run",
            Scenario::with_horizon(2050, horizon),
            vec![data_territory.clone()],
        )
    }

    #[test]
    fn pass_through_simulation_totals_flow_only() {
        let territory = Territory::new("200000001", "Test EPCI", "11");
        let data = pass_through_dataset(&territory.id);
        let orchestrator = NeedsCalculationOrchestrator::new(&data);

        let results = orchestrator
            .calculate(&simulation(&territory, 2041))
            .unwrap();

        assert_eq!(results.total_flow, 2_900.0);
        assert_eq!(results.total_stock, 0.0);
        assert_eq!(results.total, 2_900.0);
        assert_eq!(results.vacant_accommodation_adjustment, 0.0);
        assert_eq!(results.secondary_residence_adjustment, 0.0);
        assert!(results.flow.failures.is_empty());
    }

    #[test]
    fn stock_need_is_prorated_to_the_observation_window() {
        let territory = Territory::new("200000001", "Test EPCI", "11");
        let mut data = pass_through_dataset(&territory.id);
        data.set_unsheltered(
            &territory.id,
            UnshelteredSource::Census,
            UnshelteredRow {
                homeless: 100.0,
                makeshift_housing: 0.0,
                hotel_rooms: 0.0,
            },
        );
        let orchestrator = NeedsCalculationOrchestrator::new(&data);

        // 20-year horizon against a 6-year observation window: 6/20 = 0.3.
        let stock = orchestrator
            .calculate_stock_need(&simulation(&territory, 2041))
            .unwrap();
        assert_eq!(stock.per_category.unsheltered, 30.0);
        assert_eq!(stock.total, 30.0);
    }

    #[test]
    fn horizon_at_the_base_year_is_rejected() {
        let territory = Territory::new("200000001", "Test EPCI", "11");
        let data = pass_through_dataset(&territory.id);
        let orchestrator = NeedsCalculationOrchestrator::new(&data);

        let err = orchestrator
            .calculate(&simulation(&territory, 2021))
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidHorizon { horizon: 0 });
    }

    #[test]
    fn released_long_term_vacancy_feeds_the_adjustments() {
        let territory = Territory::new("200000001", "Vacancy EPCI", "11");
        let mut data = pass_through_dataset(&territory.id);
        let falling = YearlySeries::from_fn(2021, 2050, |year| {
            (0.08 - 0.002 * (year - 2021) as f64).max(0.0)
        });
        data.set_vacancy(&territory.id, VacancyKind::LongTerm, falling);
        let orchestrator = NeedsCalculationOrchestrator::new(&data);

        let results = orchestrator
            .calculate(&simulation(&territory, 2041))
            .unwrap();

        let totals = results.flow.territories[0].totals;
        assert!(
            totals.vacant_long_term < 0.0,
            "falling long-term vacancy releases stock: {}",
            totals.vacant_long_term
        );
        assert_eq!(
            results.vacant_accommodation_adjustment,
            totals.vacant_long_term
        );
        assert_eq!(
            results.secondary_residence_adjustment,
            totals.secondary_residences
        );
    }
}
