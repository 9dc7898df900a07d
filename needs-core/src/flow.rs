//! Flow requirement: the sequential year-by-year simulator.
//!
//! For each territory the engine combines the demographic delta, the
//! amortization of the pre-existing stock deficit, vacancy and
//! secondary-residence evolution, and stock turnover into a per-year
//! housing-need/surplus series, detects the peak year, and totals the
//! components over the projection window. Territories are independent and
//! fan out in parallel; within one territory the propagation step is
//! inherently ordered, each year reads the previous year's derived stock.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::coefficients::RegionCoefficients;
use crate::data::{ReferenceData, VacancyKind};
use crate::demography::DemographicProjector;
use crate::error::{EngineError, TerritoryFailure};
use crate::ratios::RatioTable;
use crate::scenario::{EngineConfig, Scenario, Territory, TerritoryScenario};
use crate::stock_needs::StockNeedPipeline;
use crate::turnover::{StockTurnoverEstimator, TurnoverAdjustment};
use crate::types::{TerritoryId, Year, YearlySeries, round_unit};

// ============================================================================
// Results
// ============================================================================

/// Component totals over the projection window. All fields except
/// `surplus_housing` sum over `(base_year, peak_year]`; surplus sums over
/// the whole propagated window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub housing_needs: f64,
    pub surplus_housing: f64,
    pub new_construction: f64,
    pub replacement: f64,
    pub vacant_accommodation: f64,
    pub vacant_short_term: f64,
    pub vacant_long_term: f64,
    pub secondary_residences: f64,
}

/// One territory's flow simulation output. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryFlowResult {
    pub territory: TerritoryId,
    pub peak_year: Year,
    pub parc_evolution: YearlySeries,
    pub housing_needs: YearlySeries,
    pub surplus_housing: YearlySeries,
    pub new_construction: YearlySeries,
    pub totals: FlowTotals,
}

/// Batch output with per-territory isolation: a failed territory lands in
/// `failures` and never suppresses the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResults {
    pub territories: Vec<TerritoryFlowResult>,
    pub failures: Vec<TerritoryFailure>,
}

impl FlowResults {
    pub fn total_housing_needs(&self) -> f64 {
        self.territories.iter().map(|t| t.totals.housing_needs).sum()
    }
}

// ============================================================================
// Peak-year detection
// ============================================================================

/// The year immediately preceding the first year of the combined need
/// series that turns negative. A series that never turns negative peaks at
/// `fallback`, the configured maximum projection year.
pub fn detect_peak_year(combined_need: &YearlySeries, fallback: Year) -> Year {
    combined_need
        .iter()
        .find(|&(_, value)| value < 0.0)
        .map(|(year, _)| year - 1)
        .unwrap_or(fallback)
}

// ============================================================================
// Engine
// ============================================================================

pub struct FlowRequirementEngine<'a, D: ReferenceData + ?Sized> {
    data: &'a D,
    config: &'a EngineConfig,
    coefficients: &'a RegionCoefficients,
    ratios: &'a RatioTable,
}

impl<'a, D: ReferenceData + ?Sized> FlowRequirementEngine<'a, D> {
    pub fn new(
        data: &'a D,
        config: &'a EngineConfig,
        coefficients: &'a RegionCoefficients,
        ratios: &'a RatioTable,
    ) -> Self {
        Self {
            data,
            config,
            coefficients,
            ratios,
        }
    }

    /// Run the simulation for every territory, in parallel.
    pub fn run(&self, scenario: &Scenario, territories: &[Territory]) -> FlowResults {
        let outcomes: Vec<Result<TerritoryFlowResult, TerritoryFailure>> = territories
            .par_iter()
            .map(|territory| {
                self.territory_flow(scenario, territory)
                    .map_err(|error| TerritoryFailure {
                        territory: territory.id.clone(),
                        error,
                    })
            })
            .collect();

        let mut results = FlowResults {
            territories: Vec::new(),
            failures: Vec::new(),
        };
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.territories.push(result),
                Err(failure) => results.failures.push(failure),
            }
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "flow",
            territories = results.territories.len(),
            failures = results.failures.len(),
            total_housing_needs = results.total_housing_needs(),
        );

        results
    }

    /// The full eleven-step pipeline for one territory.
    pub fn territory_flow(
        &self,
        scenario: &Scenario,
        territory: &Territory,
    ) -> Result<TerritoryFlowResult, EngineError> {
        let base_year = self.config.base_year;
        let projection_year = scenario.projection_year;

        let snapshot = self
            .data
            .stock_snapshot(&territory.id)
            .ok_or(EngineError::MissingSnapshot {
                territory: territory.id.clone(),
            })?;

        // Anchored one year before the base year so the series includes the
        // base year's own delta.
        let projector = DemographicProjector::new(self.data);
        let delta = projector.delta(
            &territory.id,
            scenario.variant,
            base_year - 1,
            projection_year,
        )?;

        // The reference table must cover the whole projection window; a
        // table that ends early is missing data, not zero growth.
        match delta.last_year() {
            Some(last) if last >= projection_year => {}
            last => {
                return Err(EngineError::MissingProjection {
                    territory: territory.id.clone(),
                    year: last.map_or(base_year, |y| y + 1),
                });
            }
        }

        // The stock deficit enters the flow simulation at full value; the
        // horizon proration applies only to the standalone stock-need view.
        let stock_deficit = StockNeedPipeline::new(self.data, scenario, self.ratios)
            .evaluate(territory, 1.0)
            .total();

        let horizon_years = scenario.resorption_horizon_years(base_year);
        let deficit_reduction = deficit_reduction_schedule(
            stock_deficit,
            base_year,
            projection_year,
            scenario.resorption_horizon_year,
            horizon_years,
        );

        let combined_need = YearlySeries::from_fn(base_year, projection_year, |year| {
            delta.series.get(year).unwrap_or(0.0) + deficit_reduction.get(year).unwrap_or(0.0)
        });

        let peak_year = detect_peak_year(&combined_need, self.config.max_projection_year);
        let series_end = peak_year.min(projection_year);

        #[cfg(feature = "instrument")]
        tracing::debug!(
            target: "peak",
            territory = %territory.id,
            peak_year,
            stock_deficit,
        );

        let vacancy_combined =
            self.data
                .vacancy_evolution(&territory.id, series_end, VacancyKind::Combined);
        let vacancy_short =
            self.data
                .vacancy_evolution(&territory.id, series_end, VacancyKind::ShortTerm);
        let vacancy_long =
            self.data
                .vacancy_evolution(&territory.id, series_end, VacancyKind::LongTerm);
        let secondary = self
            .data
            .secondary_residence_evolution(&territory.id, series_end);

        // Accommodation variation: combined need plus the cumulative deficit
        // reduction re-summed from the base year each time, grossed up by the
        // year's residual occupancy rate.
        let mut accommodation = YearlySeries::new();
        for year in base_year..=series_end {
            let vacancy = rate_at(&vacancy_combined, territory, year, "combined vacancy")?;
            let secondary_rate = rate_at(&secondary, territory, year, "secondary residence")?;
            let residual = 1.0 - vacancy - secondary_rate;
            if residual <= 0.0 {
                return Err(EngineError::DegenerateOccupancyRate {
                    territory: territory.id.clone(),
                    rate: residual,
                });
            }
            let need = combined_need.get(year).unwrap_or(0.0);
            let cumulative_deficit = deficit_reduction.sum_over(base_year, year);
            accommodation.insert(year, (need + cumulative_deficit) / residual);
        }

        let vacant_combined_var =
            rate_variation_series(&accommodation, &vacancy_combined, territory, "combined vacancy")?;
        let vacant_short_var =
            rate_variation_series(&accommodation, &vacancy_short, territory, "short-term vacancy")?;
        let vacant_long_var =
            rate_variation_series(&accommodation, &vacancy_long, territory, "long-term vacancy")?;
        let secondary_var =
            rate_variation_series(&accommodation, &secondary, territory, "secondary residence")?;

        // New construction: never build a negative amount merely to satisfy
        // vacancy or secondary-residence dynamics.
        let new_construction = YearlySeries::from_fn(base_year, series_end, |year| {
            let need = combined_need.get(year).unwrap_or(0.0);
            let variation = vacant_combined_var.get(year).unwrap_or(0.0)
                + secondary_var.get(year).unwrap_or(0.0);
            if variation.abs() > need {
                0.0
            } else {
                need + variation
            }
        });

        // Sequential propagation: each year reads the previous year's stock.
        let estimator = StockTurnoverEstimator::new(self.data, self.coefficients);
        let neutral;
        let targets: &TerritoryScenario = match scenario.overrides_for(&territory.id) {
            Some(overrides) => overrides,
            None => {
                neutral = TerritoryScenario::neutral(territory.id.clone());
                &neutral
            }
        };
        let adjustment = TurnoverAdjustment::from(targets);

        let mut parc_evolution = YearlySeries::new();
        let mut housing_needs = YearlySeries::new();
        let mut surplus_housing = YearlySeries::new();
        let mut replacement_series = YearlySeries::new();
        parc_evolution.insert(base_year, snapshot.total_stock);

        let mut previous_stock = snapshot.total_stock;
        for year in (base_year + 1)..=projection_year {
            let replacement =
                estimator.replacement_need(territory, previous_stock, &adjustment, 1)?;
            // Construction drives the delta up to the peak; past it the
            // raw combined need does, no rate data required.
            let driver = if year <= series_end {
                new_construction.get(year).unwrap_or(0.0)
            } else {
                combined_need.get(year).unwrap_or(0.0)
            };
            let yearly_delta = replacement + driver;

            let needs = round_unit(yearly_delta.max(0.0));
            let surplus = round_unit((-yearly_delta).max(0.0));
            housing_needs.insert(year, needs);
            surplus_housing.insert(year, surplus);
            replacement_series.insert(year, replacement);

            previous_stock = (previous_stock + needs - surplus).max(0.0);
            parc_evolution.insert(year, previous_stock);
        }

        let totals = FlowTotals {
            housing_needs: round_unit(housing_needs.sum_over(base_year + 1, peak_year)),
            surplus_housing: round_unit(surplus_housing.sum_over(base_year + 1, projection_year)),
            new_construction: round_unit(new_construction.sum_over(base_year + 1, peak_year)),
            replacement: round_unit(replacement_series.sum_over(base_year + 1, peak_year)),
            vacant_accommodation: round_unit(vacant_combined_var.sum_over(base_year + 1, peak_year)),
            vacant_short_term: round_unit(vacant_short_var.sum_over(base_year + 1, peak_year)),
            vacant_long_term: round_unit(vacant_long_var.sum_over(base_year + 1, peak_year)),
            secondary_residences: round_unit(secondary_var.sum_over(base_year + 1, peak_year)),
        };

        Ok(TerritoryFlowResult {
            territory: territory.id.clone(),
            peak_year,
            parc_evolution,
            housing_needs,
            surplus_housing,
            new_construction,
            totals,
        })
    }
}

// ============================================================================
// Series helpers
// ============================================================================

/// Allocate the stock deficit linearly across the resorption window; zero
/// beyond the horizon. A window of zero years collapses to zero rather than
/// dividing by zero.
fn deficit_reduction_schedule(
    stock_deficit: f64,
    base_year: Year,
    projection_year: Year,
    horizon_year: Year,
    horizon_years: i32,
) -> YearlySeries {
    YearlySeries::from_fn(base_year, projection_year, |year| {
        if horizon_years <= 0 || year > horizon_year {
            0.0
        } else {
            stock_deficit / horizon_years as f64
        }
    })
}

/// Discrete derivative of the stock-weighted rate: the first year is
/// `accommodation * rate`, later years difference against the previous
/// year's weighted value. A rate year missing inside the window fails
/// loudly, same as the residual-rate lookups.
fn rate_variation_series(
    accommodation: &YearlySeries,
    rates: &YearlySeries,
    territory: &Territory,
    kind: &'static str,
) -> Result<YearlySeries, EngineError> {
    let mut series = YearlySeries::new();
    let mut previous_weighted: Option<f64> = None;
    for (year, stock) in accommodation.iter() {
        let weighted = stock * rate_at(rates, territory, year, kind)?;
        let variation = match previous_weighted {
            Some(prev) => weighted - prev,
            None => weighted,
        };
        previous_weighted = Some(weighted);
        series.insert(year, variation);
    }
    Ok(series)
}

fn rate_at(
    series: &YearlySeries,
    territory: &Territory,
    year: Year,
    kind: &'static str,
) -> Result<f64, EngineError> {
    series.get(year).ok_or_else(|| EngineError::MissingRate {
        territory: territory.id.clone(),
        year,
        kind: kind.to_string(),
    })
}
