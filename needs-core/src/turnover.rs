//! Stock turnover: annualized replacement and restructuring rates, the
//! replacement need they imply, and the potential demand read off observed
//! occupancy versus demographic pressure.

use serde::{Deserialize, Serialize};

use crate::coefficients::{RegionCoefficients, project_rate};
use crate::data::{StockRow, StockSource};
use crate::error::EngineError;
use crate::scenario::{Territory, TerritoryScenario};

/// Which observed decennial rate to annualize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnoverKind {
    Restructuring,
    Disappearance,
}

/// Scenario-supplied additional turnover rates, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnoverAdjustment {
    pub restructuring_pct: f64,
    pub disappearance_pct: f64,
}

impl From<&TerritoryScenario> for TurnoverAdjustment {
    fn from(overrides: &TerritoryScenario) -> Self {
        Self {
            restructuring_pct: overrides.restructuring_additional_pct,
            disappearance_pct: overrides.disappearance_additional_pct,
        }
    }
}

pub struct StockTurnoverEstimator<'a, S: StockSource + ?Sized> {
    stock: &'a S,
    coefficients: &'a RegionCoefficients,
}

impl<'a, S: StockSource + ?Sized> StockTurnoverEstimator<'a, S> {
    pub fn new(stock: &'a S, coefficients: &'a RegionCoefficients) -> Self {
        Self {
            stock,
            coefficients,
        }
    }

    fn snapshot(&self, territory: &Territory) -> Result<StockRow, EngineError> {
        self.stock
            .stock_snapshot(&territory.id)
            .ok_or(EngineError::MissingSnapshot {
                territory: territory.id.clone(),
            })
    }

    /// Annual-equivalent of the territory's observed decennial rate. Only
    /// final outputs round to whole units; this stays fractional.
    pub fn annualized_rate(
        &self,
        territory: &Territory,
        kind: TurnoverKind,
    ) -> Result<f64, EngineError> {
        let row = self.snapshot(territory)?;
        let observed = match kind {
            TurnoverKind::Restructuring => row.restructuring_rate,
            TurnoverKind::Disappearance => row.disappearance_rate,
        };
        Ok(self
            .coefficients
            .compound_annual_rate(observed, 0.0, &territory.region))
    }

    /// Annualized rate plus the scenario's additional percent, re-compounded
    /// over `period_years`.
    pub fn compounded_rate(
        &self,
        territory: &Territory,
        kind: TurnoverKind,
        additional_pct: f64,
        period_years: i32,
    ) -> Result<f64, EngineError> {
        let annual = self.annualized_rate(territory, kind)?;
        Ok(project_rate(annual + additional_pct / 100.0, period_years))
    }

    /// Units lost or gained to turnover over `period_years`, independent of
    /// demographic pressure. Positive means net stock loss requiring
    /// replacement.
    pub fn replacement_need(
        &self,
        territory: &Territory,
        total_stock: f64,
        adjustment: &TurnoverAdjustment,
        period_years: i32,
    ) -> Result<f64, EngineError> {
        let restructuring = self.compounded_rate(
            territory,
            TurnoverKind::Restructuring,
            adjustment.restructuring_pct,
            period_years,
        )?;
        let disappearance = self.compounded_rate(
            territory,
            TurnoverKind::Disappearance,
            adjustment.disappearance_pct,
            period_years,
        )?;
        Ok(-1.0 * total_stock * (restructuring - disappearance))
    }

    /// Theoretical extra stock required over `period_years`: the
    /// occupancy-implied resident stock plus the demographic delta, grossed
    /// up by the residual occupancy rate the scenario targets, net of the
    /// current stock and of the turnover replacement need.
    pub fn potential_need(
        &self,
        territory: &Territory,
        targets: &TerritoryScenario,
        demographic_delta_total: f64,
        period_years: i32,
    ) -> Result<f64, EngineError> {
        let row = self.snapshot(territory)?;
        let residual =
            1.0 - targets.vacancy_target() - targets.secondary_residence_target;
        if residual <= 0.0 {
            return Err(EngineError::DegenerateOccupancyRate {
                territory: territory.id.clone(),
                rate: residual,
            });
        }

        let resident_stock = row.total_stock * row.occupancy_rate;
        let replacement = self.replacement_need(
            territory,
            row.total_stock,
            &TurnoverAdjustment::from(targets),
            period_years,
        )?;
        let required_stock = (resident_stock + demographic_delta_total) / residual;
        Ok(required_stock - row.total_stock - replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryDataset;
    use crate::types::TerritoryId;

    fn fixture(restructuring: f64, disappearance: f64) -> (Territory, MemoryDataset) {
        let territory = Territory::new("200000001", "Test EPCI", "11");
        let mut data = MemoryDataset::new();
        data.set_stock(
            &territory.id,
            StockRow {
                total_stock: 10_000.0,
                occupancy_rate: 0.90,
                vacancy_rate: 0.07,
                secondary_residence_rate: 0.03,
                disappearance_rate: disappearance,
                restructuring_rate: restructuring,
            },
        );
        (territory, data)
    }

    #[test]
    fn annualized_rate_inverts_the_observed_compound() {
        let (territory, data) = fixture(0.06, 0.03);
        let coeffs = RegionCoefficients::default();
        let estimator = StockTurnoverEstimator::new(&data, &coeffs);

        let annual = estimator
            .annualized_rate(&territory, TurnoverKind::Restructuring)
            .unwrap();
        let back = project_rate(annual, 6);
        assert!(
            (back - 0.06).abs() < 1e-8,
            "annualize then re-compound should recover 0.06, got {}",
            back
        );
    }

    #[test]
    fn replacement_need_is_positive_when_disappearance_dominates() {
        let (territory, data) = fixture(0.01, 0.04);
        let coeffs = RegionCoefficients::default();
        let estimator = StockTurnoverEstimator::new(&data, &coeffs);

        let need = estimator
            .replacement_need(&territory, 10_000.0, &TurnoverAdjustment::default(), 6)
            .unwrap();
        assert!(need > 0.0, "net stock loss should read as need: {}", need);

        let (territory, data) = fixture(0.04, 0.01);
        let estimator = StockTurnoverEstimator::new(&data, &coeffs);
        let gain = estimator
            .replacement_need(&territory, 10_000.0, &TurnoverAdjustment::default(), 6)
            .unwrap();
        assert!(gain < 0.0, "net restructuring gain offsets need: {}", gain);
    }

    #[test]
    fn degenerate_residual_rate_is_a_domain_error() {
        let (territory, data) = fixture(0.02, 0.02);
        let coeffs = RegionCoefficients::default();
        let estimator = StockTurnoverEstimator::new(&data, &coeffs);

        let mut targets = TerritoryScenario::neutral(territory.id.clone());
        targets.long_term_vacancy_target = 0.6;
        targets.secondary_residence_target = 0.5;

        let err = estimator
            .potential_need(&territory, &targets, 100.0, 6)
            .unwrap_err();
        assert!(
            matches!(err, EngineError::DegenerateOccupancyRate { rate, .. } if rate < 0.0),
            "residual of -0.1 must not silently produce infinity: {:?}",
            err
        );
    }

    #[test]
    fn potential_need_grows_with_demographic_pressure() {
        let (territory, data) = fixture(0.02, 0.02);
        let coeffs = RegionCoefficients::default();
        let estimator = StockTurnoverEstimator::new(&data, &coeffs);
        let mut targets = TerritoryScenario::neutral(territory.id.clone());
        targets.long_term_vacancy_target = 0.05;
        targets.secondary_residence_target = 0.03;

        let flat = estimator
            .potential_need(&territory, &targets, 0.0, 6)
            .unwrap();
        let pressured = estimator
            .potential_need(&territory, &targets, 600.0, 6)
            .unwrap();
        assert!(
            pressured > flat,
            "600 extra households must raise potential need: {} vs {}",
            pressured,
            flat
        );
    }

    #[test]
    fn missing_snapshot_aborts_with_not_found() {
        let territory = Territory::new("200000099", "Absent EPCI", "11");
        let data = MemoryDataset::new();
        let coeffs = RegionCoefficients::default();
        let estimator = StockTurnoverEstimator::new(&data, &coeffs);

        let err = estimator
            .annualized_rate(&territory, TurnoverKind::Disappearance)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingSnapshot {
                territory: TerritoryId::new("200000099")
            }
        );
    }
}
