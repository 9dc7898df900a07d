//! Read interfaces over the external reference datasets.
//!
//! The engine consumes four datasets through these traits: demographic
//! projections by variant and year, housing-stock composition, vacancy and
//! secondary-residence historical rates, and the five inadequate-housing
//! reference tables. Fetches are idempotent reads; retries belong to the
//! implementor, not the engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scenario::{
    DemographicVariant, EffortRateThreshold, EstablishmentKind, OvercrowdingLevel,
    UnshelteredSource,
};
use crate::types::{TerritoryId, Year, YearlySeries};

// ============================================================================
// Rows
// ============================================================================

/// Per-territory snapshot of observed housing-stock composition for the most
/// recent observed period. Disappearance and restructuring rates are
/// decennial observations; the engine annualizes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub total_stock: f64,
    pub occupancy_rate: f64,
    pub vacancy_rate: f64,
    pub secondary_residence_rate: f64,
    pub disappearance_rate: f64,
    pub restructuring_rate: f64,
}

/// Vacancy series variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VacancyKind {
    Combined,
    ShortTerm,
    LongTerm,
}

/// Unsheltered counts for one territory and one source dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnshelteredRow {
    pub homeless: f64,
    pub makeshift_housing: f64,
    pub hotel_rooms: f64,
}

impl UnshelteredRow {
    pub fn total(&self) -> f64 {
        self.homeless + self.makeshift_housing + self.hotel_rooms
    }
}

/// Poor-quality counts for one territory.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoorQualityRow {
    pub without_comfort: f64,
    pub poor_condition: f64,
}

// ============================================================================
// Source traits
// ============================================================================

/// Demographic projections. The reference table must be fully populated over
/// the years it covers; the engine never extrapolates.
pub trait DemographicSource: Sync {
    fn projection(
        &self,
        territory: &TerritoryId,
        variant: DemographicVariant,
        year: Year,
    ) -> Option<f64>;

    /// All available years at or before `max_year`, ascending.
    fn projection_series(
        &self,
        territory: &TerritoryId,
        variant: DemographicVariant,
        max_year: Year,
    ) -> Vec<(Year, f64)>;
}

/// Observed housing-stock composition.
pub trait StockSource: Sync {
    fn stock_snapshot(&self, territory: &TerritoryId) -> Option<StockRow>;
}

/// Vacancy and secondary-residence rate evolutions.
pub trait RateSource: Sync {
    fn vacancy_evolution(
        &self,
        territory: &TerritoryId,
        upto_year: Year,
        kind: VacancyKind,
    ) -> YearlySeries;

    fn secondary_residence_evolution(&self, territory: &TerritoryId, upto_year: Year)
    -> YearlySeries;
}

/// The five inadequate-housing reference tables. These are sparse by design:
/// `None` means the category does not apply to the territory and is counted
/// as zero, never as an error.
pub trait InadequacySource: Sync {
    fn unsheltered_row(
        &self,
        territory: &TerritoryId,
        source: UnshelteredSource,
    ) -> Option<UnshelteredRow>;

    fn hosted_count(&self, territory: &TerritoryId, kind: EstablishmentKind) -> Option<f64>;

    fn financial_count(
        &self,
        territory: &TerritoryId,
        threshold: EffortRateThreshold,
    ) -> Option<f64>;

    fn overcrowding_count(
        &self,
        territory: &TerritoryId,
        level: OvercrowdingLevel,
    ) -> Option<f64>;

    fn poor_quality_row(&self, territory: &TerritoryId) -> Option<PoorQualityRow>;
}

/// The whole data boundary of the engine.
pub trait ReferenceData: DemographicSource + StockSource + RateSource + InadequacySource {}

impl<T: DemographicSource + StockSource + RateSource + InadequacySource> ReferenceData for T {}

// ============================================================================
// In-memory dataset
// ============================================================================

/// In-memory implementation of every source trait, used by tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    projections: HashMap<(TerritoryId, DemographicVariant, Year), f64>,
    stock: HashMap<TerritoryId, StockRow>,
    vacancy: HashMap<(TerritoryId, VacancyKind), YearlySeries>,
    secondary: HashMap<TerritoryId, YearlySeries>,
    unsheltered: HashMap<(TerritoryId, UnshelteredSource), UnshelteredRow>,
    hosted: HashMap<(TerritoryId, EstablishmentKind), f64>,
    financial: HashMap<(TerritoryId, EffortRateThreshold), f64>,
    overcrowding: HashMap<(TerritoryId, OvercrowdingLevel), f64>,
    poor_quality: HashMap<TerritoryId, PoorQualityRow>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_projection(
        &mut self,
        territory: &TerritoryId,
        variant: DemographicVariant,
        year: Year,
        households: f64,
    ) {
        self.projections
            .insert((territory.clone(), variant, year), households);
    }

    pub fn set_stock(&mut self, territory: &TerritoryId, row: StockRow) {
        self.stock.insert(territory.clone(), row);
    }

    pub fn set_vacancy(&mut self, territory: &TerritoryId, kind: VacancyKind, series: YearlySeries) {
        self.vacancy.insert((territory.clone(), kind), series);
    }

    pub fn set_secondary(&mut self, territory: &TerritoryId, series: YearlySeries) {
        self.secondary.insert(territory.clone(), series);
    }

    pub fn set_unsheltered(
        &mut self,
        territory: &TerritoryId,
        source: UnshelteredSource,
        row: UnshelteredRow,
    ) {
        self.unsheltered.insert((territory.clone(), source), row);
    }

    pub fn set_hosted(&mut self, territory: &TerritoryId, kind: EstablishmentKind, count: f64) {
        self.hosted.insert((territory.clone(), kind), count);
    }

    pub fn set_financial(
        &mut self,
        territory: &TerritoryId,
        threshold: EffortRateThreshold,
        count: f64,
    ) {
        self.financial.insert((territory.clone(), threshold), count);
    }

    pub fn set_overcrowding(
        &mut self,
        territory: &TerritoryId,
        level: OvercrowdingLevel,
        count: f64,
    ) {
        self.overcrowding.insert((territory.clone(), level), count);
    }

    pub fn set_poor_quality(&mut self, territory: &TerritoryId, row: PoorQualityRow) {
        self.poor_quality.insert(territory.clone(), row);
    }
}

impl DemographicSource for MemoryDataset {
    fn projection(
        &self,
        territory: &TerritoryId,
        variant: DemographicVariant,
        year: Year,
    ) -> Option<f64> {
        self.projections
            .get(&(territory.clone(), variant, year))
            .copied()
    }

    fn projection_series(
        &self,
        territory: &TerritoryId,
        variant: DemographicVariant,
        max_year: Year,
    ) -> Vec<(Year, f64)> {
        let mut series: Vec<(Year, f64)> = self
            .projections
            .iter()
            .filter(|((t, v, y), _)| t == territory && *v == variant && *y <= max_year)
            .map(|((_, _, y), &value)| (*y, value))
            .collect();
        series.sort_by_key(|&(year, _)| year);
        series
    }
}

impl StockSource for MemoryDataset {
    fn stock_snapshot(&self, territory: &TerritoryId) -> Option<StockRow> {
        self.stock.get(territory).copied()
    }
}

impl RateSource for MemoryDataset {
    fn vacancy_evolution(
        &self,
        territory: &TerritoryId,
        upto_year: Year,
        kind: VacancyKind,
    ) -> YearlySeries {
        self.vacancy
            .get(&(territory.clone(), kind))
            .map(|s| s.truncated(upto_year))
            .unwrap_or_default()
    }

    fn secondary_residence_evolution(
        &self,
        territory: &TerritoryId,
        upto_year: Year,
    ) -> YearlySeries {
        self.secondary
            .get(territory)
            .map(|s| s.truncated(upto_year))
            .unwrap_or_default()
    }
}

impl InadequacySource for MemoryDataset {
    fn unsheltered_row(
        &self,
        territory: &TerritoryId,
        source: UnshelteredSource,
    ) -> Option<UnshelteredRow> {
        self.unsheltered.get(&(territory.clone(), source)).copied()
    }

    fn hosted_count(&self, territory: &TerritoryId, kind: EstablishmentKind) -> Option<f64> {
        self.hosted.get(&(territory.clone(), kind)).copied()
    }

    fn financial_count(
        &self,
        territory: &TerritoryId,
        threshold: EffortRateThreshold,
    ) -> Option<f64> {
        self.financial.get(&(territory.clone(), threshold)).copied()
    }

    fn overcrowding_count(
        &self,
        territory: &TerritoryId,
        level: OvercrowdingLevel,
    ) -> Option<f64> {
        self.overcrowding.get(&(territory.clone(), level)).copied()
    }

    fn poor_quality_row(&self, territory: &TerritoryId) -> Option<PoorQualityRow> {
        self.poor_quality.get(territory).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_series_is_sorted_and_capped() {
        let mut data = MemoryDataset::new();
        let t = TerritoryId::new("200000001");
        for (year, value) in [(2023, 103.0), (2021, 101.0), (2022, 102.0), (2030, 110.0)] {
            data.set_projection(&t, DemographicVariant::Central, year, value);
        }

        let series = data.projection_series(&t, DemographicVariant::Central, 2025);
        assert_eq!(series, vec![(2021, 101.0), (2022, 102.0), (2023, 103.0)]);
    }

    #[test]
    fn vacancy_evolution_truncates_at_requested_year() {
        let mut data = MemoryDataset::new();
        let t = TerritoryId::new("200000001");
        data.set_vacancy(
            &t,
            VacancyKind::Combined,
            YearlySeries::from_fn(2021, 2050, |_| 0.08),
        );

        let series = data.vacancy_evolution(&t, 2030, VacancyKind::Combined);
        assert_eq!(series.last_year(), Some(2030));
        assert_eq!(series.len(), 10);
    }

    #[test]
    fn sparse_rows_read_as_none_not_zero() {
        let data = MemoryDataset::new();
        let t = TerritoryId::new("200000001");
        assert!(data.poor_quality_row(&t).is_none());
        assert!(data.hosted_count(&t, EstablishmentKind::SocialHotel).is_none());
    }
}
