use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RegionCode, TerritoryId, Year};

// ============================================================================
// Territory
// ============================================================================

/// An administrative intercommunal area, the unit of analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub region: RegionCode,
}

impl Territory {
    pub fn new(id: impl Into<String>, name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id: TerritoryId::new(id),
            name: name.into(),
            region: RegionCode::new(region),
        }
    }
}

// ============================================================================
// Category toggles
// ============================================================================

/// Demographic-growth variant of the reference projection dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DemographicVariant {
    Low,
    Central,
    High,
}

/// Source dataset for unsheltered counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnshelteredSource {
    Census,
    ShelterRegistry,
}

/// Accommodation establishment types counted as "hosted" situations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstablishmentKind {
    EmergencyShelter,
    ReinsertionCentre,
    MigrantWorkerHostel,
    YoungWorkerHostel,
    SocialHotel,
}

impl EstablishmentKind {
    pub fn all() -> impl Iterator<Item = EstablishmentKind> {
        [
            EstablishmentKind::EmergencyShelter,
            EstablishmentKind::ReinsertionCentre,
            EstablishmentKind::MigrantWorkerHostel,
            EstablishmentKind::YoungWorkerHostel,
            EstablishmentKind::SocialHotel,
        ]
        .into_iter()
    }
}

/// Effort-rate threshold above which a household counts as financially
/// inadequate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffortRateThreshold {
    Over30,
    Over35,
    Over40,
}

impl EffortRateThreshold {
    pub fn as_percent(self) -> f64 {
        match self {
            EffortRateThreshold::Over30 => 30.0,
            EffortRateThreshold::Over35 => 35.0,
            EffortRateThreshold::Over40 => 40.0,
        }
    }
}

/// Occupation filter for the overcrowding calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OvercrowdingLevel {
    Moderate,
    Severe,
}

/// Comfort filter for the poor-quality calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityFilter {
    WithoutComfort,
    WithoutComfortOrPoorCondition,
}

// ============================================================================
// Per-category configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnshelteredConfig {
    pub source: UnshelteredSource,
    /// Share resolvable through internal reallocation, in percent.
    pub reallocation_pct: f64,
}

impl Default for UnshelteredConfig {
    fn default() -> Self {
        Self {
            source: UnshelteredSource::Census,
            reallocation_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedConfig {
    pub establishment_kinds: Vec<EstablishmentKind>,
    pub reallocation_pct: f64,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            establishment_kinds: EstablishmentKind::all().collect(),
            reallocation_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialConfig {
    pub effort_threshold: EffortRateThreshold,
    pub reallocation_pct: f64,
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            effort_threshold: EffortRateThreshold::Over35,
            reallocation_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConfig {
    pub level: OvercrowdingLevel,
    pub reallocation_pct: f64,
}

impl Default for PhysicalConfig {
    fn default() -> Self {
        Self {
            level: OvercrowdingLevel::Moderate,
            reallocation_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoorQualityConfig {
    pub filter: QualityFilter,
    pub reallocation_pct: f64,
}

impl Default for PoorQualityConfig {
    fn default() -> Self {
        Self {
            filter: QualityFilter::WithoutComfort,
            reallocation_pct: 0.0,
        }
    }
}

// ============================================================================
// Scenario
// ============================================================================

/// Per-territory override inside a scenario. Exactly one entry is flagged as
/// the base territory; lookups for territories without their own entry fall
/// back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryScenario {
    pub territory: TerritoryId,
    /// Target rates, dimensionless fractions in [0, 1].
    pub short_term_vacancy_target: f64,
    pub long_term_vacancy_target: f64,
    pub secondary_residence_target: f64,
    /// Scenario-supplied additional rates, in percent.
    pub disappearance_additional_pct: f64,
    pub restructuring_additional_pct: f64,
    pub is_base: bool,
}

impl TerritoryScenario {
    pub fn neutral(territory: TerritoryId) -> Self {
        Self {
            territory,
            short_term_vacancy_target: 0.0,
            long_term_vacancy_target: 0.0,
            secondary_residence_target: 0.0,
            disappearance_additional_pct: 0.0,
            restructuring_additional_pct: 0.0,
            is_base: false,
        }
    }

    pub fn vacancy_target(&self) -> f64 {
        self.short_term_vacancy_target + self.long_term_vacancy_target
    }
}

/// The set of user-chosen parameters for one projection. Immutable once a
/// simulation references it except through explicit update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub projection_year: Year,
    pub resorption_horizon_year: Year,
    pub variant: DemographicVariant,
    pub unsheltered: UnshelteredConfig,
    pub hosted: HostedConfig,
    pub financial: FinancialConfig,
    pub physical: PhysicalConfig,
    pub poor_quality: PoorQualityConfig,
    pub territory_overrides: Vec<TerritoryScenario>,
}

impl Scenario {
    /// A scenario with default category toggles and no overrides.
    pub fn with_horizon(projection_year: Year, resorption_horizon_year: Year) -> Self {
        Self {
            projection_year,
            resorption_horizon_year,
            variant: DemographicVariant::Central,
            unsheltered: UnshelteredConfig::default(),
            hosted: HostedConfig::default(),
            financial: FinancialConfig::default(),
            physical: PhysicalConfig::default(),
            poor_quality: PoorQualityConfig::default(),
            territory_overrides: Vec::new(),
        }
    }

    /// The territory's own override, falling back to the base entry.
    pub fn overrides_for(&self, territory: &TerritoryId) -> Option<&TerritoryScenario> {
        self.territory_overrides
            .iter()
            .find(|o| &o.territory == territory)
            .or_else(|| self.territory_overrides.iter().find(|o| o.is_base))
    }

    /// Resorption window length in years, measured from the base year.
    pub fn resorption_horizon_years(&self, base_year: Year) -> i32 {
        self.resorption_horizon_year - base_year
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// A named run binding one scenario to one or more territories. Results are
/// derived on every request, never stored as a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub name: String,
    pub scenario: Scenario,
    pub territories: Vec<Territory>,
    pub created_at: DateTime<Utc>,
}

impl Simulation {
    pub fn new(name: impl Into<String>, scenario: Scenario, territories: Vec<Territory>) -> Self {
        Self {
            name: name.into(),
            scenario,
            territories,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Engine configuration
// ============================================================================

/// Fixed parameters of the projection engine, configuration rather than
/// constants so callers can pin them per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed reference year; `parc_evolution[base_year]` equals the observed
    /// stock.
    pub base_year: Year,
    /// Fallback peak year when the combined need series never turns negative.
    pub max_projection_year: Year,
    /// Length of the observation window used as the default compounding
    /// period for turnover rates and horizon proration.
    pub observation_period_years: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_year: 2021,
            max_projection_year: 2050,
            observation_period_years: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_fall_back_to_base_territory() {
        let mut scenario = Scenario::with_horizon(2030, 2035);
        let mut base = TerritoryScenario::neutral(TerritoryId::new("200000001"));
        base.is_base = true;
        base.long_term_vacancy_target = 0.04;
        scenario.territory_overrides.push(base);
        scenario
            .territory_overrides
            .push(TerritoryScenario::neutral(TerritoryId::new("200000002")));

        let own = scenario.overrides_for(&TerritoryId::new("200000002")).unwrap();
        assert_eq!(own.territory, TerritoryId::new("200000002"));

        let fallback = scenario.overrides_for(&TerritoryId::new("200000099")).unwrap();
        assert!(fallback.is_base);
        assert_eq!(fallback.long_term_vacancy_target, 0.04);
    }

    #[test]
    fn scenario_round_trips_through_serde() {
        let mut scenario = Scenario::with_horizon(2030, 2041);
        scenario.financial.effort_threshold = EffortRateThreshold::Over30;
        scenario.hosted.establishment_kinds = vec![EstablishmentKind::EmergencyShelter];

        let json = serde_json::to_string(&scenario).unwrap();
        let back: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scenario);
    }

    #[test]
    fn horizon_years_measured_from_base_year() {
        let scenario = Scenario::with_horizon(2030, 2041);
        assert_eq!(scenario.resorption_horizon_years(2021), 20);
        assert_eq!(scenario.resorption_horizon_years(2041), 0);
    }
}
