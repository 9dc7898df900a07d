//! Hosted situations: households accommodated by third parties or in
//! establishments, summed over the scenario-selected establishment types.

use crate::data::InadequacySource;
use crate::scenario::{HostedConfig, Territory};
use crate::stock_needs::{CategoryResults, TerritoryNeed, apply_reallocation};
use crate::types::TerritoryId;

pub struct HostedCalculator<'a, S: InadequacySource + ?Sized> {
    source: &'a S,
    config: &'a HostedConfig,
}

impl<'a, S: InadequacySource + ?Sized> HostedCalculator<'a, S> {
    pub fn new(source: &'a S, config: &'a HostedConfig) -> Self {
        Self { source, config }
    }

    /// Sum over the selected establishment kinds; sparse kinds count zero.
    pub fn raw(&self, territory: &TerritoryId) -> f64 {
        self.config
            .establishment_kinds
            .iter()
            .map(|&kind| self.source.hosted_count(territory, kind).unwrap_or(0.0))
            .sum()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryDataset;
    use crate::scenario::EstablishmentKind;

    #[test]
    fn only_selected_establishment_kinds_count() {
        let t = TerritoryId::new("200000001");
        let mut data = MemoryDataset::new();
        data.set_hosted(&t, EstablishmentKind::EmergencyShelter, 80.0);
        data.set_hosted(&t, EstablishmentKind::SocialHotel, 40.0);
        data.set_hosted(&t, EstablishmentKind::YoungWorkerHostel, 25.0);

        let config = HostedConfig {
            establishment_kinds: vec![
                EstablishmentKind::EmergencyShelter,
                EstablishmentKind::SocialHotel,
            ],
            reallocation_pct: 0.0,
        };
        let calc = HostedCalculator::new(&data, &config);
        assert_eq!(calc.compute_by_territory(&t), 120.0);
    }

    #[test]
    fn missing_kinds_are_zero_not_errors() {
        let t = TerritoryId::new("200000001");
        let mut data = MemoryDataset::new();
        data.set_hosted(&t, EstablishmentKind::EmergencyShelter, 80.0);

        let config = HostedConfig::default();
        let calc = HostedCalculator::new(&data, &config);
        assert_eq!(calc.compute_by_territory(&t), 80.0);
    }
}
