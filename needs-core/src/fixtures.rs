//! Shared in-memory datasets for the engine tests.

use crate::data::{MemoryDataset, StockRow, VacancyKind};
use crate::scenario::DemographicVariant;
use crate::types::{TerritoryId, Year, YearlySeries};

/// Zero vacancy and secondary-residence evolution over `[start, end]`.
pub(crate) fn zero_rate_series(
    data: &mut MemoryDataset,
    territory: &TerritoryId,
    start: Year,
    end: Year,
) {
    let zeros = YearlySeries::from_fn(start, end, |_| 0.0);
    data.set_vacancy(territory, VacancyKind::Combined, zeros.clone());
    data.set_vacancy(territory, VacancyKind::ShortTerm, zeros.clone());
    data.set_vacancy(territory, VacancyKind::LongTerm, zeros.clone());
    data.set_secondary(territory, zeros);
}

/// A single territory with 10,000 units of stock, flat demographic growth of
/// +100 households per year from 2020 through 2050, zero turnover, zero
/// vacancy and secondary-residence rates, and no inadequacy rows. Under this
/// dataset the flow simulation is a pure demographic pass-through.
pub(crate) fn pass_through_dataset(territory: &TerritoryId) -> MemoryDataset {
    let mut data = MemoryDataset::new();
    data.set_stock(
        territory,
        StockRow {
            total_stock: 10_000.0,
            occupancy_rate: 0.90,
            vacancy_rate: 0.0,
            secondary_residence_rate: 0.0,
            disappearance_rate: 0.0,
            restructuring_rate: 0.0,
        },
    );
    for year in 2020..=2050 {
        data.set_projection(
            territory,
            DemographicVariant::Central,
            year,
            1_000.0 + 100.0 * (year - 2020) as f64,
        );
    }
    zero_rate_series(&mut data, territory, 2021, 2050);
    data
}
