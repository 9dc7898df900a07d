use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Calendar year. Signed so that anchor arithmetic (`base_year - 1`) never
/// wraps.
pub type Year = i32;

/// Administrative territory identifier (EPCI code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerritoryId(pub String);

impl TerritoryId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl fmt::Display for TerritoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Administrative region code, the key of the coefficient and ratio tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionCode(pub String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Rounding discipline
// ============================================================================

/// Round to 10 decimal digits. Annualized rates are shared between callers
/// and must not drift, so they are pinned before reuse.
pub fn round10(x: f64) -> f64 {
    (x * 1e10).round() / 1e10
}

/// Round to the nearest whole housing unit.
pub fn round_unit(x: f64) -> f64 {
    x.round()
}

// ============================================================================
// YearlySeries - the common currency of the flow engine
// ============================================================================

/// Ordered year-indexed values. Series used together in one computation must
/// share the same contiguous year domain; a gap is a caller defect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlySeries {
    data: BTreeMap<Year, f64>,
}

impl YearlySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a contiguous series over `[start, end]` from a per-year closure.
    pub fn from_fn(start: Year, end: Year, mut f: impl FnMut(Year) -> f64) -> Self {
        let mut series = Self::new();
        for year in start..=end {
            series.insert(year, f(year));
        }
        series
    }

    pub fn insert(&mut self, year: Year, value: f64) {
        self.data.insert(year, value);
    }

    pub fn get(&self, year: Year) -> Option<f64> {
        self.data.get(&year).copied()
    }

    pub fn first_year(&self) -> Option<Year> {
        self.data.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<Year> {
        self.data.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = (Year, f64)> + '_ {
        self.data.iter().map(|(&y, &v)| (y, v))
    }

    /// True when every year between the first and last is present.
    pub fn is_contiguous(&self) -> bool {
        match (self.first_year(), self.last_year()) {
            (Some(first), Some(last)) => self.len() as i64 == (last - first) as i64 + 1,
            _ => true,
        }
    }

    /// Sum over the inclusive window `[start, end]`. Years outside the series
    /// contribute nothing; an inverted window sums to zero.
    pub fn sum_over(&self, start: Year, end: Year) -> f64 {
        if start > end {
            return 0.0;
        }
        self.data
            .range(start..=end)
            .map(|(_, &v)| v)
            .sum()
    }

    /// Copy of the series truncated to years `<= upto`.
    pub fn truncated(&self, upto: Year) -> Self {
        Self {
            data: self.data.range(..=upto).map(|(&y, &v)| (y, v)).collect(),
        }
    }
}

impl FromIterator<(Year, f64)> for YearlySeries {
    fn from_iter<I: IntoIterator<Item = (Year, f64)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}
