use crate::latest::{is_date_series, latest_value, terminal_series};
use crate::record::ParameterRecord;
use crate::value::ParamValue;
use crate::vocab::{is_filing_status, is_housing_type, is_state_code};
use serde::Serialize;
use std::fmt;

/// Shape of a parameter tree, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterStructureKind {
    /// One time series of scalars
    Simple,
    /// One time series whose values are sequences
    List,
    /// Keyed by filing status
    Category,
    /// Keyed by state or territory code
    State,
    /// Several dated sub-series, or declared breakdown dimensions
    Breakdown,
    /// Keyed by household size or another integer
    NumericIndex,
    /// Tax-style bracket schedule
    Brackets,
    /// Keyed by housing type
    HousingBrackets,
    Unknown,
}

impl ParameterStructureKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Simple => "Simple",
            Self::List => "List",
            Self::Category => "Category",
            Self::State => "State",
            Self::Breakdown => "Breakdown",
            Self::NumericIndex => "NumericIndex",
            Self::Brackets => "Brackets",
            Self::HousingBrackets => "HousingBrackets",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ParameterStructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a record; the first matching rule wins and every record gets a kind.
#[must_use]
pub fn classify(record: &ParameterRecord) -> ParameterStructureKind {
    if let Some(series) = terminal_series(record) {
        let latest = latest_value(series, None);
        return if latest.is_some_and(|latest| matches!(latest.value, ParamValue::List(_))) {
            ParameterStructureKind::List
        } else {
            ParameterStructureKind::Simple
        };
    }

    let entries: Vec<(&str, &ParamValue)> = record.data_entries().collect();
    let has_key = |test: fn(&str) -> bool| entries.iter().any(|(key, _)| test(key));

    if has_key(is_filing_status) {
        return ParameterStructureKind::Category;
    }
    if has_key(is_housing_type) {
        return ParameterStructureKind::HousingBrackets;
    }

    let state_keys = entries.iter().filter(|(key, _)| is_state_code(key)).count();
    if !entries.is_empty() && state_keys * 2 > entries.len() {
        return ParameterStructureKind::State;
    }

    if entries.len() >= 2 {
        let dated = entries
            .iter()
            .filter(|(_, value)| is_date_series(value))
            .count();
        if dated >= 2 || !record.metadata.breakdown.is_empty() {
            return ParameterStructureKind::Breakdown;
        }
    }

    if has_key(|key| !key.is_empty() && key.chars().all(|c| c.is_ascii_digit())) {
        return ParameterStructureKind::NumericIndex;
    }
    if has_key(|key| key.to_lowercase().contains("bracket")) {
        return ParameterStructureKind::Brackets;
    }

    ParameterStructureKind::Unknown
}
