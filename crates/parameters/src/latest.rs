//! Time-series resolution.

use crate::record::ParameterRecord;
use crate::value::ParamValue;
use chrono::{NaiveDate, NaiveDateTime};

/// Parse a series key: `YYYY-MM-DD` or a date-time whose date part is used.
#[must_use]
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let key = key.trim();
    if let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(key, format).ok())
        .map(|datetime| datetime.date())
}

/// True for a non-empty map whose every key is a date.
#[must_use]
pub fn is_date_series(value: &ParamValue) -> bool {
    value
        .as_map()
        .is_some_and(|map| !map.is_empty() && map.keys().all(|key| parse_date_key(key).is_some()))
}

/// A resolved series entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Latest<'a> {
    /// Date the value took effect; `None` when the input was not a series.
    pub since: Option<NaiveDate>,
    pub value: &'a ParamValue,
}

/// Value in effect at `as_of` (default: the most recent entry).
///
/// Non-series input is returned unchanged. A selected `{value: x}` entry unwraps to `x`.
/// `None` when every dated entry is after `as_of`.
#[must_use]
pub fn latest_value(value: &ParamValue, as_of: Option<NaiveDate>) -> Option<Latest<'_>> {
    let Some(map) = value.as_map() else {
        return Some(Latest { since: None, value });
    };

    let mut dated: Vec<(NaiveDate, &ParamValue)> = map
        .iter()
        .filter_map(|(key, entry)| parse_date_key(key).map(|date| (date, entry)))
        .collect();
    if dated.is_empty() {
        return Some(Latest { since: None, value });
    }
    dated.sort_by_key(|(date, _)| *date);

    let (since, entry) = dated
        .into_iter()
        .rev()
        .find(|(date, _)| as_of.map_or(true, |limit| *date <= limit))?;

    let entry = match entry.get("value") {
        Some(inner) => inner,
        None => entry,
    };
    Some(Latest {
        since: Some(since),
        value: entry,
    })
}

/// The terminal series of a record, if it is one: a `values:` block with no sibling data
/// keys, a bare date-keyed map, or a scalar.
#[must_use]
pub fn terminal_series(record: &ParameterRecord) -> Option<&ParamValue> {
    let has_data = record.data_entries().next().is_some();
    match record.data.get("values") {
        Some(values) if !has_data => Some(values),
        Some(_) => None,
        None if is_date_series(&record.data) => Some(&record.data),
        None if !record.data.is_map() => Some(&record.data),
        None => None,
    }
}

/// Latest scalar reachable from `value`: series are resolved, `values:` blocks are followed,
/// and in other maps the `CONTIGUOUS_US` entry wins, else the first entry.
#[must_use]
pub fn resolve_scalar(value: &ParamValue, as_of: Option<NaiveDate>) -> Option<&ParamValue> {
    let resolved = latest_value(value, as_of)?.value;
    match resolved {
        ParamValue::Map(map) => {
            let next = map
                .get("values")
                .or_else(|| map.get(crate::vocab::CONTIGUOUS_US))
                .or_else(|| {
                    map.iter()
                        .find(|(key, _)| !crate::record::RESERVED_KEYS.contains(&key.as_str()))
                        .map(|(_, entry)| entry)
                })?;
            resolve_scalar(next, as_of)
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn series(yaml: &str) -> ParamValue {
        ParamValue::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn picks_most_recent_by_default() {
        let value = series("2023-01-01: 150\n2020-01-01: 100\n");
        let latest = latest_value(&value, None).unwrap();
        assert_eq!(latest.value, &ParamValue::Int(150));
        assert_eq!(latest.since, NaiveDate::from_ymd_opt(2023, 1, 1));
    }

    #[test]
    fn respects_reference_date() {
        let value = series("2020-01-01: 100\n2023-01-01: 150\n");
        let as_of = NaiveDate::from_ymd_opt(2021, 6, 1);
        assert_eq!(
            latest_value(&value, as_of).unwrap().value,
            &ParamValue::Int(100)
        );
        assert!(latest_value(&value, NaiveDate::from_ymd_opt(2019, 1, 1)).is_none());
    }

    #[test]
    fn unwraps_value_entries_and_datetime_keys() {
        let value = series("2021-01-01T00:00:00:\n  value: 7\n  reference: x\n");
        assert_eq!(latest_value(&value, None).unwrap().value, &ParamValue::Int(7));
    }

    #[test]
    fn non_series_maps_pass_through() {
        let value = series("SINGLE: 1\nJOINT: 2\n");
        let latest = latest_value(&value, None).unwrap();
        assert_eq!(latest.value, &value);
        assert_eq!(latest.since, None);
    }

    #[test]
    fn scalar_resolution_prefers_contiguous_us() {
        let value = series("AK:\n  2024-01-01: 2\nCONTIGUOUS_US:\n  2024-01-01: 1\n");
        assert_eq!(resolve_scalar(&value, None), Some(&ParamValue::Int(1)));
    }
}
