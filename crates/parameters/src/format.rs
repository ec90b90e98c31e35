//! Human-readable rendering of parameter values.
//!
//! Dispatch is on [`ParameterStructureKind`]; each kind has its own renderer and formatting never
//! fails: a missing record renders [`PARAMETER_NOT_FOUND`].

use crate::classify::{classify, ParameterStructureKind};
use crate::latest::{latest_value, resolve_scalar, terminal_series};
use crate::record::ParameterRecord;
use crate::value::ParamValue;
use crate::vocab::{is_state_code, label_case, state_prefix, FILING_STATUSES, HOUSING_TYPES};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

pub const PARAMETER_NOT_FOUND: &str = "Parameter not found";
pub const NO_VALUE: &str = "No value in effect";

/// Items listed by a Summary list rendering before the overflow line.
pub const LIST_SUMMARY_ITEMS: usize = 10;
/// Entries shown by Summary renderings of keyed tables.
pub const TABLE_SUMMARY_ENTRIES: usize = 3;
/// Entries shown by Full renderings of numeric tables.
pub const TABLE_FULL_ENTRIES: usize = 10;
/// Income levels sampled per housing type in Full housing renderings.
pub const HOUSING_SAMPLE_LEVELS: usize = 2;

/// How much of a parameter to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DetailLevel {
    Minimal,
    #[default]
    Summary,
    Full,
}

impl DetailLevel {
    /// Case-insensitive; anything unrecognised is `Summary`.
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "minimal" => Self::Minimal,
            "full" => Self::Full,
            _ => Self::Summary,
        }
    }
}

impl FromStr for DetailLevel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl From<String> for DetailLevel {
    fn from(name: String) -> Self {
        Self::parse_lenient(&name)
    }
}

/// Rendering inputs besides the record itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    pub detail: DetailLevel,
    /// Identity of the variable the parameter is shown for (`ca_eitc` selects `CA`)
    pub context: Option<String>,
    /// Reference date for series resolution; latest entry when unset
    pub as_of: Option<NaiveDate>,
}

impl FormatOptions {
    #[must_use]
    pub fn new(detail: DetailLevel) -> Self {
        Self {
            detail,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub const fn with_as_of(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }
}

/// Render a parameter for display.
#[must_use]
pub fn format_parameter(record: Option<&ParameterRecord>, options: &FormatOptions) -> String {
    let Some(record) = record else {
        return PARAMETER_NOT_FOUND.to_string();
    };
    let renderer = Renderer { record, options };

    let kind = classify(record);
    match kind {
        ParameterStructureKind::Simple => renderer.simple(),
        ParameterStructureKind::List => renderer.list(),
        ParameterStructureKind::Category => renderer.category(),
        ParameterStructureKind::State => renderer.state(),
        ParameterStructureKind::Breakdown => renderer.breakdown(),
        ParameterStructureKind::HousingBrackets => renderer.housing(),
        ParameterStructureKind::NumericIndex | ParameterStructureKind::Brackets => {
            renderer.table(kind)
        }
        ParameterStructureKind::Unknown => format!("Unrecognized parameter structure ({kind})"),
    }
}

struct Renderer<'a> {
    record: &'a ParameterRecord,
    options: &'a FormatOptions,
}

impl Renderer<'_> {
    fn unit(&self) -> Option<&str> {
        self.record.unit()
    }

    fn value_text(&self, value: &ParamValue) -> String {
        render_value(value, self.unit())
    }

    fn scalar_text(&self, value: &ParamValue) -> Option<String> {
        resolve_scalar(value, self.options.as_of).map(|scalar| self.value_text(scalar))
    }

    /// Numeric leaves of every data entry, resolved at the reference date.
    fn entry_numbers<'v>(&self, entries: impl Iterator<Item = &'v ParamValue>) -> Vec<f64> {
        let mut numbers = Vec::new();
        for entry in entries {
            collect_numbers(entry, self.options.as_of, &mut numbers);
        }
        numbers
    }

    fn range_text(&self, numbers: &[f64]) -> Option<String> {
        let (min, max) = min_max(numbers)?;
        Some(format!(
            "{} - {}",
            render_number(min, self.unit()),
            render_number(max, self.unit())
        ))
    }

    fn simple(&self) -> String {
        let Some(series) = terminal_series(self.record) else {
            return NO_VALUE.to_string();
        };
        let Some(latest) = latest_value(series, self.options.as_of) else {
            return NO_VALUE.to_string();
        };

        let text = match latest.value {
            ParamValue::Map(_) => self
                .scalar_text(latest.value)
                .unwrap_or_else(|| NO_VALUE.to_string()),
            scalar => self.value_text(scalar),
        };
        match (self.options.detail, latest.since) {
            (DetailLevel::Full, Some(since)) => format!("{text} (since {since})"),
            _ => text,
        }
    }

    fn list(&self) -> String {
        let items = terminal_series(self.record)
            .and_then(|series| latest_value(series, self.options.as_of))
            .and_then(|latest| latest.value.as_list())
            .map(|items| items.iter().map(item_text).collect::<Vec<_>>())
            .unwrap_or_default();

        if items.is_empty() {
            return "Empty list".to_string();
        }

        match self.options.detail {
            DetailLevel::Minimal => format!("{} items", items.len()),
            DetailLevel::Summary => {
                let mut lines: Vec<String> = items
                    .iter()
                    .take(LIST_SUMMARY_ITEMS)
                    .map(|item| format!("  - {item}"))
                    .collect();
                if items.len() > LIST_SUMMARY_ITEMS {
                    lines.push(format!("  ... and {} more", items.len() - LIST_SUMMARY_ITEMS));
                }
                lines.join("\n")
            }
            DetailLevel::Full => {
                let enum_like = items.iter().all(|item| is_enum_like(item));
                let mut lines = vec![format!("({} items):", items.len())];
                lines.extend(items.iter().map(|item| {
                    let shown = if enum_like { label_case(item) } else { item.clone() };
                    format!("  • {shown}")
                }));
                lines.join("\n")
            }
        }
    }

    fn category(&self) -> String {
        let parts: Vec<String> = FILING_STATUSES
            .iter()
            .filter_map(|status| {
                let value = self.record.entry(status)?;
                let text = self.scalar_text(value)?;
                Some(format!("{}: {text}", label_case(status)))
            })
            .collect();
        self.join_entries(parts, " | ")
    }

    fn state(&self) -> String {
        if let Some(code) = self.options.context.as_deref().and_then(state_prefix) {
            if let Some(text) = self.record.entry(&code).and_then(|v| self.scalar_text(v)) {
                return format!("{text} ({code})");
            }
        }

        let states = self
            .record
            .data_entries()
            .filter(|(key, _)| is_state_code(key))
            .map(|(_, value)| value);
        let numbers = self.entry_numbers(states);
        match self.range_text(&numbers) {
            Some(range) => format!("{range} (varies by state)"),
            None => NO_VALUE.to_string(),
        }
    }

    fn breakdown(&self) -> String {
        let parts: Vec<String> = self
            .record
            .data_entries()
            .filter_map(|(key, value)| {
                let text = self.scalar_text(value)?;
                Some(format!("{}: {text}", label_case(key)))
            })
            .collect();
        let shown = match self.options.detail {
            DetailLevel::Minimal => 1,
            DetailLevel::Summary => TABLE_SUMMARY_ENTRIES,
            DetailLevel::Full => parts.len(),
        };
        let truncated = parts.len() > shown;
        let mut parts: Vec<String> = parts.into_iter().take(shown).collect();
        if truncated && self.options.detail == DetailLevel::Summary {
            parts.push("...".to_string());
        }
        if parts.is_empty() {
            return NO_VALUE.to_string();
        }
        parts.join(" | ")
    }

    fn housing(&self) -> String {
        let housing: Vec<(&str, &ParamValue)> = HOUSING_TYPES
            .iter()
            .filter_map(|kind| self.record.entry(kind).map(|value| (*kind, value)))
            .collect();
        let numbers = self.entry_numbers(housing.iter().map(|(_, value)| *value));
        let Some(range) = self.range_text(&numbers) else {
            return "No values available".to_string();
        };

        if self.options.detail != DetailLevel::Full {
            return format!("Range: {range}");
        }

        let mut lines = Vec::new();
        for (kind, value) in housing {
            lines.push(format!("{}:", label_case(kind)));
            let Some(levels) = value.as_map() else {
                continue;
            };
            let mut level_keys: Vec<&String> = levels.keys().collect();
            level_keys.sort_by(|a, b| natural_cmp(a, b));
            for level in level_keys.into_iter().take(HOUSING_SAMPLE_LEVELS) {
                let level_numbers = self.entry_numbers(std::iter::once(&levels[level]));
                if let Some(level_range) = self.range_text(&level_numbers) {
                    lines.push(format!("  • Income Level {level}: {level_range}"));
                }
            }
        }
        lines.push(format!("Overall Range: {range}"));
        lines.join("\n")
    }

    fn table(&self, kind: ParameterStructureKind) -> String {
        if !self.record.metadata.breakdown.is_empty() {
            let numbers = self.entry_numbers(self.record.data_entries().map(|(_, value)| value));
            if let Some(range) = self.range_text(&numbers) {
                return format!("Range: {range}");
            }
        }

        let mut rows = if kind == ParameterStructureKind::Brackets {
            self.bracket_rows()
        } else {
            self.numeric_rows()
        };

        let (limit, ellipsis) = match self.options.detail {
            DetailLevel::Minimal => (1, false),
            DetailLevel::Summary => (TABLE_SUMMARY_ENTRIES, true),
            DetailLevel::Full => (TABLE_FULL_ENTRIES, false),
        };
        let truncated = rows.len() > limit;
        rows.truncate(limit);
        if truncated && ellipsis {
            rows.push("...".to_string());
        }
        if rows.is_empty() {
            return NO_VALUE.to_string();
        }
        rows.join(" | ")
    }

    fn numeric_rows(&self) -> Vec<String> {
        let mut entries: Vec<(&str, &ParamValue)> = self
            .record
            .data_entries()
            .filter(|(key, _)| !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| natural_cmp(a, b));
        entries
            .into_iter()
            .filter_map(|(key, value)| Some(format!("{key}: {}", self.scalar_text(value)?)))
            .collect()
    }

    /// `threshold: rate` rows from bracket lists (`brackets: [{threshold, rate|amount}]`).
    fn bracket_rows(&self) -> Vec<String> {
        let metadata = &self.record.metadata;
        let threshold_unit = metadata.threshold_unit.as_deref().or(self.unit());

        let mut rows = Vec::new();
        for (_, value) in self
            .record
            .data_entries()
            .filter(|(key, _)| key.to_lowercase().contains("bracket"))
        {
            let brackets = value.as_list().map(Vec::as_slice).unwrap_or_default();
            for bracket in brackets {
                let threshold = bracket
                    .get("threshold")
                    .and_then(|t| resolve_scalar(t, self.options.as_of))
                    .map(|t| render_value(t, threshold_unit));
                let (amount, unit) = match bracket.get("rate") {
                    Some(rate) => (Some(rate), metadata.rate_unit.as_deref().or(Some("/1"))),
                    None => (bracket.get("amount"), metadata.amount_unit.as_deref()),
                };
                let amount = amount
                    .and_then(|a| resolve_scalar(a, self.options.as_of))
                    .map(|a| render_value(a, unit));
                if let (Some(threshold), Some(amount)) = (threshold, amount) {
                    rows.push(format!("{threshold}: {amount}"));
                }
            }
        }
        rows
    }

    fn join_entries(&self, parts: Vec<String>, separator: &str) -> String {
        if parts.is_empty() {
            return NO_VALUE.to_string();
        }
        match self.options.detail {
            DetailLevel::Minimal => parts.into_iter().next().unwrap_or_default(),
            DetailLevel::Summary => parts.join(separator),
            DetailLevel::Full => parts.join("\n"),
        }
    }
}

fn collect_numbers(value: &ParamValue, as_of: Option<NaiveDate>, out: &mut Vec<f64>) {
    let Some(latest) = latest_value(value, as_of) else {
        return;
    };
    match latest.value {
        ParamValue::Map(map) => {
            for (key, entry) in map {
                if !crate::record::RESERVED_KEYS.contains(&key.as_str()) || key == "values" {
                    collect_numbers(entry, as_of, out);
                }
            }
        }
        ParamValue::List(items) => {
            for item in items {
                collect_numbers(item, as_of, out);
            }
        }
        scalar => {
            if let Some(number) = scalar.as_f64() {
                out.push(number);
            }
        }
    }
}

fn min_max(numbers: &[f64]) -> Option<(f64, f64)> {
    numbers.iter().fold(None, |acc, &n| match acc {
        None => Some((n, n)),
        Some((min, max)) => Some((min.min(n), max.max(n))),
    })
}

/// Numeric keys compare as numbers, then everything else as text.
fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn is_enum_like(item: &str) -> bool {
    item.chars().any(|c| c.is_ascii_uppercase()) && !item.chars().any(|c| c.is_ascii_lowercase())
}

fn item_text(item: &ParamValue) -> String {
    match item {
        ParamValue::Text(text) => text.clone(),
        other => render_value(other, None),
    }
}

/// Render a scalar with its unit.
#[must_use]
pub fn render_value(value: &ParamValue, unit: Option<&str>) -> String {
    match value {
        ParamValue::Null => "n/a".to_string(),
        ParamValue::Bool(flag) => flag.to_string(),
        ParamValue::Text(text) => text.clone(),
        ParamValue::Int(_) | ParamValue::Float(_) => {
            render_number(value.as_f64().unwrap_or_default(), unit)
        }
        ParamValue::List(items) => items.iter().map(item_text).collect::<Vec<_>>().join(", "),
        ParamValue::Map(map) => format!("{} entries", map.len()),
    }
}

/// Render a number: currency units get a symbol and thousands grouping, `/1` is a percentage.
#[must_use]
pub fn render_number(number: f64, unit: Option<&str>) -> String {
    match unit.map(str::trim) {
        Some("currency-USD" | "USD") => currency("$", number),
        Some("currency-GBP" | "GBP") => currency("£", number),
        Some("/1") => {
            let percent = number * 100.0;
            if number.abs() < 1.0 {
                format!("{percent:.1}%")
            } else {
                format!("{percent:.0}%")
            }
        }
        _ => plain_number(number),
    }
}

fn currency(symbol: &str, number: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = number.round() as i64;
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}{symbol}{}", group_thousands(rounded.unsigned_abs()))
}

fn plain_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = number as i64;
        whole.to_string()
    } else {
        number.to_string()
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
