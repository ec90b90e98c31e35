use crate::error::{GraphError, Result};
use chrono::NaiveDate;
use policy_parameters::DetailLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Deepest traversal accepted from callers.
pub const MAX_DEPTH_LIMIT: usize = 100;

/// Demographic facts and raw inputs that are shown but never expanded.
pub const DEFAULT_STOP_VARIABLES: [&str; 14] = [
    "county_str",
    "state_group_str",
    "is_married",
    "is_child",
    "is_tax_unit_dependent",
    "is_tax_unit_head",
    "is_tax_unit_spouse",
    "monthly_age",
    "is_full_time_student",
    "tax_unit_married",
    "filing_status",
    "immigration_status",
    "employment_income",
    "self_employment_income",
];

/// Validated traversal settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    pub max_depth: usize,
    /// Identities rendered as terminal nodes
    pub stop_variables: BTreeSet<String>,
    pub expand_adds_subtracts: bool,
    pub show_parameters: bool,
    pub parameter_detail: DetailLevel,
    /// Identities whose parameters are not attached
    pub parameter_suppress: BTreeSet<String>,
    /// Reference date for parameter values; latest entry when unset
    pub parameter_date: Option<NaiveDate>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            stop_variables: default_stop_variables(),
            expand_adds_subtracts: true,
            show_parameters: true,
            parameter_detail: DetailLevel::default(),
            parameter_suppress: BTreeSet::new(),
            parameter_date: None,
        }
    }
}

impl GraphConfig {
    /// Reject settings that can't be traversed.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(GraphError::InvalidConfig(format!(
                "maxDepth {} exceeds the limit of {MAX_DEPTH_LIMIT}",
                self.max_depth
            )));
        }
        Ok(())
    }
}

fn default_stop_variables() -> BTreeSet<String> {
    DEFAULT_STOP_VARIABLES
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Raw graph settings as a caller sends them (JSON body, TOML section, CLI flags).
///
/// Every field is optional; `into_config` fills defaults and validates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphRequest {
    pub max_depth: Option<i64>,
    /// Merged with the default stop list
    pub stop_variables: Vec<String>,
    pub expand_adds_subtracts: Option<bool>,
    pub show_parameters: Option<bool>,
    pub parameter_detail: Option<String>,
    pub parameter_suppress: Vec<String>,
    /// `YYYY-MM-DD`
    pub parameter_date: Option<String>,
}

impl GraphRequest {
    pub fn into_config(self) -> Result<GraphConfig> {
        let defaults = GraphConfig::default();

        let max_depth = match self.max_depth {
            None => defaults.max_depth,
            Some(depth) if depth < 0 => {
                return Err(GraphError::InvalidConfig(format!(
                    "maxDepth must be non-negative, got {depth}"
                )));
            }
            Some(depth) => usize::try_from(depth).map_err(|_| {
                GraphError::InvalidConfig(format!("maxDepth {depth} is out of range"))
            })?,
        };

        let parameter_date = self
            .parameter_date
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                    GraphError::InvalidConfig(format!("parameterDate {raw:?} is not a date: {e}"))
                })
            })
            .transpose()?;

        let mut stop_variables = defaults.stop_variables;
        stop_variables.extend(
            self.stop_variables
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        );

        let config = GraphConfig {
            max_depth,
            stop_variables,
            expand_adds_subtracts: self
                .expand_adds_subtracts
                .unwrap_or(defaults.expand_adds_subtracts),
            show_parameters: self.show_parameters.unwrap_or(defaults.show_parameters),
            parameter_detail: self
                .parameter_detail
                .as_deref()
                .map_or(defaults.parameter_detail, DetailLevel::parse_lenient),
            parameter_suppress: self.parameter_suppress.into_iter().collect(),
            parameter_date,
        };
        config.validate()?;
        Ok(config)
    }
}
