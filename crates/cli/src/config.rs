use crate::command::domain::InputError;
use anyhow::{Context, Result};
use policy_extractor::ExtractorConfig;
use policy_graph::GraphRequest;
use policy_parameters::DEFAULT_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "policy-graph.toml";

/// Contents of `policy-graph.toml`; every section is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory of variable definition files
    pub variables: Option<PathBuf>,
    /// Parameter roots, searched in order
    pub parameters: Vec<PathBuf>,
    pub cache_capacity: usize,
    pub extractor: ExtractorConfig,
    pub graph: GraphDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            variables: None,
            parameters: Vec::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            extractor: ExtractorConfig::default(),
            graph: GraphDefaults::default(),
        }
    }
}

/// `[graph]` table, snake_case like the rest of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphDefaults {
    pub max_depth: Option<i64>,
    pub stop_variables: Vec<String>,
    pub expand_adds_subtracts: Option<bool>,
    pub show_parameters: Option<bool>,
    pub parameter_detail: Option<String>,
    pub parameter_suppress: Vec<String>,
    pub parameter_date: Option<String>,
}

impl GraphDefaults {
    pub fn to_request(&self) -> GraphRequest {
        GraphRequest {
            max_depth: self.max_depth,
            stop_variables: self.stop_variables.clone(),
            expand_adds_subtracts: self.expand_adds_subtracts,
            show_parameters: self.show_parameters,
            parameter_detail: self.parameter_detail.clone(),
            parameter_suppress: self.parameter_suppress.clone(),
            parameter_date: self.parameter_date.clone(),
        }
    }
}

impl AppConfig {
    /// Read an explicit config file, or `policy-graph.toml` in the working directory if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(InputError::MissingConfig(path.display().to_string()).into());
            }
            Some(path) => path.to_path_buf(),
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if !local.is_file() {
                    log::debug!("No {CONFIG_FILE_NAME} found, using defaults");
                    return Ok(Self::default());
                }
                local
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| InputError::Payload(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn parses_all_sections() {
        let config = AppConfig::from_toml(
            r#"
variables = "policyengine_us/variables"
parameters = ["policyengine_us/parameters"]
cache_capacity = 64

[extractor]
consolidation_threshold = 6

[graph]
max_depth = 4
stop_variables = ["age"]
parameter_detail = "full"
"#,
        )
        .unwrap();

        assert_eq!(
            config.variables.as_deref(),
            Some(Path::new("policyengine_us/variables"))
        );
        assert_eq!(config.parameters.len(), 1);
        assert_eq!(config.cache_capacity, 64);
        assert_eq!(config.extractor.consolidation_threshold, 6);

        let request = config.graph.to_request();
        assert_eq!(request.max_depth, Some(4));
        assert_eq!(request.stop_variables, vec!["age".to_string()]);
        assert_eq!(request.parameter_detail.as_deref(), Some("full"));
    }

    #[test]
    fn unknown_explicit_file_is_an_input_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.downcast_ref::<InputError>().is_some());
    }
}
