use anyhow::Result;
use policy_extractor::ExtractError;
use policy_graph::{GraphError, GraphRequest};
use policy_parameters::ParameterError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandRequest {
    pub action: CommandAction,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

impl CommandRequest {
    pub fn new<T: Serialize>(action: CommandAction, payload: T) -> Result<Self> {
        Ok(Self {
            action,
            payload: serde_json::to_value(payload)?,
        })
    }
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Graph,
    Variable,
    Parameter,
    Search,
    List,
    Trace,
    Stats,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
    pub root: String,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(flatten)]
    pub options: GraphRequest,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VariablePayload {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterPayload {
    pub path: String,
    #[serde(default)]
    pub detail: Option<String>,
    /// Variable identity used for state selection
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchPayload {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracePayload {
    pub from: String,
    pub root: String,
    #[serde(flatten)]
    pub options: GraphRequest,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub meta: ResponseMeta,
    /// Plain-text rendering printed instead of the envelope
    #[serde(skip)]
    pub text: Option<String>,
}

impl CommandResponse {
    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }

    pub fn from_error(err: &anyhow::Error, started: Instant) -> Self {
        let message = format!("{err:#}");
        Self {
            status: CommandStatus::Error,
            hints: classify_error(err),
            message: Some(message),
            data: Value::Null,
            meta: ResponseMeta {
                duration_ms: Some(elapsed_ms(started)),
                ..ResponseMeta::default()
            },
            text: None,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Clone)]
pub struct Hint {
    #[serde(rename = "type")]
    pub kind: HintKind,
    pub text: String,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Info,
    Action,
    Warn,
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables_loaded: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_edges: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters_cached: Option<usize>,
}

pub struct CommandOutcome {
    pub data: Value,
    pub hints: Vec<Hint>,
    pub meta: ResponseMeta,
    pub text: Option<String>,
}

impl CommandOutcome {
    pub fn from_value<T: Serialize>(value: T) -> Result<Self> {
        Ok(Self {
            data: serde_json::to_value(value)?,
            hints: Vec::new(),
            meta: ResponseMeta::default(),
            text: None,
        })
    }
}

pub fn parse_payload<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| InputError::Payload(e.to_string()).into())
}

pub fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Problems with what the caller asked for, as opposed to failures while serving it.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("No variables directory configured")]
    MissingVariables,

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid request: {0}")]
    Payload(String),

    #[error("Config file not found: {0}")]
    MissingConfig(String),
}

/// Whether the error was caused by the request rather than the environment.
pub fn is_input_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if cause.is::<InputError>() {
            return true;
        }
        if let Some(graph) = cause.downcast_ref::<GraphError>() {
            return matches!(
                graph,
                GraphError::UnknownRoot(_) | GraphError::InvalidConfig(_)
            );
        }
        if let Some(parameter) = cause.downcast_ref::<ParameterError>() {
            return matches!(
                parameter,
                ParameterError::NotFound(_) | ParameterError::InvalidPath(_)
            );
        }
        matches!(
            cause.downcast_ref::<ExtractError>(),
            Some(ExtractError::CorpusNotFound(_))
        )
    })
}

pub fn classify_error(err: &anyhow::Error) -> Vec<Hint> {
    let mut hints = Vec::new();

    for cause in err.chain() {
        if let Some(GraphError::UnknownRoot(name)) = cause.downcast_ref::<GraphError>() {
            hints.push(Hint {
                kind: HintKind::Action,
                text: format!("Run `policy-graph search {name}` to find similar variables."),
            });
        }
        if let Some(InputError::UnknownVariable(name)) = cause.downcast_ref::<InputError>() {
            hints.push(Hint {
                kind: HintKind::Action,
                text: format!("Run `policy-graph search {name}` to find similar variables."),
            });
        }
        if let Some(InputError::MissingVariables) = cause.downcast_ref::<InputError>() {
            hints.push(Hint {
                kind: HintKind::Action,
                text: "Pass --variables <dir> or set `variables` in policy-graph.toml."
                    .to_string(),
            });
        }
        if let Some(ExtractError::CorpusNotFound(_)) = cause.downcast_ref::<ExtractError>() {
            hints.push(Hint {
                kind: HintKind::Warn,
                text: "Variables directory is missing; check --variables.".to_string(),
            });
        }
        if let Some(ParameterError::NotFound(_)) = cause.downcast_ref::<ParameterError>() {
            hints.push(Hint {
                kind: HintKind::Action,
                text: "Parameter paths are dotted and relative to a --parameters root."
                    .to_string(),
            });
        }
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn input_errors_are_found_through_context() {
        let err = Err::<(), _>(GraphError::UnknownRoot("snapp".into()))
            .context("Failed to build graph")
            .unwrap_err();
        assert!(is_input_error(&err));
        assert_eq!(classify_error(&err).len(), 1);

        let err = anyhow::anyhow!("disk on fire");
        assert!(!is_input_error(&err));
        assert!(classify_error(&err).is_empty());
    }

    #[test]
    fn graph_payload_flattens_options() {
        let payload: GraphPayload = parse_payload(serde_json::json!({
            "root": "eitc",
            "format": "text",
            "maxDepth": 2,
            "stopVariables": ["earned_income"]
        }))
        .unwrap();

        assert_eq!(payload.root, "eitc");
        assert_eq!(payload.format, OutputFormat::Text);
        assert_eq!(payload.options.max_depth, Some(2));
        assert_eq!(payload.options.stop_variables, vec!["earned_income".to_string()]);
    }

    #[test]
    fn missing_fields_are_input_errors() {
        let err = parse_payload::<VariablePayload>(serde_json::json!({})).unwrap_err();
        assert!(is_input_error(&err));
    }
}
