use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Role of a node in the traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Normal,
    /// Shown but not expanded
    Stop,
    /// Reached through a `defined_for` condition
    ConditionalScope,
}

impl NodeKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Normal => "normal",
            Self::Stop => "stop",
            Self::ConditionalScope => "conditional_scope",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why `from` feeds into `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Formula,
    Adds,
    Subtracts,
    ConditionalScope,
    /// Not emitted by the builder; parameters attach to nodes as summaries
    Parameter,
}

impl EdgeKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Formula => "formula",
            Self::Adds => "adds",
            Self::Subtracts => "subtracts",
            Self::ConditionalScope => "conditional_scope",
            Self::Parameter => "parameter",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A formatted parameter attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSummary {
    pub label: String,
    pub path: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    /// Distance from the root at first visit
    pub depth: usize,
    pub kind: NodeKind,
    pub title: String,
    #[serde(default)]
    pub parameter_summaries: Vec<ParameterSummary>,
}

/// `from` is the dependency, `to` the variable that reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Result of one build; immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(skip)]
    pub(crate) root: String,
    pub(crate) nodes: Vec<GraphNode>,
    pub(crate) edges: Vec<GraphEdge>,
}

/// Node and edge counts per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub nodes_by_kind: BTreeMap<NodeKind, usize>,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
    pub max_depth: usize,
}

/// One hop of a dependency chain; `via` is empty for the first step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<EdgeKind>,
}
