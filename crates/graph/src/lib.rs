//! # Policy Graph
//!
//! Dependency graphs of calculation variables, rooted at one variable.
//!
//! ## Features
//!
//! - **Depth-first build** - visited set checked before the depth cutoff, cycles terminate
//! - **Stop variables** - shown as terminal nodes, never expanded
//! - **Conditional scopes** - `defined_for` conditions become their own node kind
//! - **Parameter summaries** - formatted values attached to nodes, never as edges
//! - **Queries** - per-kind stats, petgraph conversion, shortest dependency chain
//!
//! ## Architecture
//!
//! ```text
//! VariableCorpus + ParameterSource + GraphConfig
//!     │
//!     ├──> GraphBuilder::build(root)
//!     │      ├─ defined_for    -> ConditionalScope edges
//!     │      ├─ formula refs   -> Formula edges
//!     │      ├─ adds/subtracts -> Adds / Subtracts edges
//!     │      └─ parameters     -> node summaries
//!     │
//!     └──> DependencyGraph { nodes, edges }
//!            ├─ edges run dependency -> dependent
//!            ├─ stats() / trace(from, to)
//!            └─ render_tree() for terminals
//! ```

mod builder;
mod config;
mod error;
mod graph;
mod render;
mod types;

pub use builder::GraphBuilder;
pub use config::{
    GraphConfig, GraphRequest, DEFAULT_MAX_DEPTH, DEFAULT_STOP_VARIABLES, MAX_DEPTH_LIMIT,
};
pub use error::{GraphError, Result};
pub use graph::PetGraph;
pub use render::render_tree;
pub use types::{
    DependencyGraph, EdgeKind, GraphEdge, GraphNode, GraphStats, NodeKind, ParameterSummary,
    TraceStep,
};
