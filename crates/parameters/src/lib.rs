//! # Policy Parameters
//!
//! Loading, classifying and rendering hierarchical policy parameters.
//!
//! ## Features
//!
//! - **Dotted-path store** - `gov.irs.credits.eitc.max` maps to YAML files, with nested-key fallback
//! - **Read-through cache** - bounded LRU shared by every lookup
//! - **Structure classifier** - nine closed shape kinds, first match wins
//! - **Formatter** - Minimal / Summary / Full renderings per kind
//!
//! ## Architecture
//!
//! ```text
//! parameters/**/*.yaml
//!     │
//!     ├──> ParameterStore (ParameterSource)
//!     │      ├─ a.b.c -> a/b/c.yaml | a/b.yaml[c]
//!     │      └─ LRU cache (hits and misses)
//!     │
//!     ├──> classify(record) -> ParameterStructureKind
//!     │
//!     └──> format_parameter(record, options) -> String
//!            ├─ latest value at reference date
//!            └─ per-kind renderer
//! ```

mod classify;
mod detail;
mod error;
mod format;
mod latest;
mod record;
mod store;
mod value;
pub mod vocab;

pub use classify::{classify, ParameterStructureKind};
pub use detail::{describe, ParameterDetail};
pub use error::{ParameterError, Result};
pub use format::{
    format_parameter, render_number, render_value, DetailLevel, FormatOptions, NO_VALUE,
    PARAMETER_NOT_FOUND,
};
pub use latest::{is_date_series, latest_value, parse_date_key, resolve_scalar, terminal_series, Latest};
pub use record::{ParameterMetadata, ParameterRecord, RESERVED_KEYS};
pub use store::{
    resolve_sourced_list, InMemoryParameters, ParameterSource, ParameterStore,
    DEFAULT_CACHE_CAPACITY,
};
pub use value::ParamValue;
