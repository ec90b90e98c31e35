//! # Policy Extractor
//!
//! Static extraction of policy variable definitions. Definition units are parsed with
//! tree-sitter and read, never executed.
//!
//! ## Features
//!
//! - **Metadata** - label, description, unit, entity, value type, period, references
//! - **Formula reads** - entity calls (`tax_unit("agi", period)`) and explicit lookups
//! - **Parameter usage** - alias tracing from `parameters(period)` into dotted paths
//! - **Combinators** - `add`/`aggr`/`subtract` over literal, named or comprehension lists
//!
//! ## Architecture
//!
//! ```text
//! variables/**/*.py
//!     │
//!     ├──> DefinitionExtractor (one unit -> Option<VariableRecord>)
//!     │      ├─ Module scan (list constants, enums, classes)
//!     │      ├─ Class fields (label, adds, defined_for, ...)
//!     │      ├─ FormulaWalker (variable reads, parameter chains, combinators)
//!     │      └─ Parameter-map consolidation
//!     │
//!     └──> VariableCorpus (identity -> record, search, load stats)
//! ```

mod consolidate;
mod corpus;
mod entity;
mod error;
mod extractor;
mod formula;
mod record;
mod syntax;

pub use corpus::{
    LoadStats, VariableCorpus, VariableSummary, DEFAULT_SEARCH_LIMIT, MIN_SEARCH_QUERY_LEN,
};
pub use entity::ScopeEntity;
pub use error::{ExtractError, Result};
pub use extractor::{DefinitionExtractor, ExtractorConfig, DEFAULT_BASE_TYPES};
pub use record::{DependencyList, VariableRecord};
