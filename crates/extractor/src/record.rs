use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::path::PathBuf;

/// An `adds`/`subtracts` declaration.
///
/// Most variables list their components inline. Some instead name a parameter whose value is the
/// list (`adds = "gov.irs.gross_income.sources"`); that list is only known once the parameter is
/// loaded, so it stays a marker here and is resolved by the caller that owns a parameter source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DependencyList {
    Resolved(Vec<String>),
    ParameterSourced(String),
}

impl Default for DependencyList {
    fn default() -> Self {
        Self::Resolved(Vec::new())
    }
}

impl DependencyList {
    /// Identities known without loading any parameter.
    #[must_use]
    pub fn resolved(&self) -> &[String] {
        match self {
            Self::Resolved(items) => items,
            Self::ParameterSourced(_) => &[],
        }
    }

    #[must_use]
    pub fn parameter_path(&self) -> Option<&str> {
        match self {
            Self::Resolved(_) => None,
            Self::ParameterSourced(path) => Some(path),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Resolved(items) => items.is_empty(),
            Self::ParameterSourced(_) => false,
        }
    }

    /// Merge identities found in a formula body into this list.
    ///
    /// A parameter-sourced declaration keeps its marker; formula combinators cannot widen it.
    pub(crate) fn extend_resolved<I: IntoIterator<Item = String>>(&mut self, items: I) {
        if let Self::Resolved(existing) = self {
            for item in items {
                if !existing.contains(&item) {
                    existing.push(item);
                }
            }
        }
    }

    pub(crate) fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        if let Self::Resolved(items) = self {
            items.retain(|item| keep(item));
        }
    }
}

/// Metadata and dependency facts recovered from one variable definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRecord {
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_options: Vec<String>,
    pub formula_variables: IndexSet<String>,
    pub adds: DependencyList,
    pub subtracts: DependencyList,
    pub defined_for: Vec<String>,
    /// Local alias -> dotted parameter path, in first-use order.
    pub parameters: IndexMap<String, String>,
    pub formula_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl VariableRecord {
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Self::default()
        }
    }

    /// Label if declared, otherwise the identity.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.identity.as_str())
    }

    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Drop self-references from every dependency list.
    pub(crate) fn remove_self_references(&mut self) {
        let identity = self.identity.clone();
        self.formula_variables.retain(|name| *name != identity);
        self.adds.retain(|name| name != identity);
        self.subtracts.retain(|name| name != identity);
        self.defined_for.retain(|name| *name != identity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_references_are_removed_everywhere() {
        let mut record = VariableRecord::new("income");
        record.formula_variables.insert("income".to_string());
        record.formula_variables.insert("wages".to_string());
        record.adds = DependencyList::Resolved(vec!["income".into(), "tips".into()]);
        record.subtracts = DependencyList::Resolved(vec!["income".into()]);
        record.defined_for = vec!["income".into()];

        record.remove_self_references();

        assert_eq!(
            record.formula_variables.iter().collect::<Vec<_>>(),
            vec!["wages"]
        );
        assert_eq!(record.adds.resolved(), ["tips".to_string()]);
        assert!(record.subtracts.is_empty());
        assert!(record.defined_for.is_empty());
    }

    #[test]
    fn parameter_sourced_lists_ignore_formula_merges() {
        let mut list = DependencyList::ParameterSourced("gov.irs.sources".into());
        list.extend_resolved(vec!["wages".to_string()]);
        assert_eq!(list.parameter_path(), Some("gov.irs.sources"));
        assert!(list.resolved().is_empty());
        assert!(!list.is_empty());
    }
}
