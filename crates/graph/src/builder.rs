use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::types::{DependencyGraph, EdgeKind, GraphEdge, GraphNode, NodeKind, ParameterSummary};
use policy_extractor::{VariableCorpus, VariableRecord};
use policy_parameters::{format_parameter, resolve_sourced_list, FormatOptions, ParameterSource};
use std::collections::HashSet;

/// Builds a dependency graph for one root variable.
///
/// The corpus and parameter source are borrowed; every `build` starts from an empty
/// traversal state so a builder can serve any number of requests.
pub struct GraphBuilder<'a> {
    corpus: &'a VariableCorpus,
    parameters: &'a dyn ParameterSource,
    config: &'a GraphConfig,
}

#[derive(Default)]
struct Traversal {
    visited: HashSet<String>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl Traversal {
    fn link(&mut self, dependency: &str, parent: Option<(&str, EdgeKind)>) {
        if let Some((dependent, kind)) = parent {
            self.edges.push(GraphEdge {
                from: dependency.to_string(),
                to: dependent.to_string(),
                kind,
            });
        }
    }
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new(
        corpus: &'a VariableCorpus,
        parameters: &'a dyn ParameterSource,
        config: &'a GraphConfig,
    ) -> Self {
        Self {
            corpus,
            parameters,
            config,
        }
    }

    /// Depth-first build from `root`.
    ///
    /// Fails on an invalid config or a root the corpus does not define; every other gap
    /// becomes an unexpanded leaf.
    pub fn build(&self, root: &str) -> Result<DependencyGraph> {
        self.config.validate()?;
        if !self.corpus.contains(root) {
            return Err(GraphError::UnknownRoot(root.to_string()));
        }

        let mut state = Traversal::default();
        self.visit(&mut state, root, 0, None, root);

        log::info!(
            "Built graph for {root}: {} nodes, {} edges",
            state.nodes.len(),
            state.edges.len()
        );

        Ok(DependencyGraph::new(root, state.nodes, state.edges))
    }

    fn visit(
        &self,
        state: &mut Traversal,
        id: &str,
        depth: usize,
        parent: Option<(&str, EdgeKind)>,
        root: &str,
    ) {
        if parent.is_some_and(|(dependent, _)| dependent == id) {
            return;
        }
        // Visited first: a revisit past the depth cutoff still gets its edge.
        if state.visited.contains(id) {
            state.link(id, parent);
            return;
        }
        if depth > self.config.max_depth {
            return;
        }
        state.visited.insert(id.to_string());

        let record = self.corpus.get(id);
        let kind = match (parent, record) {
            _ if self.config.stop_variables.contains(id) => NodeKind::Stop,
            (None, _) => NodeKind::Root,
            (_, None) => NodeKind::Normal,
            (Some((_, EdgeKind::ConditionalScope)), Some(_)) => NodeKind::ConditionalScope,
            (Some(_), Some(_)) => NodeKind::Normal,
        };

        let node = GraphNode {
            id: id.to_string(),
            depth,
            kind,
            title: record.map_or_else(|| id.to_string(), |record| self.title(record)),
            parameter_summaries: record
                .map(|record| self.parameter_summaries(record, root))
                .unwrap_or_default(),
        };
        state.nodes.push(node);
        state.link(id, parent);

        let Some(record) = record else {
            log::debug!("{id} is referenced but not defined");
            return;
        };
        if kind == NodeKind::Stop {
            return;
        }

        let next = depth + 1;
        for condition in &record.defined_for {
            self.visit(
                state,
                condition,
                next,
                Some((id, EdgeKind::ConditionalScope)),
                root,
            );
        }
        for variable in &record.formula_variables {
            self.visit(state, variable, next, Some((id, EdgeKind::Formula)), root);
        }
        if self.config.expand_adds_subtracts {
            for variable in record.adds.resolved() {
                self.visit(state, variable, next, Some((id, EdgeKind::Adds)), root);
            }
            for variable in record.subtracts.resolved() {
                self.visit(state, variable, next, Some((id, EdgeKind::Subtracts)), root);
            }
        }
    }

    /// Label plus one line per parameter-sourced list.
    fn title(&self, record: &VariableRecord) -> String {
        let mut title = record.display_label().to_string();
        for (name, list) in [("Adds", &record.adds), ("Subtracts", &record.subtracts)] {
            let Some(path) = list.parameter_path() else {
                continue;
            };
            let line = match resolve_sourced_list(self.parameters, path, self.config.parameter_date)
            {
                Some(items) => format!("{name} ({path}): {}", items.join(", ")),
                None => format!("{name}: {path} (parameter)"),
            };
            title.push('\n');
            title.push_str(&line);
        }
        title
    }

    fn parameter_summaries(&self, record: &VariableRecord, root: &str) -> Vec<ParameterSummary> {
        if !self.config.show_parameters
            || self.config.parameter_suppress.contains(&record.identity)
        {
            return Vec::new();
        }

        let options = FormatOptions::new(self.config.parameter_detail)
            .with_context(root)
            .with_as_of(self.config.parameter_date);

        record
            .parameters
            .iter()
            .map(|(alias, path)| {
                let loaded = self.parameters.load(path);
                let label = loaded
                    .as_deref()
                    .and_then(|parameter| parameter.label())
                    .unwrap_or(alias.as_str())
                    .to_string();
                ParameterSummary {
                    label,
                    path: path.clone(),
                    value: format_parameter(loaded.as_deref(), &options),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_extractor::DependencyList;
    use policy_parameters::InMemoryParameters;
    use pretty_assertions::assert_eq;

    fn variable(id: &str, formula: &[&str]) -> VariableRecord {
        let mut record = VariableRecord::new(id);
        record.formula_variables = formula.iter().map(ToString::to_string).collect();
        record
    }

    #[test]
    fn test_conditional_scope_is_one_level_below_its_parent() {
        let mut eitc = variable("eitc", &["earned_income"]);
        eitc.defined_for = vec!["eitc_eligible".to_string()];
        let corpus = VariableCorpus::from_records([
            eitc,
            variable("eitc_eligible", &[]),
            variable("earned_income", &[]),
        ]);
        let params = InMemoryParameters::new();
        let config = GraphConfig::default();

        let graph = GraphBuilder::new(&corpus, &params, &config)
            .build("eitc")
            .unwrap();

        let scope = graph.node("eitc_eligible").unwrap();
        assert_eq!(scope.kind, NodeKind::ConditionalScope);
        assert_eq!(scope.depth, 1);
        assert_eq!(graph.edges()[0].kind, EdgeKind::ConditionalScope);
        assert_eq!(graph.edges()[1].from, "earned_income");
    }

    #[test]
    fn test_adds_and_subtracts_follow_formula_edges() {
        let mut net = variable("net", &["rate"]);
        net.adds = DependencyList::Resolved(vec!["wages".into()]);
        net.subtracts = DependencyList::Resolved(vec!["losses".into()]);
        let corpus = VariableCorpus::from_records([net]);
        let params = InMemoryParameters::new();

        let mut config = GraphConfig::default();
        let graph = GraphBuilder::new(&corpus, &params, &config)
            .build("net")
            .unwrap();
        let kinds: Vec<EdgeKind> = graph.edges().iter().map(|edge| edge.kind).collect();
        assert_eq!(
            kinds,
            vec![EdgeKind::Formula, EdgeKind::Adds, EdgeKind::Subtracts]
        );

        config.expand_adds_subtracts = false;
        let graph = GraphBuilder::new(&corpus, &params, &config)
            .build("net")
            .unwrap();
        assert_eq!(graph.edges().len(), 1);
        assert!(graph.node("wages").is_none());
    }

    #[test]
    fn test_undefined_reference_is_an_unexpanded_leaf() {
        let corpus = VariableCorpus::from_records([variable("benefit", &["mystery"])]);
        let params = InMemoryParameters::new();
        let config = GraphConfig::default();

        let graph = GraphBuilder::new(&corpus, &params, &config)
            .build("benefit")
            .unwrap();

        let leaf = graph.node("mystery").unwrap();
        assert_eq!(leaf.kind, NodeKind::Normal);
        assert_eq!(leaf.title, "mystery");
        assert!(leaf.parameter_summaries.is_empty());
    }

    #[test]
    fn test_root_in_stop_set_is_not_expanded() {
        let corpus = VariableCorpus::from_records([
            variable("employment_income", &["hours", "wage_rate"]),
            variable("hours", &[]),
            variable("wage_rate", &[]),
        ]);
        let params = InMemoryParameters::new();
        let config = GraphConfig::default();

        let graph = GraphBuilder::new(&corpus, &params, &config)
            .build("employment_income")
            .unwrap();

        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.node("employment_income").unwrap().kind, NodeKind::Stop);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_self_reference_never_becomes_an_edge() {
        let corpus = VariableCorpus::from_records([variable("a", &["a", "b"]), variable("b", &[])]);
        let params = InMemoryParameters::new();
        let mut config = GraphConfig {
            max_depth: 0,
            ..GraphConfig::default()
        };

        let graph = GraphBuilder::new(&corpus, &params, &config).build("a").unwrap();
        assert_eq!(graph.nodes().len(), 1);
        assert!(graph.edges().is_empty());

        config.max_depth = 5;
        let graph = GraphBuilder::new(&corpus, &params, &config).build("a").unwrap();
        assert_eq!(graph.edges().len(), 1);
        assert!(graph.edges().iter().all(|edge| edge.from != edge.to));
    }
}
