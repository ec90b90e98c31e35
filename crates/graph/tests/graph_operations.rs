//! Tests for DependencyGraph construction and queries

use policy_extractor::{DependencyList, VariableCorpus, VariableRecord};
use policy_graph::{
    DependencyGraph, EdgeKind, GraphBuilder, GraphConfig, GraphEdge, GraphError, NodeKind,
    TraceStep,
};
use policy_parameters::InMemoryParameters;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn make_variable(id: &str, formula: &[&str]) -> VariableRecord {
    let mut record = VariableRecord::new(id);
    record.formula_variables = formula.iter().map(ToString::to_string).collect();
    record
}

fn make_edge(from: &str, to: &str, kind: EdgeKind) -> GraphEdge {
    GraphEdge {
        from: from.to_string(),
        to: to.to_string(),
        kind,
    }
}

fn net_income_corpus() -> VariableCorpus {
    VariableCorpus::from_records([
        make_variable("net_income", &["gross_income", "tax"]),
        make_variable("gross_income", &[]),
        make_variable("tax", &["net_income"]),
    ])
}

fn build(corpus: &VariableCorpus, root: &str, config: &GraphConfig) -> DependencyGraph {
    let params = InMemoryParameters::new();
    GraphBuilder::new(corpus, &params, config)
        .build(root)
        .expect("graph builds")
}

fn with_depth(max_depth: usize) -> GraphConfig {
    GraphConfig {
        max_depth,
        ..GraphConfig::default()
    }
}

#[test]
fn test_net_income_example() {
    let graph = build(&net_income_corpus(), "net_income", &with_depth(5));

    let ids: Vec<&str> = graph.nodes().iter().map(|node| node.id.as_str()).collect();
    assert_eq!(ids, vec!["net_income", "gross_income", "tax"]);
    assert_eq!(
        graph.edges(),
        &[
            make_edge("gross_income", "net_income", EdgeKind::Formula),
            make_edge("tax", "net_income", EdgeKind::Formula),
            make_edge("net_income", "tax", EdgeKind::Formula),
        ]
    );
}

#[test]
fn test_zero_depth_is_root_only() {
    let graph = build(&net_income_corpus(), "net_income", &with_depth(0));

    assert_eq!(graph.nodes().len(), 1);
    assert_eq!(graph.nodes()[0].kind, NodeKind::Root);
    assert!(graph.edges().is_empty());
}

#[test]
fn test_every_edge_endpoint_is_a_node() {
    let corpus = VariableCorpus::from_records([
        make_variable("a", &["b", "c"]),
        make_variable("b", &["d", "a"]),
        make_variable("c", &["d"]),
        make_variable("d", &["e"]),
        make_variable("e", &["f"]),
    ]);

    for depth in 0..5 {
        let graph = build(&corpus, "a", &with_depth(depth));
        for edge in graph.edges() {
            assert!(graph.contains(&edge.from), "dangling {edge:?} at {depth}");
            assert!(graph.contains(&edge.to), "dangling {edge:?} at {depth}");
        }
    }
}

#[test]
fn test_build_is_idempotent() {
    let corpus = net_income_corpus();
    let config = GraphConfig::default();

    assert_eq!(
        build(&corpus, "net_income", &config),
        build(&corpus, "net_income", &config)
    );
}

#[test]
fn test_stop_variables_are_not_expanded() {
    let corpus = VariableCorpus::from_records([
        make_variable("snap", &["snap_gross_income", "is_child"]),
        make_variable("snap_gross_income", &["employment_income"]),
        make_variable("employment_income", &["hours_worked"]),
        make_variable("is_child", &["age"]),
    ]);
    let config = GraphConfig::default();

    let graph = build(&corpus, "snap", &config);

    for stop in &config.stop_variables {
        if let Some(node) = graph.node(stop) {
            assert_eq!(node.kind, NodeKind::Stop);
            assert_eq!(graph.edges_to(stop).count(), 0);
        }
    }
    assert!(!graph.contains("hours_worked"));
    assert!(!graph.contains("age"));
}

#[test]
fn test_cycle_mesh_terminates_with_unique_nodes() {
    let corpus = VariableCorpus::from_records([
        make_variable("a", &["b"]),
        make_variable("b", &[]),
        make_variable("c", &["a"]),
    ]);

    let graph = build(&corpus, "c", &GraphConfig::default());

    let ids: Vec<&str> = graph.nodes().iter().map(|node| node.id.as_str()).collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn test_unknown_root_and_invalid_config_are_rejected() {
    let corpus = net_income_corpus();
    let params = InMemoryParameters::new();

    let config = GraphConfig::default();
    assert_eq!(
        GraphBuilder::new(&corpus, &params, &config).build("nope"),
        Err(GraphError::UnknownRoot("nope".to_string()))
    );

    let config = with_depth(500);
    assert!(matches!(
        GraphBuilder::new(&corpus, &params, &config).build("net_income"),
        Err(GraphError::InvalidConfig(_))
    ));
}

#[test]
fn test_parameter_summaries_are_attached_and_suppressible() {
    let mut eitc = make_variable("eitc", &["earned_income"]);
    eitc.parameters
        .insert("p".to_string(), "gov.irs.credits.eitc.max".to_string());
    eitc.parameters
        .insert("missing".to_string(), "gov.irs.credits.eitc.gone".to_string());
    let corpus = VariableCorpus::from_records([eitc, make_variable("earned_income", &[])]);

    let mut params = InMemoryParameters::new();
    params
        .insert_yaml(
            "gov.irs.credits.eitc.max",
            "values:\n  2020-01-01: 100\n  2023-01-01: 150\nmetadata:\n  unit: currency-USD\n  label: EITC maximum\n",
        )
        .unwrap();

    let mut config = GraphConfig::default();
    let graph = GraphBuilder::new(&corpus, &params, &config)
        .build("eitc")
        .unwrap();

    let summaries = &graph.node("eitc").unwrap().parameter_summaries;
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].label, "EITC maximum");
    assert_eq!(summaries[0].value, "$150");
    assert_eq!(summaries[1].label, "missing");
    assert_eq!(summaries[1].value, "Parameter not found");
    assert_eq!(graph.edges().len(), 1);

    config.parameter_suppress.insert("eitc".to_string());
    let graph = GraphBuilder::new(&corpus, &params, &config)
        .build("eitc")
        .unwrap();
    assert!(graph.node("eitc").unwrap().parameter_summaries.is_empty());
}

#[test]
fn test_parameter_sourced_lists_go_into_the_title() {
    let mut income = make_variable("household_income", &[]);
    income.label = Some("Household income".to_string());
    income.adds = DependencyList::ParameterSourced("gov.household.income.sources".to_string());
    income.subtracts = DependencyList::ParameterSourced("gov.household.income.deductions".to_string());
    let corpus = VariableCorpus::from_records([income]);

    let mut params = InMemoryParameters::new();
    params
        .insert_yaml(
            "gov.household.income.sources",
            "values:\n  2022-01-01: [wages, pensions]\n",
        )
        .unwrap();
    let config = GraphConfig::default();

    let graph = GraphBuilder::new(&corpus, &params, &config)
        .build("household_income")
        .unwrap();

    assert_eq!(
        graph.node("household_income").unwrap().title,
        "Household income\n\
         Adds (gov.household.income.sources): wages, pensions\n\
         Subtracts: gov.household.income.deductions (parameter)"
    );
    assert!(graph.edges().is_empty());
}

#[test]
fn test_stats_and_trace() {
    let corpus = VariableCorpus::from_records([
        make_variable("benefit", &["countable_income", "filing_status"]),
        make_variable("countable_income", &["wages"]),
        make_variable("wages", &[]),
    ]);
    let graph = build(&corpus, "benefit", &GraphConfig::default());

    let stats = graph.stats();
    assert_eq!(stats.nodes, 4);
    assert_eq!(stats.edges, 3);
    assert_eq!(stats.max_depth, 2);
    assert_eq!(stats.nodes_by_kind.get(&NodeKind::Stop), Some(&1));
    assert_eq!(stats.edges_by_kind.get(&EdgeKind::Formula), Some(&3));

    assert_eq!(
        graph.trace("wages", "benefit"),
        Some(vec![
            TraceStep { id: "wages".into(), via: None },
            TraceStep { id: "countable_income".into(), via: Some(EdgeKind::Formula) },
            TraceStep { id: "benefit".into(), via: Some(EdgeKind::Formula) },
        ])
    );
    assert_eq!(graph.trace("benefit", "wages"), None);

    let (petgraph, index) = graph.to_petgraph();
    assert_eq!(petgraph.node_count(), 4);
    assert_eq!(petgraph.edge_count(), 3);
    assert!(index.contains_key("filing_status"));
}

#[test]
fn test_output_uses_snake_case_kinds() {
    let graph = build(&net_income_corpus(), "net_income", &with_depth(1));
    let json = serde_json::to_value(&graph).unwrap();

    assert_eq!(json["nodes"][0]["kind"], "root");
    assert_eq!(json["nodes"][0]["parameterSummaries"], serde_json::json!([]));
    assert_eq!(json["edges"][0]["kind"], "formula");
    assert!(json.get("root").is_none());
}
