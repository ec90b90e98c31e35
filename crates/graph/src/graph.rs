use crate::types::{DependencyGraph, EdgeKind, GraphEdge, GraphNode, GraphStats, TraceStep};
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Petgraph view of a built graph plus the identity lookup for it.
pub type PetGraph<'g> = (DiGraph<&'g GraphNode, EdgeKind>, HashMap<&'g str, NodeIndex>);

impl DependencyGraph {
    pub(crate) fn new(root: &str, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            root: root.to_string(),
            nodes,
            edges,
        }
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Nodes in first-visit order
    #[must_use]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges in emission order
    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Edges where `id` is the dependency
    pub fn edges_from<'g>(&'g self, id: &'g str) -> impl Iterator<Item = &'g GraphEdge> + 'g {
        self.edges.iter().filter(move |edge| edge.from == id)
    }

    /// Edges where `id` is the dependent
    pub fn edges_to<'g>(&'g self, id: &'g str) -> impl Iterator<Item = &'g GraphEdge> + 'g {
        self.edges.iter().filter(move |edge| edge.to == id)
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            ..GraphStats::default()
        };
        for node in &self.nodes {
            *stats.nodes_by_kind.entry(node.kind).or_insert(0) += 1;
            stats.max_depth = stats.max_depth.max(node.depth);
        }
        for edge in &self.edges {
            *stats.edges_by_kind.entry(edge.kind).or_insert(0) += 1;
        }
        stats
    }

    /// Directed petgraph copy, edges pointing dependency to dependent.
    #[must_use]
    pub fn to_petgraph(&self) -> PetGraph<'_> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index = HashMap::with_capacity(self.nodes.len());

        for node in &self.nodes {
            index.insert(node.id.as_str(), graph.add_node(node));
        }
        for edge in &self.edges {
            if let (Some(&from), Some(&to)) =
                (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
            {
                graph.add_edge(from, to, edge.kind);
            }
        }

        (graph, index)
    }

    /// Shortest chain of edges leading from `from` up to `to`.
    ///
    /// The first step has no `via`; each later step names the edge kind that reached it.
    #[must_use]
    pub fn trace(&self, from: &str, to: &str) -> Option<Vec<TraceStep>> {
        let (graph, index) = self.to_petgraph();
        let start = *index.get(from)?;
        let goal = *index.get(to)?;

        let (_cost, path) = astar(&graph, start, |n| n == goal, |_| 1_u32, |_| 0)?;

        let mut steps = vec![TraceStep {
            id: graph[path[0]].id.clone(),
            via: None,
        }];
        for window in path.windows(2) {
            let via = graph.find_edge(window[0], window[1]).map(|e| graph[e]);
            steps.push(TraceStep {
                id: graph[window[1]].id.clone(),
                via,
            });
        }
        Some(steps)
    }
}
