use crate::types::{DependencyGraph, GraphNode, NodeKind};
use std::collections::HashSet;

const INDENT: &str = "  ";

/// Indented text tree, root first, dependencies nested under their dependents.
///
/// Output is stable for a given graph: children follow edge order and a node already
/// printed is referenced instead of expanded again.
#[must_use]
pub fn render_tree(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    let Some(root) = graph.node(graph.root()) else {
        return out;
    };

    let mut printed = HashSet::new();
    render_node(graph, root, None, 0, &mut printed, &mut out);
    out
}

fn render_node<'g>(
    graph: &'g DependencyGraph,
    node: &'g GraphNode,
    via: Option<&str>,
    level: usize,
    printed: &mut HashSet<&'g str>,
    out: &mut String,
) {
    let pad = INDENT.repeat(level);
    let mut lines = node.title.lines();
    let heading = lines.next().unwrap_or_default();
    let prefix = via.map(|kind| format!("[{kind}] ")).unwrap_or_default();

    if !printed.insert(node.id.as_str()) {
        out.push_str(&format!("{pad}{prefix}{} (see above)\n", node.id));
        return;
    }

    out.push_str(&format!("{pad}{prefix}{}", node.id));
    if heading != node.id {
        out.push_str(&format!(" - {heading}"));
    }
    if node.kind != NodeKind::Normal {
        out.push_str(&format!(" <{}>", node.kind));
    }
    out.push('\n');

    for extra in lines {
        out.push_str(&format!("{pad}{INDENT}| {extra}\n"));
    }
    for summary in &node.parameter_summaries {
        let mut value_lines = summary.value.lines();
        out.push_str(&format!(
            "{pad}{INDENT}* {}: {}\n",
            summary.label,
            value_lines.next().unwrap_or_default()
        ));
        for more in value_lines {
            out.push_str(&format!("{pad}{INDENT}  {more}\n"));
        }
    }

    for edge in graph.edges_to(&node.id) {
        if let Some(child) = graph.node(&edge.from) {
            render_node(graph, child, Some(edge.kind.name()), level + 1, printed, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeKind, GraphEdge};
    use pretty_assertions::assert_eq;

    fn node(id: &str, depth: usize, kind: NodeKind, title: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            depth,
            kind,
            title: title.to_string(),
            parameter_summaries: Vec::new(),
        }
    }

    fn edge(from: &str, to: &str, kind: EdgeKind) -> GraphEdge {
        GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
        }
    }

    #[test]
    fn test_cycle_is_printed_once() {
        let graph = DependencyGraph::new(
            "net_income",
            vec![
                node("net_income", 0, NodeKind::Root, "Net income"),
                node("gross_income", 1, NodeKind::Normal, "gross_income"),
                node("tax", 1, NodeKind::Stop, "Tax\nAdds: gov.tax.sources (parameter)"),
            ],
            vec![
                edge("gross_income", "net_income", EdgeKind::Formula),
                edge("tax", "net_income", EdgeKind::Formula),
                edge("net_income", "tax", EdgeKind::Formula),
            ],
        );

        assert_eq!(
            render_tree(&graph),
            "net_income - Net income <root>\n\
             \x20 [formula] gross_income\n\
             \x20 [formula] tax - Tax <stop>\n\
             \x20   | Adds: gov.tax.sources (parameter)\n\
             \x20   [formula] net_income (see above)\n"
        );
    }
}
