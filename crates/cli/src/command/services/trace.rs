use crate::command::context::CommandContext;
use crate::command::domain::{parse_payload, CommandOutcome, Hint, HintKind, TracePayload};
use anyhow::{Context, Result};
use policy_graph::{GraphBuilder, TraceStep};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TraceOutput {
    from: String,
    root: String,
    found: bool,
    steps: Vec<TraceStep>,
}

#[derive(Default)]
pub struct TraceService;

impl TraceService {
    /// Shortest chain from `from` up to `root`, inside the graph built for `root`.
    pub fn run(&self, payload: serde_json::Value, ctx: &CommandContext) -> Result<CommandOutcome> {
        let payload: TracePayload = parse_payload(payload)?;
        let config = payload.options.into_config()?;
        let corpus = ctx.corpus()?;
        let root = payload.root.trim();
        let from = payload.from.trim();

        let graph = GraphBuilder::new(corpus, ctx.parameters(), &config)
            .build(root)
            .with_context(|| format!("Failed to build graph for {root}"))?;

        let steps = graph.trace(from, root).unwrap_or_default();
        let found = !steps.is_empty();

        let mut outcome = CommandOutcome::from_value(TraceOutput {
            from: from.to_string(),
            root: root.to_string(),
            found,
            steps,
        })?;
        if !found {
            let text = if graph.contains(from) {
                format!("{from} does not feed into {root}")
            } else {
                format!("{from} is not within {} levels of {root}", config.max_depth)
            };
            outcome.hints.push(Hint {
                kind: HintKind::Info,
                text,
            });
        }
        outcome.meta.graph_nodes = Some(graph.nodes().len());
        outcome.meta.graph_edges = Some(graph.edges().len());
        Ok(outcome)
    }
}
