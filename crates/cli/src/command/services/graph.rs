use crate::command::context::CommandContext;
use crate::command::domain::{parse_payload, CommandOutcome, GraphPayload, OutputFormat};
use anyhow::{Context, Result};
use policy_graph::{render_tree, GraphBuilder};

#[derive(Default)]
pub struct GraphService;

impl GraphService {
    pub fn run(&self, payload: serde_json::Value, ctx: &CommandContext) -> Result<CommandOutcome> {
        let payload: GraphPayload = parse_payload(payload)?;
        let config = payload.options.into_config()?;
        let corpus = ctx.corpus()?;

        let graph = GraphBuilder::new(corpus, ctx.parameters(), &config)
            .build(payload.root.trim())
            .with_context(|| format!("Failed to build graph for {}", payload.root))?;

        let mut outcome = CommandOutcome::from_value(&graph)?;
        outcome.meta.variables_loaded = Some(corpus.len());
        outcome.meta.graph_nodes = Some(graph.nodes().len());
        outcome.meta.graph_edges = Some(graph.edges().len());
        outcome.meta.parameters_cached = Some(ctx.parameters().cached());
        if payload.format == OutputFormat::Text {
            outcome.text = Some(render_tree(&graph));
        }
        Ok(outcome)
    }
}
