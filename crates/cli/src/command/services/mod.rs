mod catalog;
mod graph;
mod parameter;
mod trace;

use crate::command::context::CommandContext;
use crate::command::domain::{CommandAction, CommandOutcome, InputError};
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;

pub use catalog::CatalogService;
pub use graph::GraphService;
pub use parameter::ParameterService;
pub use trace::TraceService;

#[derive(Default)]
pub struct Services {
    graph: GraphService,
    catalog: CatalogService,
    parameter: ParameterService,
    trace: TraceService,
}

impl Services {
    pub fn route(
        &self,
        action: CommandAction,
        payload: Value,
        ctx: &CommandContext,
    ) -> Result<CommandOutcome> {
        match action {
            CommandAction::Graph => self.graph.run(payload, ctx),
            CommandAction::Trace => self.trace.run(payload, ctx),
            CommandAction::Variable => self.catalog.variable(payload, ctx),
            CommandAction::Search => self.catalog.search(payload, ctx),
            CommandAction::List => self.catalog.list(ctx),
            CommandAction::Stats => self.catalog.stats(ctx),
            CommandAction::Parameter => self.parameter.run(payload, ctx),
        }
    }
}

pub(crate) fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| InputError::InvalidDate(raw.to_string()).into())
        })
        .transpose()
}
