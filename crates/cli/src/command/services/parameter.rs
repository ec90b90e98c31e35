use crate::command::context::CommandContext;
use crate::command::domain::{parse_payload, CommandOutcome, ParameterPayload};
use anyhow::{Context, Result};
use policy_parameters::{describe, DetailLevel, FormatOptions};

#[derive(Default)]
pub struct ParameterService;

impl ParameterService {
    pub fn run(&self, payload: serde_json::Value, ctx: &CommandContext) -> Result<CommandOutcome> {
        let payload: ParameterPayload = parse_payload(payload)?;
        let as_of = super::parse_date(payload.as_of.as_deref())?;

        let record = ctx
            .parameters()
            .try_load(&payload.path)
            .with_context(|| format!("Failed to load parameter {}", payload.path))?;

        let mut options = FormatOptions::new(
            payload
                .detail
                .as_deref()
                .map_or(DetailLevel::Full, DetailLevel::parse_lenient),
        )
        .with_as_of(as_of);
        if let Some(context) = payload.context.as_deref().map(str::trim) {
            options = options.with_context(context);
        }

        let mut outcome = CommandOutcome::from_value(describe(&record, &options))?;
        outcome.meta.parameters_cached = Some(ctx.parameters().cached());
        Ok(outcome)
    }
}
