mod context;
pub mod domain;
mod services;

pub use context::CommandContext;
pub use domain::{
    is_input_error, CommandAction, CommandRequest, CommandResponse,
    CommandStatus, GraphPayload, OutputFormat, ParameterPayload, SearchPayload, TracePayload,
    VariablePayload,
};

use anyhow::Result;
use domain::elapsed_ms;
use services::Services;
use std::time::Instant;

pub struct CommandHandler {
    services: Services,
    context: CommandContext,
}

impl CommandHandler {
    pub fn new(context: CommandContext) -> Self {
        Self {
            services: Services::default(),
            context,
        }
    }

    pub fn execute(&self, request: CommandRequest) -> Result<CommandResponse> {
        let started = Instant::now();
        let CommandRequest { action, payload } = request;

        let mut outcome = self.services.route(action, payload, &self.context)?;
        outcome.meta.duration_ms = Some(elapsed_ms(started));
        log::debug!("{action:?} finished in {}ms", elapsed_ms(started));

        Ok(CommandResponse {
            status: CommandStatus::Ok,
            message: None,
            hints: outcome.hints,
            data: outcome.data,
            meta: outcome.meta,
            text: outcome.text,
        })
    }
}
