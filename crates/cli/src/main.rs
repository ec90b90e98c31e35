mod command;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use command::{
    is_input_error, CommandAction, CommandContext, CommandHandler, CommandRequest,
    CommandResponse, GraphPayload, OutputFormat, ParameterPayload, SearchPayload, TracePayload,
    VariablePayload,
};
use config::AppConfig;
use policy_graph::GraphRequest;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "policy-graph",
    version,
    about = "Explore dependency graphs of policy calculation variables"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "TOML config file (default: ./policy-graph.toml)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory of variable definition files")]
    variables: Option<PathBuf>,

    #[arg(
        long = "parameters",
        global = true,
        help = "Parameter root directory (repeatable, searched in order)"
    )]
    parameters: Vec<PathBuf>,

    #[arg(long, global = true, help = "Log filter, e.g. debug or policy_graph=info")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Build the dependency graph rooted at a variable")]
    Graph {
        root: String,

        #[command(flatten)]
        options: GraphArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    #[command(about = "Show one variable with its parameters")]
    Variable { name: String },

    #[command(about = "Show one parameter by dotted path")]
    Parameter {
        path: String,

        #[arg(long, help = "minimal, summary or full")]
        detail: Option<String>,

        #[arg(long, help = "Variable identity used to pick a state entry")]
        context: Option<String>,

        #[arg(long, help = "Reference date, YYYY-MM-DD")]
        as_of: Option<String>,
    },

    #[command(about = "Search variables by name or label")]
    Search {
        query: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    #[command(about = "List every variable")]
    List,

    #[command(about = "Shortest dependency chain from a variable up to a root")]
    Trace {
        from: String,
        root: String,

        #[command(flatten)]
        options: GraphArgs,
    },

    #[command(about = "Corpus load statistics")]
    Stats,
}

#[derive(Args, Debug, Default)]
struct GraphArgs {
    #[arg(long, allow_hyphen_values = true)]
    max_depth: Option<i64>,

    #[arg(long = "stop", help = "Extra stop variable (repeatable)")]
    stop: Vec<String>,

    #[arg(long)]
    no_adds_subtracts: bool,

    #[arg(long)]
    no_parameters: bool,

    #[arg(long, help = "minimal, summary or full")]
    detail: Option<String>,

    #[arg(long = "suppress-parameters", help = "Variable whose parameters are hidden (repeatable)")]
    suppress_parameters: Vec<String>,

    #[arg(long, help = "Reference date for parameter values, YYYY-MM-DD")]
    as_of: Option<String>,
}

impl GraphArgs {
    /// Flags win over the config file; lists are appended.
    fn merge_into(self, mut request: GraphRequest) -> GraphRequest {
        if self.max_depth.is_some() {
            request.max_depth = self.max_depth;
        }
        request.stop_variables.extend(self.stop);
        if self.no_adds_subtracts {
            request.expand_adds_subtracts = Some(false);
        }
        if self.no_parameters {
            request.show_parameters = Some(false);
        }
        if self.detail.is_some() {
            request.parameter_detail = self.detail;
        }
        request.parameter_suppress.extend(self.suppress_parameters);
        if self.as_of.is_some() {
            request.parameter_date = self.as_of;
        }
        request
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let started = Instant::now();
    match run(cli) {
        Ok(response) => {
            emit(&response);
            if response.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            log::debug!("Command failed: {err:?}");
            emit(&CommandResponse::from_error(&err, started));
            ExitCode::from(if is_input_error(&err) { 2 } else { 1 })
        }
    }
}

fn init_logging(level: Option<&str>) {
    // stderr only; stdout carries the JSON envelope
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.target(env_logger::Target::Stderr);
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.init();
}

fn run(cli: Cli) -> Result<CommandResponse> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(variables) = cli.variables {
        config.variables = Some(variables);
    }
    if !cli.parameters.is_empty() {
        config.parameters = cli.parameters;
    }
    let defaults = config.graph.to_request();

    let request = match cli.command {
        Commands::Graph {
            root,
            options,
            format,
        } => CommandRequest::new(
            CommandAction::Graph,
            GraphPayload {
                root,
                format,
                options: options.merge_into(defaults),
            },
        )?,
        Commands::Trace {
            from,
            root,
            options,
        } => CommandRequest::new(
            CommandAction::Trace,
            TracePayload {
                from,
                root,
                options: options.merge_into(defaults),
            },
        )?,
        Commands::Variable { name } => {
            CommandRequest::new(CommandAction::Variable, VariablePayload { name })?
        }
        Commands::Parameter {
            path,
            detail,
            context,
            as_of,
        } => CommandRequest::new(
            CommandAction::Parameter,
            ParameterPayload {
                path,
                detail,
                context,
                as_of,
            },
        )?,
        Commands::Search { query, limit } => {
            CommandRequest::new(CommandAction::Search, SearchPayload { query, limit })?
        }
        Commands::List => CommandRequest::new(CommandAction::List, serde_json::json!({}))?,
        Commands::Stats => CommandRequest::new(CommandAction::Stats, serde_json::json!({}))?,
    };

    CommandHandler::new(CommandContext::new(config)).execute(request)
}

fn emit(response: &CommandResponse) {
    if let Some(text) = &response.text {
        print!("{text}");
        return;
    }
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("Failed to serialize response: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_flags_override_config_defaults() {
        let cli = Cli::parse_from([
            "policy-graph",
            "graph",
            "eitc",
            "--max-depth",
            "3",
            "--stop",
            "age",
            "--no-parameters",
            "--format",
            "text",
        ]);
        let Commands::Graph {
            root,
            options,
            format,
        } = cli.command
        else {
            panic!("expected graph command");
        };

        let base = GraphRequest {
            max_depth: Some(8),
            stop_variables: vec!["wages".into()],
            ..GraphRequest::default()
        };
        let merged = options.merge_into(base);

        assert_eq!(root, "eitc");
        assert_eq!(format, OutputFormat::Text);
        assert_eq!(merged.max_depth, Some(3));
        assert_eq!(merged.stop_variables, vec!["wages".to_string(), "age".to_string()]);
        assert_eq!(merged.show_parameters, Some(false));
        assert_eq!(merged.expand_adds_subtracts, None);
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::parse_from([
            "policy-graph",
            "stats",
            "--variables",
            "vars",
            "--parameters",
            "a",
            "--parameters",
            "b",
        ]);
        assert_eq!(cli.variables, Some(PathBuf::from("vars")));
        assert_eq!(cli.parameters.len(), 2);
    }
}
