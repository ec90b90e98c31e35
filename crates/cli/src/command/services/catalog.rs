use crate::command::context::CommandContext;
use crate::command::domain::{
    parse_payload, CommandOutcome, InputError, SearchPayload, VariablePayload,
};
use anyhow::Result;
use policy_extractor::{
    DependencyList, LoadStats, VariableRecord, VariableSummary, DEFAULT_SEARCH_LIMIT,
};
use policy_parameters::{
    format_parameter, resolve_sourced_list, DetailLevel, FormatOptions, ParameterSource,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VariableDetails<'a> {
    #[serde(flatten)]
    record: &'a VariableRecord,
    adds_resolved: ListView,
    subtracts_resolved: ListView,
    parameter_values: Vec<ParameterValue>,
}

/// Items of an `adds`/`subtracts` list after parameter lookup.
#[derive(Debug, Serialize)]
struct ListView {
    items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameter: Option<String>,
}

#[derive(Debug, Serialize)]
struct ParameterValue {
    alias: String,
    path: String,
    label: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    query: String,
    results: Vec<VariableSummary>,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    count: usize,
    variables: Vec<VariableSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput {
    variables: usize,
    with_parameters: usize,
    load: LoadStats,
    parameter_roots: Vec<String>,
}

#[derive(Default)]
pub struct CatalogService;

impl CatalogService {
    pub fn variable(&self, payload: serde_json::Value, ctx: &CommandContext) -> Result<CommandOutcome> {
        let payload: VariablePayload = parse_payload(payload)?;
        let name = payload.name.trim();
        let corpus = ctx.corpus()?;
        let record = corpus
            .get(name)
            .ok_or_else(|| InputError::UnknownVariable(name.to_string()))?;

        let source: &dyn ParameterSource = ctx.parameters();
        let as_of = super::parse_date(ctx.config().graph.parameter_date.as_deref())?;
        let options = FormatOptions::new(DetailLevel::Full)
            .with_context(name)
            .with_as_of(as_of);

        let list_view = |list: &DependencyList| match list {
            DependencyList::Resolved(items) => ListView {
                items: items.clone(),
                parameter: None,
            },
            DependencyList::ParameterSourced(path) => ListView {
                items: resolve_sourced_list(source, path, as_of).unwrap_or_default(),
                parameter: Some(path.clone()),
            },
        };

        let parameter_values = record
            .parameters
            .iter()
            .map(|(alias, path)| {
                let loaded = source.load(path);
                ParameterValue {
                    alias: alias.clone(),
                    path: path.clone(),
                    label: loaded
                        .as_deref()
                        .and_then(|parameter| parameter.label())
                        .unwrap_or(alias.as_str())
                        .to_string(),
                    value: format_parameter(loaded.as_deref(), &options),
                }
            })
            .collect();

        let mut outcome = CommandOutcome::from_value(VariableDetails {
            record,
            adds_resolved: list_view(&record.adds),
            subtracts_resolved: list_view(&record.subtracts),
            parameter_values,
        })?;
        outcome.meta.variables_loaded = Some(corpus.len());
        outcome.meta.parameters_cached = Some(ctx.parameters().cached());
        Ok(outcome)
    }

    pub fn search(&self, payload: serde_json::Value, ctx: &CommandContext) -> Result<CommandOutcome> {
        let payload: SearchPayload = parse_payload(payload)?;
        let corpus = ctx.corpus()?;
        let limit = payload.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1);

        let results = corpus.search(&payload.query, limit);
        let mut outcome = CommandOutcome::from_value(SearchOutput {
            query: payload.query,
            results,
        })?;
        outcome.meta.variables_loaded = Some(corpus.len());
        Ok(outcome)
    }

    pub fn list(&self, ctx: &CommandContext) -> Result<CommandOutcome> {
        let corpus = ctx.corpus()?;
        let variables = corpus.summaries();
        let mut outcome = CommandOutcome::from_value(ListOutput {
            count: variables.len(),
            variables,
        })?;
        outcome.meta.variables_loaded = Some(corpus.len());
        Ok(outcome)
    }

    pub fn stats(&self, ctx: &CommandContext) -> Result<CommandOutcome> {
        let corpus = ctx.corpus()?;
        let mut outcome = CommandOutcome::from_value(StatsOutput {
            variables: corpus.len(),
            with_parameters: corpus.iter().filter(|record| record.has_parameters()).count(),
            load: *corpus.stats(),
            parameter_roots: ctx
                .parameters()
                .roots()
                .iter()
                .map(|root| root.display().to_string())
                .collect(),
        })?;
        outcome.meta.variables_loaded = Some(corpus.len());
        Ok(outcome)
    }
}
