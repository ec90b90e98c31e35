use crate::command::domain::InputError;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use once_cell::unsync::OnceCell;
use policy_extractor::{DefinitionExtractor, VariableCorpus};
use policy_parameters::ParameterStore;

/// Per-invocation state: configuration plus the lazily loaded corpus and parameter store.
pub struct CommandContext {
    config: AppConfig,
    corpus: OnceCell<VariableCorpus>,
    parameters: ParameterStore,
}

impl CommandContext {
    pub fn new(config: AppConfig) -> Self {
        let parameters =
            ParameterStore::with_capacity(config.parameters.clone(), config.cache_capacity);
        Self {
            config,
            corpus: OnceCell::new(),
            parameters,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Scanned on first use; later calls reuse the same corpus.
    pub fn corpus(&self) -> Result<&VariableCorpus> {
        self.corpus.get_or_try_init(|| {
            let root = self
                .config
                .variables
                .as_deref()
                .ok_or(InputError::MissingVariables)?;
            let mut extractor = DefinitionExtractor::with_config(self.config.extractor.clone())
                .context("Failed to initialize definition parser")?;
            VariableCorpus::load_with(root, &mut extractor)
                .with_context(|| format!("Failed to load variables from {}", root.display()))
        })
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }
}
