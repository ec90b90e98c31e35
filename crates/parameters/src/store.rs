use crate::error::{ParameterError, Result};
use crate::latest::{latest_value, terminal_series};
use crate::record::ParameterRecord;
use crate::value::ParamValue;
use chrono::NaiveDate;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Anything that can hand out parameter records by dotted path.
pub trait ParameterSource {
    /// `None` when the path does not resolve; failures are not surfaced.
    fn load(&self, path: &str) -> Option<Arc<ParameterRecord>>;
}

/// Directory-backed parameter store with a read-through LRU cache.
///
/// `a.b.c` resolves to `<root>/a/b/c.yaml`; when that file is missing, to key `c` inside
/// `<root>/a/b.yaml`. Roots are tried in order. Misses are cached too.
pub struct ParameterStore {
    roots: Vec<PathBuf>,
    cache: Mutex<LruCache<String, Option<Arc<ParameterRecord>>>>,
}

impl ParameterStore {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::with_capacity(roots, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity<I, P>(roots: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Number of cached entries, misses included
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Uncached load with the failure reason kept.
    pub fn try_load(&self, path: &str) -> Result<ParameterRecord> {
        let normalized = normalize_path(path)?;
        let segments: Vec<&str> = normalized.split('.').collect();

        for root in &self.roots {
            let direct = segment_path(root, &segments).with_extension("yaml");
            if direct.is_file() {
                let value = read_yaml(&direct)?;
                return Ok(ParameterRecord::new(normalized, value));
            }

            if let Some((key, parent)) = segments.split_last() {
                if parent.is_empty() {
                    continue;
                }
                let parent_file = segment_path(root, parent).with_extension("yaml");
                if parent_file.is_file() {
                    let value = read_yaml(&parent_file)?;
                    if let ParamValue::Map(mut map) = value {
                        if let Some(nested) = map.swap_remove(*key) {
                            return Ok(ParameterRecord::new(normalized, nested));
                        }
                    }
                }
            }
        }

        Err(ParameterError::NotFound(normalized))
    }
}

impl ParameterSource for ParameterStore {
    fn load(&self, path: &str) -> Option<Arc<ParameterRecord>> {
        let key = normalize_path(path).ok()?;
        if let Some(cached) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return cached.clone();
        }

        // Loaded outside the lock; a racing load of the same path stores an equal value.
        let loaded = match self.try_load(&key) {
            Ok(record) => Some(Arc::new(record)),
            Err(err) => {
                log::debug!("Parameter {key} unavailable: {err}");
                None
            }
        };

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, loaded.clone());
        loaded
    }
}

/// Fixed set of records, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryParameters {
    records: HashMap<String, Arc<ParameterRecord>>,
}

impl InMemoryParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ParameterRecord) {
        self.records.insert(record.path.clone(), Arc::new(record));
    }

    /// Parse and insert a YAML document under `path`.
    pub fn insert_yaml(&mut self, path: &str, yaml: &str) -> Result<()> {
        self.insert(ParameterRecord::from_yaml_str(path, yaml)?);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ParameterSource for InMemoryParameters {
    fn load(&self, path: &str) -> Option<Arc<ParameterRecord>> {
        let key = normalize_path(path).ok()?;
        self.records.get(&key).cloned()
    }
}

/// Items of a parameter whose value is a list of identities (`adds = "gov.x.sources"`).
#[must_use]
pub fn resolve_sourced_list(
    source: &dyn ParameterSource,
    path: &str,
    as_of: Option<NaiveDate>,
) -> Option<Vec<String>> {
    let record = source.load(path)?;
    let series = terminal_series(&record)?;
    let items = latest_value(series, as_of)?.value.as_list()?;
    Some(
        items
            .iter()
            .filter_map(ParamValue::as_str)
            .map(str::to_string)
            .collect(),
    )
}

fn normalize_path(path: &str) -> Result<String> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_suffix(".yaml").unwrap_or(trimmed);
    if trimmed.is_empty() || trimmed.split('.').any(str::is_empty) {
        return Err(ParameterError::InvalidPath(path.to_string()));
    }
    Ok(trimmed.to_string())
}

fn segment_path(root: &Path, segments: &[&str]) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(segments);
    path
}

fn read_yaml(file: &Path) -> Result<ParamValue> {
    let source = std::fs::read_to_string(file)?;
    Ok(ParamValue::from_yaml_str(&source)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_yaml_suffix_and_rejects_empty_segments() {
        assert_eq!(normalize_path("gov.irs.rate.yaml").unwrap(), "gov.irs.rate");
        assert!(matches!(
            normalize_path("gov..rate"),
            Err(ParameterError::InvalidPath(_))
        ));
        assert!(normalize_path("  ").is_err());
    }

    #[test]
    fn in_memory_source_resolves_sourced_lists() {
        let mut params = InMemoryParameters::new();
        params
            .insert_yaml(
                "gov.irs.income.sources",
                "values:\n  2020-01-01: [wages]\n  2023-01-01: [wages, tips]\n",
            )
            .unwrap();

        assert_eq!(
            resolve_sourced_list(&params, "gov.irs.income.sources", None),
            Some(vec!["wages".to_string(), "tips".to_string()])
        );
        assert_eq!(
            resolve_sourced_list(
                &params,
                "gov.irs.income.sources",
                NaiveDate::from_ymd_opt(2021, 1, 1)
            ),
            Some(vec!["wages".to_string()])
        );
        assert_eq!(resolve_sourced_list(&params, "gov.missing", None), None);
    }
}
