use crate::error::{ExtractError, Result};
use crate::extractor::DefinitionExtractor;
use crate::record::VariableRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Queries shorter than this return nothing.
pub const MIN_SEARCH_QUERY_LEN: usize = 2;
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Counters reported after loading a corpus directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub files_scanned: usize,
    pub extracted: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

/// One row of the variable catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableSummary {
    pub name: String,
    pub label: String,
    pub has_parameters: bool,
}

impl From<&VariableRecord> for VariableSummary {
    fn from(record: &VariableRecord) -> Self {
        Self {
            name: record.identity.clone(),
            label: record.display_label().to_string(),
            has_parameters: record.has_parameters(),
        }
    }
}

/// Every extracted [`VariableRecord`], keyed by identity.
///
/// Built once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct VariableCorpus {
    records: BTreeMap<String, VariableRecord>,
    stats: LoadStats,
}

impl VariableCorpus {
    /// Load every definition unit below `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let mut extractor = DefinitionExtractor::new()?;
        Self::load_with(root, &mut extractor)
    }

    pub fn load_with(root: impl AsRef<Path>, extractor: &mut DefinitionExtractor) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ExtractError::CorpusNotFound(root.display().to_string()));
        }

        let mut corpus = Self::default();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_ignored(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|ext| ext.to_str()) != Some("py")
            {
                continue;
            }

            corpus.stats.files_scanned += 1;
            match extractor.extract_file(entry.path()) {
                Ok(record) => corpus.admit(record),
                Err(err) => {
                    log::debug!("Skipping {}: {err}", entry.path().display());
                    corpus.stats.skipped += 1;
                }
            }
        }

        log::info!(
            "Loaded {} variables from {} ({} files, {} skipped, {} duplicates)",
            corpus.stats.extracted,
            root.display(),
            corpus.stats.files_scanned,
            corpus.stats.skipped,
            corpus.stats.duplicates
        );

        Ok(corpus)
    }

    /// Build a corpus from already-extracted records; first record per identity wins.
    pub fn from_records<I: IntoIterator<Item = VariableRecord>>(records: I) -> Self {
        let mut corpus = Self::default();
        for record in records {
            corpus.admit(record);
        }
        corpus
    }

    fn admit(&mut self, mut record: VariableRecord) {
        record.remove_self_references();
        if self.records.contains_key(&record.identity) {
            log::warn!(
                "Duplicate variable {} ignored ({})",
                record.identity,
                record
                    .source_path
                    .as_deref()
                    .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
            );
            self.stats.duplicates += 1;
            return;
        }
        self.stats.extracted += 1;
        self.records.insert(record.identity.clone(), record);
    }

    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&VariableRecord> {
        self.records.get(identity)
    }

    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.records.contains_key(identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Records in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableRecord> {
        self.records.values()
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<VariableSummary> {
        self.iter().map(VariableSummary::from).collect()
    }

    /// Case-insensitive substring search over identity and label.
    ///
    /// Exact identity matches rank first, then identity prefixes, then alphabetical.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<VariableSummary> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < MIN_SEARCH_QUERY_LEN {
            return Vec::new();
        }

        let mut hits: Vec<&VariableRecord> = self
            .iter()
            .filter(|record| {
                record.identity.to_lowercase().contains(&query)
                    || record.display_label().to_lowercase().contains(&query)
            })
            .collect();

        hits.sort_by_cached_key(|record| {
            let name = record.identity.to_lowercase();
            (name != query, !name.starts_with(&query), name)
        });

        hits.into_iter()
            .take(limit)
            .map(VariableSummary::from)
            .collect()
    }
}

fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name == "__pycache__" || (name.starts_with("__") && entry.depth() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(identity: &str, label: &str) -> VariableRecord {
        let mut record = VariableRecord::new(identity);
        record.label = Some(label.to_string());
        record
    }

    fn corpus() -> VariableCorpus {
        VariableCorpus::from_records(vec![
            record("snap_gross_income", "SNAP gross income"),
            record("snap", "SNAP allotment"),
            record("is_snap_eligible", "SNAP eligible"),
            record("employment_income", "Employment income"),
        ])
    }

    #[test]
    fn test_search_ranks_exact_then_prefix_then_name() {
        let names: Vec<_> = corpus()
            .search("snap", DEFAULT_SEARCH_LIMIT)
            .into_iter()
            .map(|summary| summary.name)
            .collect();
        assert_eq!(names, vec!["snap", "snap_gross_income", "is_snap_eligible"]);
    }

    #[test]
    fn test_search_matches_labels_and_respects_limit() {
        let corpus = corpus();
        assert_eq!(corpus.search("EMPLOYMENT", 10).len(), 1);
        assert_eq!(corpus.search("snap", 1).len(), 1);
    }

    #[test]
    fn test_short_queries_return_nothing() {
        assert!(corpus().search("s", DEFAULT_SEARCH_LIMIT).is_empty());
    }

    #[test]
    fn test_in_memory_records_lose_self_references() {
        let mut income = record("income", "Income");
        income.formula_variables.insert("income".to_string());
        income.formula_variables.insert("wages".to_string());
        income.defined_for = vec!["income".to_string()];

        let corpus = VariableCorpus::from_records([income]);
        let income = corpus.get("income").unwrap();

        assert_eq!(
            income.formula_variables.iter().collect::<Vec<_>>(),
            vec!["wages"]
        );
        assert!(income.defined_for.is_empty());
    }

    #[test]
    fn test_first_record_wins_on_duplicates() {
        let corpus = VariableCorpus::from_records(vec![
            record("snap", "first"),
            record("snap", "second"),
        ]);
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get("snap").unwrap().display_label(), "first");
        assert_eq!(corpus.stats().duplicates, 1);
    }
}
