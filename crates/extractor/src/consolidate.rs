//! Parameter-map consolidation.
//!
//! When more than `threshold` distinct leaves share a parent path (`p.a`, `p.b`, ... `p.f`)
//! they collapse into a single entry for the parent. Leaves that are all upper-case category
//! words (`SINGLE`, `JOINT`, ...) stay separate.
//!
//! Heuristic: a collapsed entry is not guaranteed to be one semantic parameter.

use crate::formula::ParameterUse;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

pub(crate) const DEFAULT_CONSOLIDATION_THRESHOLD: usize = 4;

pub(crate) fn consolidate(uses: &[ParameterUse], threshold: usize) -> IndexMap<String, String> {
    let mut groups: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for usage in uses {
        if let Some(group) = usage.group.as_deref() {
            groups.entry(group).or_default().insert(usage.key.as_str());
        }
    }

    let collapsed: HashSet<&str> = groups
        .iter()
        .filter(|(_, keys)| keys.len() > threshold && !keys.iter().all(|key| is_category_word(key)))
        .map(|(group, _)| *group)
        .collect();

    let mut parameters = IndexMap::new();
    for usage in uses {
        match usage.group.as_deref() {
            Some(group) if collapsed.contains(group) => {
                let key = group.rsplit('.').next().unwrap_or(group);
                parameters.insert(key.to_string(), group.to_string());
            }
            _ => {
                parameters.insert(usage.key.clone(), usage.path.clone());
            }
        }
    }
    parameters
}

fn is_category_word(key: &str) -> bool {
    key.chars().any(|c| c.is_ascii_uppercase())
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
