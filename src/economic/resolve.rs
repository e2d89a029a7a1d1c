//! Industry name resolution shared by every per-industry table lookup.
//!
//! Industry names coming from BLS files, config overrides and hand-written
//! inputs disagree on case and punctuation ("Trade, Transportation, and
//! Utilities" vs "trade transportation and utilities"). Lookups go through
//! one ordered fallback: exact, case-insensitive, then normalized
//! (lowercase with spaces and commas removed).

use std::collections::BTreeMap;

/// Which tier of [`resolve_industry_key`] produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    Normalized,
}

/// Lowercase, strip spaces and commas.
pub fn normalize_industry_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != ',')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find the table key naming the same industry as `name`.
pub fn resolve_industry_key<'a, V>(
    name: &str,
    table: &'a BTreeMap<String, V>,
) -> Option<(&'a str, MatchTier)> {
    if let Some((key, _)) = table.get_key_value(name) {
        return Some((key.as_str(), MatchTier::Exact));
    }

    let lower = name.to_lowercase();
    if let Some(key) = table.keys().find(|k| k.to_lowercase() == lower) {
        return Some((key.as_str(), MatchTier::CaseInsensitive));
    }

    let normalized = normalize_industry_name(name);
    table
        .keys()
        .find(|k| normalize_industry_name(k) == normalized)
        .map(|key| (key.as_str(), MatchTier::Normalized))
}

/// Resolve and fetch, logging non-exact matches.
pub fn lookup<'a, V>(name: &str, table: &'a BTreeMap<String, V>) -> Option<&'a V> {
    let (key, tier) = resolve_industry_key(name, table)?;
    if tier != MatchTier::Exact {
        tracing::debug!(industry = name, matched = key, ?tier, "industry matched");
    }
    table.get(key)
}
