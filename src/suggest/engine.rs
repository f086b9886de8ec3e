//! Suggestion entry point.
//!
//! `suggest` is a pure read over an injected `Catalog`: each mode
//! selects candidates with its own matching strategy, then every mode
//! goes through the same ranking and truncation step.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};

use crate::catalog::normalize::normalize_title;
use crate::catalog::Catalog;
use crate::models::{
    CatalogEntry, SuggestMode, SuggestRequest, Suggestion, SuggestionResult, SuggestionSummary,
    MIN_QUERY_CHARS, SUGGESTION_LIMIT, SUGGESTION_RESULT_VERSION,
};
use crate::suggest::trigram::TrigramIndex;

/// Longest regular expression accepted, in bytes.
pub const MAX_PATTERN_LEN: usize = 512;

/// Upper bound on the compiled program and lazy DFA cache for a
/// user-supplied regex.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Why a candidate ranks where it does.
#[derive(Debug, Clone, Copy)]
enum Relevance {
    /// Keep catalog order.
    CatalogOrder,
    /// Char offset of the first occurrence of the query.
    Position(usize),
    /// Cosine similarity, higher is better.
    Score(f64),
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    order: usize,
    entry: &'a CatalogEntry,
    relevance: Relevance,
}

/// Compute up to `SUGGESTION_LIMIT` suggestions for `request`.
///
/// Never fails: a query that is too short, an empty query, or a
/// regular expression that does not compile all produce an empty
/// result.
pub fn suggest(catalog: &Catalog, request: &SuggestRequest) -> SuggestionResult {
    let entries = catalog.entries(request.field);

    let candidates = match request.mode {
        SuggestMode::Prefix => substring_candidates(entries, &request.query),
        SuggestMode::Regex => regex_candidates(entries, &request.query),
        SuggestMode::Trigram => {
            trigram_candidates(entries, catalog.trigrams(request.field), &request.query)
        }
    };

    finish(request, candidates)
}

/// Normalized query, or `None` when it is too short to suggest on.
fn normalized_query(raw: &str) -> Option<String> {
    let query = normalize_title(raw);
    (query.chars().count() >= MIN_QUERY_CHARS).then_some(query)
}

fn substring_candidates<'a>(entries: &'a [CatalogEntry], raw: &str) -> Vec<Candidate<'a>> {
    let Some(query) = normalized_query(raw) else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(order, entry)| {
            let byte_offset = entry.normalized.find(&query)?;
            let position = entry.normalized[..byte_offset].chars().count();
            Some(Candidate {
                order,
                entry,
                relevance: Relevance::Position(position),
            })
        })
        .collect()
}

fn regex_candidates<'a>(entries: &'a [CatalogEntry], pattern: &str) -> Vec<Candidate<'a>> {
    let Some(regex) = compile_user_regex(pattern) else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| regex.is_match(&entry.display))
        .map(|(order, entry)| Candidate {
            order,
            entry,
            relevance: Relevance::CatalogOrder,
        })
        .collect()
}

fn trigram_candidates<'a>(
    entries: &'a [CatalogEntry],
    index: &TrigramIndex,
    raw: &str,
) -> Vec<Candidate<'a>> {
    let Some(query) = normalized_query(raw) else {
        return Vec::new();
    };

    index
        .rank(&query)
        .into_iter()
        .filter_map(|(order, score)| {
            entries.get(order).map(|entry| Candidate {
                order,
                entry,
                relevance: Relevance::Score(score),
            })
        })
        .collect()
}

/// Compile a user-supplied pattern with bounded size, or `None` when
/// it is empty, too long, or invalid.
pub fn compile_user_regex(pattern: &str) -> Option<Regex> {
    if pattern.is_empty() || pattern.len() > MAX_PATTERN_LEN {
        return None;
    }

    match RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_SIZE_LIMIT)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::debug!(%pattern, error = %err, "rejected suggestion regex");
            None
        }
    }
}

fn compare(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    let by_text = || {
        a.entry
            .normalized
            .chars()
            .count()
            .cmp(&b.entry.normalized.chars().count())
            .then_with(|| a.entry.normalized.cmp(&b.entry.normalized))
            .then_with(|| a.entry.display.cmp(&b.entry.display))
    };

    let primary = match (a.relevance, b.relevance) {
        (Relevance::Position(pa), Relevance::Position(pb)) => pa.cmp(&pb).then_with(by_text),
        (Relevance::Score(sa), Relevance::Score(sb)) => sb.total_cmp(&sa).then_with(by_text),
        _ => Ordering::Equal,
    };

    primary.then_with(|| a.order.cmp(&b.order))
}

fn finish(request: &SuggestRequest, mut candidates: Vec<Candidate<'_>>) -> SuggestionResult {
    let total_matches = candidates.len();
    candidates.sort_by(compare);

    let suggestions = candidates
        .iter()
        .take(SUGGESTION_LIMIT)
        .map(|candidate| Suggestion::from(candidate.entry))
        .collect();

    SuggestionResult {
        version: SUGGESTION_RESULT_VERSION.to_string(),
        query: request.query.clone(),
        mode: request.mode,
        field: request.field,
        suggestions,
        summary: SuggestionSummary {
            total_matches: total_matches as u64,
            truncated: total_matches > SUGGESTION_LIMIT,
        },
    }
}
