//! Character trigram index with TF-IDF cosine scoring.
//!
//! Each normalized entry is split into overlapping three-character
//! windows. Trigrams are weighted with a smoothed inverse document
//! frequency, `1 + ln((1 + N) / (1 + df))`, so rare trigrams weigh
//! more than common ones. An entry's weight for a trigram is the
//! number of times it occurs times its IDF; a query weighs each of
//! its distinct trigrams by IDF alone.
//!
//! Trigram strings are interned to dense ids at build time; postings
//! and per-entry weight vectors are stored sorted by id.

use std::collections::{BTreeSet, HashMap};

use crate::models::CatalogEntry;

/// Immutable trigram index over one catalog field.
#[derive(Debug, Default)]
pub struct TrigramIndex {
    vocabulary: HashMap<String, u32>,
    idfs: Vec<f64>,
    /// Trigram id -> sorted entry indexes containing it.
    postings: Vec<Vec<u32>>,
    /// Entry index -> (trigram id, weight) sorted by trigram id.
    weights: Vec<Vec<(u32, f64)>>,
    norms: Vec<f64>,
}

/// All overlapping three-character windows of `text`, in order.
pub fn trigrams(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .windows(3)
        .map(|window| window.iter().collect())
        .collect()
}

impl TrigramIndex {
    /// Build the index from entries' normalized text. Entry indexes
    /// in the index follow the order of `entries`.
    pub fn build(entries: &[CatalogEntry]) -> Self {
        let mut vocabulary: HashMap<String, u32> = HashMap::new();
        let mut postings: Vec<Vec<u32>> = Vec::new();
        let mut counts: Vec<Vec<(u32, u32)>> = Vec::with_capacity(entries.len());

        for (entry_index, entry) in entries.iter().enumerate() {
            let mut per_entry: HashMap<u32, u32> = HashMap::new();
            for trigram in trigrams(&entry.normalized) {
                let next_id = vocabulary.len() as u32;
                let id = *vocabulary.entry(trigram).or_insert_with(|| {
                    postings.push(Vec::new());
                    next_id
                });
                *per_entry.entry(id).or_insert(0) += 1;
            }

            let mut per_entry: Vec<(u32, u32)> = per_entry.into_iter().collect();
            per_entry.sort_unstable_by_key(|(id, _)| *id);
            for (id, _) in &per_entry {
                postings[*id as usize].push(entry_index as u32);
            }
            counts.push(per_entry);
        }

        let total = entries.len() as f64;
        let idfs: Vec<f64> = postings
            .iter()
            .map(|posting| 1.0 + ((1.0 + total) / (1.0 + posting.len() as f64)).ln())
            .collect();

        let weights: Vec<Vec<(u32, f64)>> = counts
            .into_iter()
            .map(|per_entry| {
                per_entry
                    .into_iter()
                    .map(|(id, count)| (id, count as f64 * idfs[id as usize]))
                    .collect()
            })
            .collect();

        let norms = weights
            .iter()
            .map(|vector| vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt())
            .collect();

        Self {
            vocabulary,
            idfs,
            postings,
            weights,
            norms,
        }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Number of distinct trigrams across all entries.
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Score every candidate entry for a normalized query and return
    /// `(entry index, cosine score)` pairs with a positive score, in
    /// entry order.
    ///
    /// Candidates are the entries that contain every trigram of the
    /// query, plus the entries that contain every trigram of each
    /// space-separated query word (so word order does not matter).
    pub fn rank(&self, query: &str) -> Vec<(usize, f64)> {
        let query_ids: BTreeSet<u32> = trigrams(query)
            .iter()
            .filter_map(|trigram| self.vocabulary.get(trigram).copied())
            .collect();

        let query_norm = query_ids
            .iter()
            .map(|id| self.idfs[*id as usize].powi(2))
            .sum::<f64>()
            .sqrt();
        if query_norm == 0.0 {
            return Vec::new();
        }

        self.candidates(query)
            .into_iter()
            .filter_map(|entry_index| {
                let entry_index = entry_index as usize;
                let entry_norm = self.norms[entry_index];
                if entry_norm == 0.0 {
                    return None;
                }
                let dot: f64 = self.weights[entry_index]
                    .iter()
                    .filter(|(id, _)| query_ids.contains(id))
                    .map(|(id, weight)| weight * self.idfs[*id as usize])
                    .sum();
                let score = dot / query_norm / entry_norm;
                (score > 0.0).then_some((entry_index, score))
            })
            .collect()
    }

    fn candidates(&self, query: &str) -> Vec<u32> {
        let whole = self.containing_all(&trigrams(query));

        let mut words = query.split(' ').map(|word| self.containing_all(&trigrams(word)));
        let per_word = match words.next() {
            Some(first) => words.fold(first, |acc, next| intersect_sorted(&acc, &next)),
            None => Vec::new(),
        };

        union_sorted(&whole, &per_word)
    }

    /// Entries containing every trigram in `trigrams`; empty when
    /// `trigrams` is empty or any trigram is unknown.
    fn containing_all(&self, trigrams: &[String]) -> Vec<u32> {
        if trigrams.is_empty() {
            return Vec::new();
        }

        let mut lists: Vec<&Vec<u32>> = Vec::with_capacity(trigrams.len());
        for trigram in trigrams {
            match self.vocabulary.get(trigram) {
                Some(id) => lists.push(&self.postings[*id as usize]),
                None => return Vec::new(),
            }
        }
        lists.sort_by_key(|list| list.len());

        let mut result = lists[0].clone();
        for list in &lists[1..] {
            if result.is_empty() {
                break;
            }
            result = intersect_sorted(&result, list);
        }
        result
    }
}

fn intersect_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn union_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let next = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) if x == y => {
                i += 1;
                j += 1;
                *x
            }
            (Some(x), Some(y)) if x < y => {
                i += 1;
                *x
            }
            (_, Some(y)) => {
                j += 1;
                *y
            }
            (Some(x), None) => {
                i += 1;
                *x
            }
            (None, None) => break,
        };
        out.push(next);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::normalize::normalize_title;

    fn entries(titles: &[&str]) -> Vec<CatalogEntry> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| CatalogEntry {
                display: title.to_string(),
                normalized: normalize_title(title),
                id: (i + 1).to_string(),
            })
            .collect()
    }

    #[test]
    fn trigrams_are_char_windows() {
        assert_eq!(trigrams("abcd"), vec!["abc", "bcd"]);
        assert_eq!(trigrams("é€x"), vec!["é€x"]);
        assert!(trigrams("ab").is_empty());
    }

    #[test]
    fn build_computes_smoothed_idf() {
        let index = TrigramIndex::build(&entries(&["abcd", "abce"]));
        assert_eq!(index.len(), 2);
        assert_eq!(index.vocabulary_len(), 3);

        let shared = index.vocabulary["abc"] as usize;
        let rare = index.vocabulary["bcd"] as usize;
        assert!((index.idfs[shared] - 1.0).abs() < 1e-9);
        assert!((index.idfs[rare] - (1.0 + (3.0f64 / 2.0).ln())).abs() < 1e-9);
    }

    #[test]
    fn rank_requires_all_query_trigrams() {
        let index = TrigramIndex::build(&entries(&["moby dick", "dick tracy", "mobile"]));
        let ranked: Vec<usize> = index.rank("moby").into_iter().map(|(i, _)| i).collect();
        assert_eq!(ranked, vec![0]);
    }

    #[test]
    fn rank_matches_words_in_any_order() {
        let index = TrigramIndex::build(&entries(&["the whale moby dick", "moby", "dick"]));
        let ranked: Vec<usize> = index
            .rank("dick moby")
            .into_iter()
            .map(|(i, _)| i)
            .collect();
        assert_eq!(ranked, vec![0]);
    }

    #[test]
    fn rank_scores_exact_match_highest() {
        let index = TrigramIndex::build(&entries(&[
            "frankenstein or the modern prometheus",
            "frankenstein",
        ]));
        let ranked = index.rank("frankenstein");
        assert_eq!(ranked.len(), 2);
        assert!(ranked[1].1 > ranked[0].1);
        assert!((ranked[1].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rank_returns_nothing_for_unknown_or_short_queries() {
        let index = TrigramIndex::build(&entries(&["moby dick"]));
        assert!(index.rank("zzz").is_empty());
        assert!(index.rank("mo").is_empty());
    }

    #[test]
    fn sorted_set_helpers() {
        assert_eq!(intersect_sorted(&[1, 3, 5], &[3, 4, 5]), vec![3, 5]);
        assert_eq!(union_sorted(&[1, 3, 5], &[2, 3, 6]), vec![1, 2, 3, 5, 6]);
        assert_eq!(union_sorted(&[], &[2]), vec![2]);
    }
}
