//! Text normalization shared by the catalog loader and the
//! suggestion engine.
//!
//! Normalization is what makes `napoléon` find "Napoléon et la
//! campagne de Russie":
//! - Unicode lowercase mapping.
//! - NFKD decomposition with combining marks dropped (accent folding).
//! - ASCII punctuation replaced by spaces, except `-` and `'` which
//!   are kept for compound names such as `saint-exupéry` or `o'connor`.
//! - Runs of whitespace collapsed to a single space and trimmed.
//!
//! Author names additionally go through `normalize_author`, which
//! strips dates and bracketed notes and folds initials.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const KEPT_PUNCTUATION: [char; 2] = ['-', '\''];

/// Normalize arbitrary text for matching.
pub fn base_normalize(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let lowered = input.to_lowercase();
    let mut folded = String::with_capacity(lowered.len());
    for ch in lowered.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_punctuation() && !KEPT_PUNCTUATION.contains(&ch) {
            folded.push(' ');
        } else {
            folded.push(ch);
        }
    }

    collapse_whitespace(&folded)
}

/// Normalize a book title (or a user query typed against titles).
pub fn normalize_title(title: &str) -> String {
    base_normalize(title)
}

/// Normalize a single author name as it appears in the Gutenberg
/// `Authors` column, e.g. `Tolkien, J. R. R. (John Ronald Reuel), 1892-1973`.
pub fn normalize_author(author: &str) -> String {
    if author.trim().is_empty() {
        return String::new();
    }

    let expanded = expand_initials(author);
    let without_notes = bracketed_re().replace_all(&expanded, " ");
    let without_dates = digits_re().replace_all(&without_notes, " ");
    let normalized = base_normalize(&without_dates);
    let glued = isolated_letter_re().replace_all(&normalized, "${1}");

    collapse_whitespace(glued.trim_matches('-'))
}

/// Split a raw `Authors` cell on `;` and pair each raw name with its
/// normalized form. Names that normalize to nothing are dropped.
pub fn split_authors(raw: &str) -> impl Iterator<Item = (&str, String)> + '_ {
    raw.split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| (name, normalize_author(name)))
        .filter(|(_, normalized)| !normalized.is_empty())
}

/// Replace initials followed by a parenthesized full name with that
/// full name when every initial matches, so that
/// `J. R. R. (John Ronald Reuel)` reads as the full name.
fn expand_initials(author: &str) -> String {
    let mut result = author.to_string();
    for captures in initials_re().captures_iter(author) {
        let (Some(initials), Some(full_name)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        if initials_match(initials.as_str(), full_name.as_str()) {
            result = result.replace(initials.as_str(), full_name.as_str());
        }
    }
    result
}

fn initials_match(initials: &str, full_name: &str) -> bool {
    let initials: Vec<&str> = initials.split(' ').filter(|s| !s.is_empty()).collect();
    let names: Vec<&str> = full_name.split(' ').filter(|s| !s.is_empty()).collect();

    initials.len() == names.len()
        && initials
            .iter()
            .zip(&names)
            .all(|(initial, name)| initial.chars().next() == name.chars().next())
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn initials_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"((?:(?:\w+ )|(?:\w\. ))+)\(((?:\w+ ?)+?)\)").expect("valid initials pattern")
    })
}

fn bracketed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[(\[{].*?[)\]}]").expect("valid bracket pattern"))
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digits pattern"))
}

fn isolated_letter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([a-z])\b(?:\s+|\.)").expect("valid letter pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_normalize_folds_case_and_accents() {
        assert_eq!(
            base_normalize("Napoléon et la campagne de Russie"),
            "napoleon et la campagne de russie"
        );
        assert_eq!(base_normalize("ÉLÉGIES"), "elegies");
    }

    #[test]
    fn base_normalize_replaces_punctuation_but_keeps_hyphen_and_apostrophe() {
        assert_eq!(
            base_normalize("Moby Dick; Or, The Whale"),
            "moby dick or the whale"
        );
        assert_eq!(base_normalize("L'Île  mystérieuse!"), "l'ile mysterieuse");
        assert_eq!(base_normalize("Saint-Exupéry"), "saint-exupery");
    }

    #[test]
    fn base_normalize_handles_empty_and_blank_input() {
        assert_eq!(base_normalize(""), "");
        assert_eq!(base_normalize("  ...  "), "");
    }

    #[test]
    fn normalize_author_expands_matching_initials() {
        assert_eq!(
            normalize_author("Tolkien, J. R. R. (John Ronald Reuel), 1892-1973"),
            "tolkien john ronald reuel"
        );
    }

    #[test]
    fn normalize_author_drops_dates_and_notes() {
        assert_eq!(normalize_author("Dumas, Alexandre, 1802-1870"), "dumas alexandre");
        assert_eq!(
            normalize_author("Verne, Jules [Translator]"),
            "verne jules"
        );
    }

    #[test]
    fn normalize_author_glues_isolated_letters() {
        assert_eq!(normalize_author("Rowling, J. K."), "rowling jk");
        assert_eq!(normalize_author("O'Connor, Flannery"), "o'connor flannery");
    }

    #[test]
    fn split_authors_skips_empty_names() {
        let authors: Vec<(&str, String)> =
            split_authors("Dumas, Alexandre, 1802-1870; ; 1900-1950").collect();
        assert_eq!(
            authors,
            vec![("Dumas, Alexandre, 1802-1870", "dumas alexandre".to_string())]
        );
    }
}
