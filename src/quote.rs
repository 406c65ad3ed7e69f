// 📜 Quote Model - Records, seed data, filtering, validation
//
// A quote is a `{text, category}` value. The text is the natural identity
// key: there is no id column, so merging and duplicate detection both key
// on text content.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use thiserror::Error;

/// Sentinel category selecting the whole collection.
pub const CATEGORY_ALL: &str = "all";

// ============================================================================
// QUOTE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub category: String,
}

impl Quote {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Quote {
            text: text.into(),
            category: category.into(),
        }
    }

    /// Content-derived dedup key: SHA-256 hex digest of the text.
    ///
    /// Quotes carry no UUID, so history rows and the duplicate-add check
    /// identify a quote by this fingerprint instead.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// The two default quotes used when no persisted collection exists.
pub fn seed_quotes() -> Vec<Quote> {
    vec![
        Quote::new("Stay hungry, stay foolish.", "Motivation"),
        Quote::new(
            "Innovation distinguishes between a leader and a follower.",
            "Success",
        ),
    ]
}

// ============================================================================
// CATEGORY FILTERING
// ============================================================================

/// All categories present in the collection, sorted, with the "all"
/// sentinel first.
pub fn categories(quotes: &[Quote]) -> Vec<String> {
    let unique: BTreeSet<&str> = quotes.iter().map(|q| q.category.as_str()).collect();

    let mut out = Vec::with_capacity(unique.len() + 1);
    out.push(CATEGORY_ALL.to_string());
    out.extend(unique.into_iter().map(String::from));
    out
}

/// Filtered view of the collection. The "all" sentinel returns everything;
/// any other selector matches `category` exactly.
pub fn filter_by_category<'a>(quotes: &'a [Quote], selected: &str) -> Vec<&'a Quote> {
    if selected == CATEGORY_ALL {
        quotes.iter().collect()
    } else {
        quotes.iter().filter(|q| q.category == selected).collect()
    }
}

/// Uniform random pick from the filtered view. `None` when the view is
/// empty (unknown category, or an empty collection).
pub fn pick_random<'a>(quotes: &'a [Quote], selected: &str) -> Option<&'a Quote> {
    let filtered = filter_by_category(quotes, selected);
    filtered.choose(&mut rand::thread_rng()).copied()
}

// ============================================================================
// SUBMISSION VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("quote text must not be empty")]
    EmptyText,

    #[error("quote category must not be empty")]
    EmptyCategory,

    #[error("a quote with this text already exists")]
    DuplicateText,
}

/// Validate a user-submitted quote against the existing collection.
///
/// Both fields are trimmed and must be non-empty. Duplicate text is
/// rejected: the merge path treats text as the dedup key, so a second
/// quote with identical text would be unreachable to reconciliation.
pub fn validate_submission(
    text: &str,
    category: &str,
    existing: &[Quote],
) -> Result<Quote, ValidationError> {
    let text = text.trim();
    let category = category.trim();

    if text.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    if category.is_empty() {
        return Err(ValidationError::EmptyCategory);
    }

    let candidate = Quote::new(text, category);
    let fingerprint = candidate.fingerprint();
    if existing.iter().any(|q| q.fingerprint() == fingerprint) {
        return Err(ValidationError::DuplicateText);
    }

    Ok(candidate)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_two_quotes() {
        let seed = seed_quotes();
        assert_eq!(seed.len(), 2);
        assert_eq!(seed[0].category, "Motivation");
        assert_eq!(seed[1].category, "Success");
    }

    #[test]
    fn test_categories_sorted_with_sentinel_first() {
        let quotes = vec![
            Quote::new("q1", "Success"),
            Quote::new("q2", "Motivation"),
            Quote::new("q3", "Success"),
        ];

        let cats = categories(&quotes);
        assert_eq!(cats, vec!["all", "Motivation", "Success"]);

        println!("✅ Categories: {:?}", cats);
    }

    #[test]
    fn test_filter_by_category() {
        let quotes = vec![
            Quote::new("q1", "Motivation"),
            Quote::new("q2", "Success"),
            Quote::new("q3", "Motivation"),
        ];

        let motivation = filter_by_category(&quotes, "Motivation");
        assert_eq!(motivation.len(), 2);
        assert!(motivation.iter().all(|q| q.category == "Motivation"));

        let all = filter_by_category(&quotes, CATEGORY_ALL);
        assert_eq!(all.len(), 3);

        let unknown = filter_by_category(&quotes, "Philosophy");
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_pick_random_respects_filter() {
        let quotes = vec![
            Quote::new("q1", "Motivation"),
            Quote::new("q2", "Success"),
        ];

        // Single-member category always yields that member
        let picked = pick_random(&quotes, "Success").unwrap();
        assert_eq!(picked.text, "q2");

        assert!(pick_random(&quotes, CATEGORY_ALL).is_some());
        assert!(pick_random(&quotes, "Philosophy").is_none());
        assert!(pick_random(&[], CATEGORY_ALL).is_none());
    }

    #[test]
    fn test_validation_rejects_empty_fields() {
        let existing = seed_quotes();

        assert_eq!(
            validate_submission("", "Motivation", &existing),
            Err(ValidationError::EmptyText)
        );
        assert_eq!(
            validate_submission("   ", "Motivation", &existing),
            Err(ValidationError::EmptyText)
        );
        assert_eq!(
            validate_submission("Carpe diem.", "", &existing),
            Err(ValidationError::EmptyCategory)
        );
    }

    #[test]
    fn test_validation_rejects_duplicate_text() {
        let existing = seed_quotes();

        let result = validate_submission("Stay hungry, stay foolish.", "Wisdom", &existing);
        assert_eq!(result, Err(ValidationError::DuplicateText));
    }

    #[test]
    fn test_validation_trims_and_accepts() {
        let existing = seed_quotes();

        let quote = validate_submission("  Carpe diem.  ", " Philosophy ", &existing).unwrap();
        assert_eq!(quote.text, "Carpe diem.");
        assert_eq!(quote.category, "Philosophy");

        println!("✅ Accepted: {:?}", quote);
    }

    #[test]
    fn test_fingerprint_keys_on_text_only() {
        let a = Quote::new("same text", "CatA");
        let b = Quote::new("same text", "CatB");
        let c = Quote::new("other text", "CatA");

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
