// ⚖️ Merge Engine - Reconcile a server batch into the local collection
//
// Precedence rule: the server always wins. There is no timestamp or version
// vector in the data model, so a category mismatch on matching text is
// resolved by taking the incoming category (last-writer-wins with a fixed
// writer).
//
// The merge is idempotent: re-running the same batch against the merged
// collection changes nothing, because every match now agrees in both text
// and category.

use crate::quote::Quote;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFLICT RECORD
// ============================================================================

/// One resolved category conflict: same text, different category between
/// local and incoming data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConflict {
    /// Content fingerprint of the quote (quotes have no id).
    pub fingerprint: String,
    pub text: String,
    pub local_category: String,
    pub server_category: String,
}

// ============================================================================
// MERGE REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    pub incoming_count: usize,
    /// Quotes appended because no local text matched.
    pub added: usize,
    /// Quotes whose category was replaced by the server's.
    pub updated: usize,
    pub conflicts: Vec<CategoryConflict>,
    pub merged_at: DateTime<Utc>,
}

impl MergeReport {
    pub fn conflict_occurred(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "merged {} incoming: {} added, {} updated, {} conflict(s) resolved (server preferred)",
            self.incoming_count,
            self.added,
            self.updated,
            self.conflicts.len()
        )
    }
}

// ============================================================================
// MERGE ENGINE
// ============================================================================

pub struct MergeEngine;

impl MergeEngine {
    pub fn new() -> Self {
        MergeEngine
    }

    /// Merge an incoming batch into `local`.
    ///
    /// For each incoming quote, the first local entry with equal text is
    /// canonical:
    /// - no match: append the incoming quote (the collection grows
    ///   monotonically; remote deletions are never reflected)
    /// - match, same category: no-op
    /// - match, different category: replace the local category with the
    ///   incoming one and record a conflict
    pub fn merge(&self, local: &mut Vec<Quote>, incoming: &[Quote]) -> MergeReport {
        let mut added = 0;
        let mut updated = 0;
        let mut conflicts = Vec::new();

        for server_quote in incoming {
            match local.iter().position(|q| q.text == server_quote.text) {
                None => {
                    local.push(server_quote.clone());
                    added += 1;
                }
                Some(index) if local[index].category == server_quote.category => {
                    // Already in agreement
                }
                Some(index) => {
                    conflicts.push(CategoryConflict {
                        fingerprint: server_quote.fingerprint(),
                        text: server_quote.text.clone(),
                        local_category: local[index].category.clone(),
                        server_category: server_quote.category.clone(),
                    });
                    local[index].category = server_quote.category.clone();
                    updated += 1;
                }
            }
        }

        MergeReport {
            incoming_count: incoming.len(),
            added,
            updated,
            conflicts,
            merged_at: Utc::now(),
        }
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::seed_quotes;

    fn q(text: &str, category: &str) -> Quote {
        Quote::new(text, category)
    }

    #[test]
    fn test_server_precedence_on_category_mismatch() {
        let engine = MergeEngine::new();
        let mut local = vec![q("Q", "A")];
        let incoming = vec![q("Q", "B")];

        let report = engine.merge(&mut local, &incoming);

        assert_eq!(local.len(), 1);
        assert_eq!(local[0], q("Q", "B"));
        assert!(report.conflict_occurred());
        assert_eq!(report.updated, 1);
        assert_eq!(report.added, 0);
        assert_eq!(report.conflicts[0].local_category, "A");
        assert_eq!(report.conflicts[0].server_category, "B");

        println!("✅ {}", report.summary());
    }

    #[test]
    fn test_noop_on_agreement() {
        let engine = MergeEngine::new();
        let mut local = vec![q("Q", "A")];
        let incoming = vec![q("Q", "A")];

        let report = engine.merge(&mut local, &incoming);

        assert_eq!(local, vec![q("Q", "A")]);
        assert!(!report.conflict_occurred());
        assert!(!report.changed());
    }

    #[test]
    fn test_new_quote_appended() {
        let engine = MergeEngine::new();
        let mut local = seed_quotes();
        let before = local.len();
        let incoming = vec![q("A brand new quote", "General")];

        let report = engine.merge(&mut local, &incoming);

        assert_eq!(local.len(), before + 1);
        assert_eq!(report.added, 1);
        assert!(!report.conflict_occurred());
        assert!(local.contains(&q("A brand new quote", "General")));
    }

    #[test]
    fn test_monotonic_growth() {
        let engine = MergeEngine::new();
        let mut local = seed_quotes();
        let before = local.len();

        let incoming = vec![
            q("Stay hungry, stay foolish.", "General"),
            q("fresh one", "General"),
            q("another fresh one", "General"),
        ];
        engine.merge(&mut local, &incoming);

        assert!(local.len() >= before);
        assert_eq!(local.len(), before + 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let engine = MergeEngine::new();
        let mut local = seed_quotes();
        let incoming = vec![
            q("Stay hungry, stay foolish.", "General"),
            q("brand new", "General"),
        ];

        let first = engine.merge(&mut local, &incoming);
        assert!(first.conflict_occurred());

        let after_first = local.clone();
        let second = engine.merge(&mut local, &incoming);

        assert_eq!(local, after_first);
        assert!(!second.conflict_occurred());
        assert!(!second.changed());
    }

    #[test]
    fn test_result_is_order_independent() {
        let engine = MergeEngine::new();
        let incoming_a = vec![q("x", "General"), q("Stay hungry, stay foolish.", "General")];
        let incoming_b = vec![q("Stay hungry, stay foolish.", "General"), q("x", "General")];

        let mut local_a = seed_quotes();
        let mut local_b = seed_quotes();
        engine.merge(&mut local_a, &incoming_a);
        engine.merge(&mut local_b, &incoming_b);

        // Each update only touches its matched index, so permuting the
        // incoming batch permutes nothing but the append order of new
        // quotes.
        let mut sorted_a = local_a.clone();
        let mut sorted_b = local_b.clone();
        sorted_a.sort_by(|l, r| l.text.cmp(&r.text));
        sorted_b.sort_by(|l, r| l.text.cmp(&r.text));
        assert_eq!(sorted_a, sorted_b);
    }

    #[test]
    fn test_first_match_is_canonical() {
        let engine = MergeEngine::new();
        // Pre-existing duplicate text (legacy data): only the first entry
        // is updated.
        let mut local = vec![q("dup", "A"), q("dup", "B")];
        let incoming = vec![q("dup", "C")];

        let report = engine.merge(&mut local, &incoming);

        assert_eq!(local[0], q("dup", "C"));
        assert_eq!(local[1], q("dup", "B"));
        assert_eq!(report.updated, 1);
    }

    #[test]
    fn test_empty_incoming_is_noop() {
        let engine = MergeEngine::new();
        let mut local = seed_quotes();
        let before = local.clone();

        let report = engine.merge(&mut local, &[]);

        assert_eq!(local, before);
        assert_eq!(report.incoming_count, 0);
        assert!(!report.changed());
    }
}
