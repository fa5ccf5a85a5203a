//! Within-batch duplicate identifier repair
//!
//! External identifiers are only trusted after this stage: every
//! identity-addressed operation (category edits, pair detection) assumes
//! pairwise-distinct ids, so the batch is repaired once, up front, instead of
//! patching collisions wherever they happen to surface.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::Transaction;

/// One id rewrite performed by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRewrite {
    pub original_id: String,
    pub new_id: String,
    /// Position of the rewritten transaction in the batch
    pub position: usize,
}

/// Structured report of what the resolver changed
///
/// Duplicate ids are recovered automatically; the report exists for
/// observability, never as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateIdReport {
    pub rewrites: Vec<IdRewrite>,
}

impl DuplicateIdReport {
    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rewrites.len()
    }
}

/// Repair non-unique ids within a batch.
///
/// The first occurrence of an id keeps it unchanged; later occurrences are
/// rewritten with a deterministic incrementing suffix (`<id>-2`, `<id>-3`,
/// ...), skipping forward when a candidate collides with any id already in
/// the batch. Order of the batch is preserved.
pub fn resolve_duplicate_ids(
    mut transactions: Vec<Transaction>,
) -> (Vec<Transaction>, DuplicateIdReport) {
    // Every id present in the input is reserved: first occurrences keep
    // theirs, so a rewrite may not claim one even if it appears later.
    let mut taken: HashSet<String> = transactions.iter().map(|t| t.id.clone()).collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(transactions.len());
    let mut rewrites = Vec::new();

    for (position, tx) in transactions.iter_mut().enumerate() {
        if seen.insert(tx.id.clone()) {
            continue;
        }

        let original_id = tx.id.clone();
        let mut suffix = 2usize;
        let mut candidate = format!("{}-{}", original_id, suffix);
        while taken.contains(&candidate) || seen.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}-{}", original_id, suffix);
        }

        debug!(
            position,
            original_id = original_id.as_str(),
            new_id = candidate.as_str(),
            "rewrote duplicate transaction id"
        );

        taken.insert(candidate.clone());
        seen.insert(candidate.clone());
        tx.id = candidate.clone();
        rewrites.push(IdRewrite {
            original_id,
            new_id: candidate,
            position,
        });
    }

    if !rewrites.is_empty() {
        warn!(
            "Repaired {} duplicate transaction id(s) within the batch",
            rewrites.len()
        );
    }

    (transactions, DuplicateIdReport { rewrites })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;

    fn tx(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount: 10.0,
            tx_type: TransactionType::Expense,
            description: "Compra".to_string(),
            original_description: "Compra".to_string(),
            category_id: None,
            subcategory_id: None,
            original_data: None,
            ai_suggestion: None,
        }
    }

    fn ids(transactions: &[Transaction]) -> Vec<&str> {
        transactions.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_two_rows_sharing_an_id() {
        let (resolved, report) = resolve_duplicate_ids(vec![tx("TX1"), tx("TX1")]);
        assert_eq!(ids(&resolved), vec!["TX1", "TX1-2"]);
        assert_eq!(report.len(), 1);
        assert_eq!(report.rewrites[0].original_id, "TX1");
        assert_eq!(report.rewrites[0].new_id, "TX1-2");
        assert_eq!(report.rewrites[0].position, 1);
    }

    #[test]
    fn test_unique_batch_is_untouched() {
        let (resolved, report) = resolve_duplicate_ids(vec![tx("TX1"), tx("TX2")]);
        assert_eq!(ids(&resolved), vec!["TX1", "TX2"]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_triple_collision_gets_incrementing_suffixes() {
        let (resolved, report) = resolve_duplicate_ids(vec![tx("TX1"), tx("TX1"), tx("TX1")]);
        assert_eq!(ids(&resolved), vec!["TX1", "TX1-2", "TX1-3"]);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_rewrite_avoids_naturally_occurring_suffix_id() {
        // A later row already owns "TX1-2"; the rewrite must skip past it.
        let (resolved, report) =
            resolve_duplicate_ids(vec![tx("TX1"), tx("TX1"), tx("TX1-2")]);
        assert_eq!(ids(&resolved), vec!["TX1", "TX1-3", "TX1-2"]);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_resulting_ids_are_pairwise_distinct() {
        let batch = vec![tx("A"), tx("A"), tx("A-2"), tx("A-2"), tx("B"), tx("A")];
        let (resolved, _) = resolve_duplicate_ids(batch);
        let unique: HashSet<_> = resolved.iter().map(|t| t.id.clone()).collect();
        assert_eq!(unique.len(), resolved.len());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let batch = vec![tx("A"), tx("A"), tx("B"), tx("A")];
        let (first, _) = resolve_duplicate_ids(batch.clone());
        let (second, _) = resolve_duplicate_ids(batch);
        assert_eq!(ids(&first), ids(&second));
    }
}
