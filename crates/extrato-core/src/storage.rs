//! Storage collaborator seam
//!
//! Persistence lives in the hosted database; the engine hands over the final
//! canonical list and surfaces duplicate-key errors to the caller without
//! resolving them. Within-batch id collisions are already repaired by the id
//! resolver before anything reaches a store.

use std::collections::HashMap;

use tracing::info;

use crate::error::Result;
use crate::models::Transaction;

/// Outcome of committing a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    pub inserted: usize,
    /// Ids rejected by the store because a record with the same key already
    /// exists (cross-batch collisions; not resolved here)
    pub duplicate_key_ids: Vec<String>,
}

/// Destination for the final canonical list of transactions
pub trait StatementStore {
    /// Batched insert of the whole list. Duplicate-key rejections are
    /// reported in the outcome, not raised as errors.
    fn commit(&mut self, transactions: &[Transaction]) -> Result<CommitOutcome>;
}

/// In-memory store used by tests and the CLI demo
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, Transaction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.records.get(id)
    }
}

impl StatementStore for MemoryStore {
    fn commit(&mut self, transactions: &[Transaction]) -> Result<CommitOutcome> {
        let mut outcome = CommitOutcome::default();

        for tx in transactions {
            if self.records.contains_key(&tx.id) {
                outcome.duplicate_key_ids.push(tx.id.clone());
                continue;
            }
            self.records.insert(tx.id.clone(), tx.clone());
            outcome.inserted += 1;
        }

        info!(
            "Committed {} transaction(s), {} duplicate key(s)",
            outcome.inserted,
            outcome.duplicate_key_ids.len()
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;

    fn tx(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
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

    #[test]
    fn test_commit_inserts_batch() {
        let mut store = MemoryStore::new();
        let outcome = store.commit(&[tx("A"), tx("B")]).unwrap();
        assert_eq!(outcome.inserted, 2);
        assert!(outcome.duplicate_key_ids.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_cross_batch_duplicates_are_surfaced_not_resolved() {
        let mut store = MemoryStore::new();
        store.commit(&[tx("A")]).unwrap();

        let outcome = store.commit(&[tx("A"), tx("B")]).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.duplicate_key_ids, vec!["A".to_string()]);
        assert_eq!(store.len(), 2);
    }
}
