//! Refund and PIX pair detection
//!
//! Scans the de-duplicated batch for pairs of statement lines that represent
//! a single real-world event: a purchase fully reversed (refund), or a PIX
//! debit settled by a same-amount incoming credit. Matched lines leave the
//! "needs category" surface and are composited into unified records.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::categories::CategoryCatalog;
use crate::models::{
    PixPair, RefundPair, Transaction, TransactionType, UnifiedStatus, UnifiedTransaction,
};

/// Reversal markers looked for in the income leg of a refund pair.
const REVERSAL_MARKERS: &[&str] = &["estorno", "devolução", "devolucao", "reembolso"];

/// Marker identifying a PIX-tagged debit.
const PIX_MARKERS: &[&str] = &["pix"];

/// Settlement markers looked for in the credit leg of a PIX pair.
const SETTLEMENT_MARKERS: &[&str] = &["pagamento recebido", "recebido", "crédito", "credito"];

/// Detection configuration
#[derive(Debug, Clone)]
pub struct RelationConfig {
    /// Pairing window in days, inclusive, on either side of the anchor line
    pub window_days: i64,
    /// Maximum absolute difference for two amounts to count as equal
    pub amount_tolerance: f64,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            window_days: 5,        // refunds and settlements land within days
            amount_tolerance: 0.005, // exact to the cent
        }
    }
}

/// Result of running pair detection over a batch
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    /// Transactions not consumed by any pair
    pub singles: Vec<Transaction>,
    pub refund_pairs: Vec<RefundPair>,
    pub pix_pairs: Vec<PixPair>,
}

impl DetectionResult {
    /// Unmatched transactions still awaiting a category assignment.
    ///
    /// Pair constituents never appear here: their unified record replaces
    /// them on the categorization surface.
    pub fn needs_category(&self) -> Vec<&Transaction> {
        self.singles.iter().filter(|t| t.needs_category()).collect()
    }

    /// One display/aggregation record per real-world event, pairs composited.
    ///
    /// Summing [`UnifiedTransaction::net_signed_amount`] over this list never
    /// double-counts a pair.
    pub fn unified(&self) -> Vec<UnifiedTransaction> {
        let mut records = Vec::with_capacity(
            self.singles.len() + self.refund_pairs.len() + self.pix_pairs.len(),
        );

        for tx in &self.singles {
            records.push(UnifiedTransaction {
                id: tx.id.clone(),
                status: UnifiedStatus::Normal,
                date: tx.date,
                amount: tx.amount,
                tx_type: tx.tx_type,
                description: tx.description.clone(),
                category_id: tx.category_id.clone(),
                grouped_transaction_ids: Vec::new(),
            });
        }

        for pair in &self.refund_pairs {
            let original = &pair.original_transaction;
            records.push(UnifiedTransaction {
                id: pair.id.clone(),
                status: UnifiedStatus::Refunded,
                date: original.date,
                amount: original.amount,
                tx_type: original.tx_type,
                description: original.description.clone(),
                category_id: original.category_id.clone(),
                grouped_transaction_ids: vec![
                    original.id.clone(),
                    pair.refund_transaction.id.clone(),
                ],
            });
        }

        for pair in &self.pix_pairs {
            let pix = &pair.pix_transaction;
            records.push(UnifiedTransaction {
                id: pair.id.clone(),
                status: UnifiedStatus::UnifiedPix,
                date: pix.date,
                amount: pix.amount,
                tx_type: pix.tx_type,
                description: pix.description.clone(),
                category_id: pix.category_id.clone(),
                grouped_transaction_ids: vec![pix.id.clone(), pair.credit_transaction.id.clone()],
            });
        }

        records
    }
}

/// Scans a de-duplicated batch for refund and PIX pairs
pub struct RelationDetector<'a> {
    config: RelationConfig,
    catalog: Option<&'a CategoryCatalog>,
}

impl<'a> Default for RelationDetector<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RelationDetector<'a> {
    pub fn new() -> Self {
        Self {
            config: RelationConfig::default(),
            catalog: None,
        }
    }

    pub fn with_config(config: RelationConfig) -> Self {
        Self {
            config,
            catalog: None,
        }
    }

    /// With a catalog, detected PIX pairs are pre-assigned the catalog's PIX
    /// category when one exists.
    pub fn with_catalog(catalog: &'a CategoryCatalog) -> Self {
        Self {
            config: RelationConfig::default(),
            catalog: Some(catalog),
        }
    }

    pub fn with_config_and_catalog(config: RelationConfig, catalog: &'a CategoryCatalog) -> Self {
        Self {
            config,
            catalog: Some(catalog),
        }
    }

    /// Run both matching passes.
    ///
    /// Detection is idempotent: candidates are visited in batch order and
    /// composite ids are derived from the constituent ids, so re-running on
    /// the same input yields the same pairs.
    pub fn detect(&self, transactions: &[Transaction]) -> DetectionResult {
        let mut consumed = vec![false; transactions.len()];
        let mut refund_pairs = Vec::new();
        let mut pix_pairs = Vec::new();

        // Refund pass: each expense looks for an income line of equal amount
        // within the window whose description carries a reversal marker.
        for i in 0..transactions.len() {
            if consumed[i] || transactions[i].tx_type != TransactionType::Expense {
                continue;
            }
            let expense = &transactions[i];

            let candidate = transactions.iter().enumerate().find(|&(j, income)| {
                !consumed[j]
                    && j != i
                    && income.tx_type == TransactionType::Income
                    && self.amounts_equal(expense.amount, income.amount)
                    && self.within_window(expense, income)
                    && contains_any(&income.description, REVERSAL_MARKERS)
            });

            if let Some((j, income)) = candidate {
                consumed[i] = true;
                consumed[j] = true;
                let id = composite_id("refund", &expense.id, &income.id);
                debug!(
                    pair_id = id.as_str(),
                    original = expense.id.as_str(),
                    refund = income.id.as_str(),
                    "detected refund pair"
                );
                refund_pairs.push(RefundPair {
                    id,
                    original_transaction: expense.clone(),
                    refund_transaction: income.clone(),
                });
            }
        }

        // PIX pass: each PIX-tagged debit looks for a same-amount settlement
        // credit within the window.
        let pix_category_id = self
            .catalog
            .and_then(|c| c.pix_category())
            .map(|c| c.id.clone());

        for i in 0..transactions.len() {
            if consumed[i]
                || transactions[i].tx_type != TransactionType::Expense
                || !contains_any(&transactions[i].description, PIX_MARKERS)
            {
                continue;
            }
            let pix = &transactions[i];

            let candidate = transactions.iter().enumerate().find(|&(j, credit)| {
                !consumed[j]
                    && j != i
                    && credit.tx_type == TransactionType::Income
                    && self.amounts_equal(pix.amount, credit.amount)
                    && self.within_window(pix, credit)
                    && contains_any(&credit.description, SETTLEMENT_MARKERS)
            });

            if let Some((j, credit)) = candidate {
                consumed[i] = true;
                consumed[j] = true;

                // The pair's copy of the debit leg carries the pre-assigned
                // category; the batch itself is never touched.
                let mut pix_transaction = pix.clone();
                if let Some(category_id) = &pix_category_id {
                    pix_transaction.category_id = Some(category_id.clone());
                }

                let id = composite_id("pix", &pix.id, &credit.id);
                debug!(
                    pair_id = id.as_str(),
                    debit = pix.id.as_str(),
                    credit = credit.id.as_str(),
                    "detected PIX pair"
                );
                pix_pairs.push(PixPair {
                    id,
                    pix_transaction,
                    credit_transaction: credit.clone(),
                });
            }
        }

        let singles: Vec<Transaction> = transactions
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(tx, _)| tx.clone())
            .collect();

        info!(
            "Detection complete: {} singles, {} refund pairs, {} PIX pairs",
            singles.len(),
            refund_pairs.len(),
            pix_pairs.len()
        );

        DetectionResult {
            singles,
            refund_pairs,
            pix_pairs,
        }
    }

    fn amounts_equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.config.amount_tolerance
    }

    fn within_window(&self, a: &Transaction, b: &Transaction) -> bool {
        (b.date - a.date).num_days().abs() <= self.config.window_days
    }
}

fn contains_any(description: &str, markers: &[&str]) -> bool {
    let description = description.to_lowercase();
    markers.iter().any(|m| description.contains(m))
}

/// Deterministic composite id for a detected pair.
fn composite_id(kind: &str, first_id: &str, second_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\0");
    hasher.update(first_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(second_id.as_bytes());
    format!("{}-{}", kind, &hex::encode(hasher.finalize())[..12])
}
