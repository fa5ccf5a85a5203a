//! Guarded mutation of the interactive working set
//!
//! Once normalization and detection have produced the working set, every
//! point mutation flows through [`IntegrityGuard::apply`]: snapshot the set,
//! build a candidate from value-isolated copies, apply the update to exactly
//! one record, re-verify the whole set against the snapshot, then swap. A
//! failed postcondition discards the candidate and keeps the previous state.

use tracing::{debug, warn};

use crate::categories::CategoryCatalog;
use crate::error::{IntegrityViolation, Result};
use crate::models::Transaction;

/// Fields a guarded mutation is permitted to touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutableField {
    CategoryId,
    SubcategoryId,
    Description,
}

impl MutableField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoryId => "category_id",
            Self::SubcategoryId => "subcategory_id",
            Self::Description => "description",
        }
    }
}

impl std::fmt::Display for MutableField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The in-memory collection of canonical transactions being categorized.
///
/// Mutation happens only through [`IntegrityGuard::apply`]; reads hand out
/// shared references, never aliased mutable ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingSet {
    transactions: Vec<Transaction>,
}

impl WorkingSet {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    /// Wholesale replacement, used by batch-level decoration (suggestion
    /// annotation) that runs before the interactive loop.
    pub(crate) fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }
}

/// Receipt describing a successfully applied mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationReceipt {
    pub target_id: String,
    pub changed_fields: Vec<MutableField>,
    /// More than one transaction matched the target id. Should be impossible
    /// after duplicate-id resolution; flagged for observability.
    pub duplicate_target: bool,
}

/// Wraps every in-place edit of the working set with a before/after
/// consistency check
pub struct IntegrityGuard<'a> {
    permitted: Vec<MutableField>,
    catalog: Option<&'a CategoryCatalog>,
}

impl<'a> Default for IntegrityGuard<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntegrityGuard<'a> {
    /// Guard permitting the full interactive mutation surface: category,
    /// subcategory, description.
    pub fn new() -> Self {
        Self {
            permitted: vec![
                MutableField::CategoryId,
                MutableField::SubcategoryId,
                MutableField::Description,
            ],
            catalog: None,
        }
    }

    /// Guard restricted to a subset of the mutation surface.
    pub fn with_permitted(permitted: Vec<MutableField>) -> Self {
        Self {
            permitted,
            catalog: None,
        }
    }

    /// With a catalog, category assignments must resolve and a subcategory
    /// must belong to the assigned category.
    pub fn with_catalog(catalog: &'a CategoryCatalog) -> Self {
        Self {
            catalog: Some(catalog),
            ..Self::new()
        }
    }

    pub fn with_permitted_and_catalog(
        permitted: Vec<MutableField>,
        catalog: &'a CategoryCatalog,
    ) -> Self {
        Self {
            permitted,
            catalog: Some(catalog),
        }
    }

    /// Apply `update` to the single transaction with `target_id`.
    ///
    /// On success the candidate set replaces the working set and a receipt is
    /// returned. On any violation the working set is left exactly as it was
    /// and the violation is surfaced as a recoverable error.
    pub fn apply<F>(
        &self,
        set: &mut WorkingSet,
        target_id: &str,
        update: F,
    ) -> Result<MutationReceipt>
    where
        F: FnOnce(&mut Transaction),
    {
        // 1. Snapshot: value-isolated copies of the current set.
        let snapshot: Vec<Transaction> = set.transactions.clone();

        // 2. Precondition: exactly one transaction carries the target id.
        let matches: Vec<usize> = snapshot
            .iter()
            .enumerate()
            .filter(|(_, t)| t.id == target_id)
            .map(|(i, _)| i)
            .collect();

        let target_index = match matches.first() {
            Some(&i) => i,
            None => {
                return Err(IntegrityViolation::TargetMissing {
                    id: target_id.to_string(),
                }
                .into())
            }
        };
        let duplicate_target = matches.len() > 1;
        if duplicate_target {
            warn!(
                target_id,
                matches = matches.len(),
                "duplicate target id in working set; proceeding on first match"
            );
        }

        // 3. Candidate built from copies; the update touches only the target.
        let mut candidate = snapshot.clone();
        update(&mut candidate[target_index]);

        // 4. Postconditions against the snapshot.
        if candidate.len() != snapshot.len() {
            return Err(IntegrityViolation::SizeChanged {
                before: snapshot.len(),
                after: candidate.len(),
            }
            .into());
        }

        for (i, (before, after)) in snapshot.iter().zip(candidate.iter()).enumerate() {
            if i != target_index && before != after {
                return Err(IntegrityViolation::SiblingModified {
                    id: before.id.clone(),
                    target_id: target_id.to_string(),
                }
                .into());
            }
        }

        let changed_fields =
            self.permitted_changes(&snapshot[target_index], &candidate[target_index])?;

        if let Some(catalog) = self.catalog {
            validate_category_assignment(catalog, &candidate[target_index])?;
        }

        // 5. Swap: the candidate becomes the working set.
        set.transactions = candidate;

        debug!(
            target_id,
            changed = changed_fields.len(),
            "applied guarded mutation"
        );

        Ok(MutationReceipt {
            target_id: target_id.to_string(),
            changed_fields,
            duplicate_target,
        })
    }

    /// Assign (or clear) the category and subcategory of one transaction.
    pub fn assign_category(
        &self,
        set: &mut WorkingSet,
        target_id: &str,
        category_id: Option<String>,
        subcategory_id: Option<String>,
    ) -> Result<MutationReceipt> {
        self.apply(set, target_id, |tx| {
            tx.category_id = category_id;
            tx.subcategory_id = subcategory_id;
        })
    }

    /// Replace the display description of one transaction. The original
    /// description is untouched by construction.
    pub fn edit_description(
        &self,
        set: &mut WorkingSet,
        target_id: &str,
        description: impl Into<String>,
    ) -> Result<MutationReceipt> {
        let description = description.into();
        self.apply(set, target_id, move |tx| {
            tx.description = description;
        })
    }

    /// Diff the target against its snapshot, rejecting any change outside
    /// the permitted mutation surface.
    fn permitted_changes(
        &self,
        before: &Transaction,
        after: &Transaction,
    ) -> std::result::Result<Vec<MutableField>, IntegrityViolation> {
        let forbidden = |field: &'static str| IntegrityViolation::ForbiddenFieldChanged {
            id: before.id.clone(),
            field,
        };

        if before.id != after.id {
            return Err(forbidden("id"));
        }
        if before.date != after.date {
            return Err(forbidden("date"));
        }
        if before.amount != after.amount {
            return Err(forbidden("amount"));
        }
        if before.tx_type != after.tx_type {
            return Err(forbidden("type"));
        }
        if before.original_description != after.original_description {
            return Err(forbidden("original_description"));
        }
        if before.original_data != after.original_data {
            return Err(forbidden("original_data"));
        }
        if before.ai_suggestion != after.ai_suggestion {
            return Err(forbidden("ai_suggestion"));
        }

        let mut changed = Vec::new();
        if before.category_id != after.category_id {
            changed.push(MutableField::CategoryId);
        }
        if before.subcategory_id != after.subcategory_id {
            changed.push(MutableField::SubcategoryId);
        }
        if before.description != after.description {
            changed.push(MutableField::Description);
        }

        for field in &changed {
            if !self.permitted.contains(field) {
                return Err(IntegrityViolation::ForbiddenFieldChanged {
                    id: before.id.clone(),
                    field: field.as_str(),
                });
            }
        }

        Ok(changed)
    }
}

/// Category/subcategory coherence: a subcategory implies a resolvable parent
/// category, and an assigned category must exist in the catalog.
fn validate_category_assignment(
    catalog: &CategoryCatalog,
    tx: &Transaction,
) -> std::result::Result<(), IntegrityViolation> {
    if let Some(category_id) = &tx.category_id {
        if catalog.resolve(category_id).is_none() {
            return Err(IntegrityViolation::UnresolvableCategory {
                id: tx.id.clone(),
                category_id: category_id.clone(),
            });
        }
    }

    if let Some(subcategory_id) = &tx.subcategory_id {
        let parent_matches = catalog
            .resolve_subcategory(subcategory_id)
            .map(|(parent, _)| Some(&parent.id) == tx.category_id.as_ref())
            .unwrap_or(false);
        if !parent_matches {
            return Err(IntegrityViolation::OrphanSubcategory {
                id: tx.id.clone(),
                subcategory_id: subcategory_id.clone(),
            });
        }
    }

    Ok(())
}
