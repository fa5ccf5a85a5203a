//! Error types for Extrato

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Column mapping error: {0}")]
    Mapping(String),

    #[error("Row parse error: {0}")]
    RowParse(String),

    #[error("No valid transactions remained after normalization ({dropped} rows dropped)")]
    EmptyBatch { dropped: usize },

    #[error("Integrity violation: {0}")]
    Integrity(#[from] IntegrityViolation),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A detected breach of the "one mutation touches only its target" invariant.
///
/// Always recoverable: the mutation that raised it has been discarded and the
/// previous working set kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    #[error("no transaction with id {id} in the working set")]
    TargetMissing { id: String },

    #[error("working set size changed during mutation: {before} -> {after}")]
    SizeChanged { before: usize, after: usize },

    #[error("sibling transaction {id} was modified by a mutation targeting {target_id}")]
    SiblingModified { id: String, target_id: String },

    #[error("field {field} of {id} is outside the permitted mutation surface")]
    ForbiddenFieldChanged { id: String, field: &'static str },

    #[error("category {category_id} on {id} does not resolve in the catalog")]
    UnresolvableCategory { id: String, category_id: String },

    #[error("subcategory {subcategory_id} on {id} has no resolvable parent category")]
    OrphanSubcategory { id: String, subcategory_id: String },
}

pub type Result<T> = std::result::Result<T, Error>;
