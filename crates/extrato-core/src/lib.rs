//! Extrato Core Library
//!
//! Shared functionality for the Extrato statement reconciliation tool:
//! - Normalization of externally tokenized statement rows into canonical records
//! - Income/expense classification via an ordered rule chain
//! - Within-batch duplicate identifier repair
//! - Refund and PIX pair detection with unified display records
//! - Guarded in-place edits over the interactive working set
//! - Collaborator seams for category suggestion and persistent storage

pub mod categories;
pub mod classify;
pub mod dedup;
pub mod error;
pub mod guard;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod relate;
pub mod storage;
pub mod suggest;

pub use categories::{Category, CategoryCatalog, Subcategory};
pub use classify::{PatternType, Rule, TypeClassifier};
pub use dedup::{resolve_duplicate_ids, DuplicateIdReport, IdRewrite};
pub use error::{Error, IntegrityViolation, Result};
pub use guard::{IntegrityGuard, MutableField, MutationReceipt, WorkingSet};
pub use models::{
    AiSuggestion, ColumnMapping, PixPair, RawRow, RefundPair, Transaction, TransactionType,
    UnifiedStatus, UnifiedTransaction,
};
pub use normalize::{DropReason, DroppedRow, NormalizedBatch, Normalizer};
pub use pipeline::{ImportOutcome, ImportPipeline};
pub use relate::{DetectionResult, RelationConfig, RelationDetector};
pub use storage::{CommitOutcome, MemoryStore, StatementStore};
pub use suggest::{annotate_suggestions, CategorySuggester, MockSuggester};
