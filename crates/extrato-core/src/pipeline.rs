//! Batch import pipeline
//!
//! Runs the stages in their required order — normalize (classification runs
//! inside the normalizer), repair duplicate ids, detect relations — and
//! reports what happened to every row. The pipeline runs once per imported
//! file; the resulting working set is then mutated only through the guard.

use std::time::Instant;

use tracing::info;

use crate::categories::CategoryCatalog;
use crate::classify::TypeClassifier;
use crate::dedup::{resolve_duplicate_ids, DuplicateIdReport};
use crate::error::Result;
use crate::guard::WorkingSet;
use crate::models::{ColumnMapping, RawRow};
use crate::normalize::{DroppedRow, Normalizer};
use crate::relate::{DetectionResult, RelationConfig, RelationDetector};

/// Everything produced by one pipeline run
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// The full de-duplicated batch, ready for guarded mutation
    pub working_set: WorkingSet,
    /// Pairs and singles detected over the working set
    pub detection: DetectionResult,
    pub dropped: Vec<DroppedRow>,
    pub duplicate_report: DuplicateIdReport,
    pub rows_total: usize,
    // Phase timing (milliseconds)
    pub normalizing_duration_ms: u64,
    pub detecting_duration_ms: u64,
}

/// One-shot batch pipeline over externally tokenized rows
pub struct ImportPipeline<'a> {
    mapping: ColumnMapping,
    classifier: TypeClassifier,
    relation_config: RelationConfig,
    catalog: Option<&'a CategoryCatalog>,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self {
            mapping,
            classifier: TypeClassifier::new(),
            relation_config: RelationConfig::default(),
            catalog: None,
        }
    }

    pub fn classifier(mut self, classifier: TypeClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn relation_config(mut self, config: RelationConfig) -> Self {
        self.relation_config = config;
        self
    }

    pub fn catalog(mut self, catalog: &'a CategoryCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Run the whole batch pipeline.
    ///
    /// Fails fast on an unresolved mapping, and with `EmptyBatch` when no
    /// valid transaction survives normalization. Per-row failures are
    /// recovered and tallied in the outcome.
    pub fn run(&self, rows: &[RawRow]) -> Result<ImportOutcome> {
        let normalizer =
            Normalizer::with_classifier(self.mapping.clone(), self.classifier.clone())?;

        let started = Instant::now();
        let batch = normalizer.normalize_batch(rows)?;
        let normalizing_duration_ms = started.elapsed().as_millis() as u64;

        let (transactions, duplicate_report) = resolve_duplicate_ids(batch.transactions);

        let started = Instant::now();
        let detector = match self.catalog {
            Some(catalog) => RelationDetector::with_config_and_catalog(
                self.relation_config.clone(),
                catalog,
            ),
            None => RelationDetector::with_config(self.relation_config.clone()),
        };
        let detection = detector.detect(&transactions);
        let detecting_duration_ms = started.elapsed().as_millis() as u64;

        info!(
            "Import pipeline complete: {} rows in, {} transactions, {} dropped, {} id rewrites, {} refund pairs, {} PIX pairs",
            rows.len(),
            transactions.len(),
            batch.dropped.len(),
            duplicate_report.len(),
            detection.refund_pairs.len(),
            detection.pix_pairs.len()
        );

        Ok(ImportOutcome {
            working_set: WorkingSet::new(transactions),
            detection,
            dropped: batch.dropped,
            duplicate_report,
            rows_total: rows.len(),
            normalizing_duration_ms,
            detecting_duration_ms,
        })
    }
}
