//! Import command implementation

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use extrato_core::{DropReason, DroppedRow, ImportPipeline, RelationConfig};

use super::{load_catalog, mapping_for, read_rows};

pub fn cmd_import(
    file: &Path,
    map_override: Option<&str>,
    window: Option<i64>,
    json: bool,
    categories: Option<&Path>,
) -> Result<()> {
    let (headers, rows) = read_rows(file)?;
    let mapping = mapping_for(&headers, map_override)?;
    let catalog = categories.map(load_catalog).transpose()?;

    println!("📥 Reconciling {}...", file.display());
    println!("   Found {} rows", rows.len());

    let mut pipeline = ImportPipeline::new(mapping);
    if let Some(window_days) = window {
        pipeline = pipeline.relation_config(RelationConfig {
            window_days,
            ..RelationConfig::default()
        });
    }
    if let Some(catalog) = catalog.as_ref() {
        pipeline = pipeline.catalog(catalog);
    }

    let outcome = pipeline
        .run(&rows)
        .with_context(|| format!("Failed to reconcile {}", file.display()))?;

    if json {
        let unified = outcome.detection.unified();
        println!("{}", serde_json::to_string_pretty(&unified)?);
        return Ok(());
    }

    println!("✅ Reconciliation complete!");
    println!("   Transactions: {}", outcome.working_set.len());

    if !outcome.dropped.is_empty() {
        println!("   Dropped rows: {}", outcome.dropped.len());
        for (label, count) in drop_tally(&outcome.dropped) {
            println!("   - {}: {}", label, count);
        }
    }

    if !outcome.duplicate_report.is_empty() {
        println!(
            "   Duplicate ids repaired: {}",
            outcome.duplicate_report.len()
        );
        for rewrite in &outcome.duplicate_report.rewrites {
            println!("   - {} -> {}", rewrite.original_id, rewrite.new_id);
        }
    }

    println!("   Refund pairs: {}", outcome.detection.refund_pairs.len());
    println!("   PIX pairs: {}", outcome.detection.pix_pairs.len());
    println!(
        "   Awaiting category: {}",
        outcome.detection.needs_category().len()
    );

    Ok(())
}

/// Count dropped rows per reason kind, in stable label order.
fn drop_tally(dropped: &[DroppedRow]) -> BTreeMap<&'static str, usize> {
    let mut tally = BTreeMap::new();
    for row in dropped {
        let label = match &row.reason {
            DropReason::MissingColumn { .. } => "missing column",
            DropReason::EmptyField { .. } => "empty field",
            DropReason::UnparsableDate { .. } => "unparsable date",
            DropReason::UnparsableAmount { .. } => "unparsable amount",
        };
        *tally.entry(label).or_insert(0) += 1;
    }
    tally
}
