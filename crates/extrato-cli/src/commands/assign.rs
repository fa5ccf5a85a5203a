//! Assign command implementation

use std::path::Path;

use anyhow::{Context, Result};

use extrato_core::{ImportPipeline, IntegrityGuard};

use super::{load_catalog, mapping_for, read_rows};

pub fn cmd_assign(
    file: &Path,
    map_override: Option<&str>,
    target_id: &str,
    category_id: &str,
    subcategory_id: Option<&str>,
    categories: Option<&Path>,
) -> Result<()> {
    let (headers, rows) = read_rows(file)?;
    let mapping = mapping_for(&headers, map_override)?;
    let catalog = categories.map(load_catalog).transpose()?;

    let mut pipeline = ImportPipeline::new(mapping);
    if let Some(catalog) = catalog.as_ref() {
        pipeline = pipeline.catalog(catalog);
    }
    let outcome = pipeline
        .run(&rows)
        .with_context(|| format!("Failed to reconcile {}", file.display()))?;

    let mut set = outcome.working_set;
    let guard = match catalog.as_ref() {
        Some(catalog) => IntegrityGuard::with_catalog(catalog),
        None => IntegrityGuard::new(),
    };

    let receipt = guard.assign_category(
        &mut set,
        target_id,
        Some(category_id.to_string()),
        subcategory_id.map(|s| s.to_string()),
    )?;

    println!("✅ Assigned category under the integrity guard");
    println!("   Target: {}", receipt.target_id);
    println!(
        "   Changed fields: {}",
        receipt
            .changed_fields
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if receipt.duplicate_target {
        println!("   ⚠️  Duplicate target id detected; first match updated");
    }

    let updated = set
        .get(target_id)
        .context("Target disappeared from the working set")?;
    println!("{}", serde_json::to_string_pretty(updated)?);

    Ok(())
}
