//! Command implementations and shared statement-file helpers

mod assign;
mod import;

pub use assign::cmd_assign;
pub use import::cmd_import;

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;

use extrato_core::{Category, CategoryCatalog, ColumnMapping, RawRow};

/// Header names recognized by the built-in layout matcher, per field.
/// Common Brazilian bank and card export spellings, lower-cased.
const DATE_HEADERS: &[&str] = &[
    "data",
    "data lançamento",
    "data lancamento",
    "data da transação",
    "data da transacao",
    "date",
];
const AMOUNT_HEADERS: &[&str] = &["valor", "valor (r$)", "amount", "montante"];
const IDENTIFIER_HEADERS: &[&str] = &[
    "identificador",
    "id",
    "id transação",
    "id transacao",
    "código",
    "codigo",
    "reference",
];
const DESCRIPTION_HEADERS: &[&str] = &[
    "descrição",
    "descricao",
    "histórico",
    "historico",
    "lançamento",
    "lancamento",
    "description",
];

/// Tokenize a statement CSV into raw rows keyed by its header line.
pub fn read_rows(path: &Path) -> Result<(Vec<String>, Vec<RawRow>)> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(value) = record.get(i) {
                row.push(header.clone(), value.to_string());
            }
        }
        rows.push(row);
    }

    Ok((headers, rows))
}

/// Resolve a column mapping from a recognized header layout.
///
/// Returns None if any required field has no matching header; the user can
/// then supply an explicit mapping with --map.
pub fn resolve_mapping(headers: &[String]) -> Option<ColumnMapping> {
    let find = |candidates: &[&str]| -> Option<String> {
        headers
            .iter()
            .find(|h| candidates.contains(&h.trim().to_lowercase().as_str()))
            .cloned()
    };

    Some(ColumnMapping::new(
        find(DATE_HEADERS)?,
        find(AMOUNT_HEADERS)?,
        find(IDENTIFIER_HEADERS)?,
        find(DESCRIPTION_HEADERS)?,
    ))
}

/// Parse an explicit --map override of the form
/// "date=Data,amount=Valor,identifier=ID,description=Histórico".
pub fn parse_mapping_override(spec: &str) -> Result<ColumnMapping> {
    let mut date = None;
    let mut amount = None;
    let mut identifier = None;
    let mut description = None;

    for part in spec.split(',') {
        let (key, value) = part
            .split_once('=')
            .with_context(|| format!("Invalid mapping entry (expected field=column): {}", part))?;
        let value = value.trim().to_string();
        match key.trim().to_lowercase().as_str() {
            "date" => date = Some(value),
            "amount" => amount = Some(value),
            "identifier" | "id" => identifier = Some(value),
            "description" | "desc" => description = Some(value),
            other => bail!("Unknown mapping field: {}", other),
        }
    }

    Ok(ColumnMapping::new(
        date.context("Mapping override is missing date=")?,
        amount.context("Mapping override is missing amount=")?,
        identifier.context("Mapping override is missing identifier=")?,
        description.context("Mapping override is missing description=")?,
    ))
}

/// Determine the mapping for a file: explicit override first, then the
/// layout matcher.
pub fn mapping_for(headers: &[String], map_override: Option<&str>) -> Result<ColumnMapping> {
    if let Some(spec) = map_override {
        return parse_mapping_override(spec);
    }

    resolve_mapping(headers).with_context(|| {
        format!(
            "Could not resolve columns from header [{}].\n\
             Specify --map date=...,amount=...,identifier=...,description=...",
            headers.join(", ")
        )
    })
}

/// Load a category catalog from a JSON file (an array of categories).
pub fn load_catalog(path: &Path) -> Result<CategoryCatalog> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let categories: Vec<Category> = serde_json::from_reader(file)
        .with_context(|| format!("Invalid category catalog: {}", path.display()))?;
    Ok(CategoryCatalog::new(categories))
}
