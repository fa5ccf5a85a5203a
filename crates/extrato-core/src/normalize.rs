//! Raw row normalization
//!
//! Maps externally tokenized statement rows into canonical transaction
//! records via a resolved column mapping. Per-row failures drop the row and
//! are tallied by reason; they never abort the batch.

use chrono::NaiveDate;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::classify::TypeClassifier;
use crate::error::{Error, Result};
use crate::models::{ColumnMapping, RawRow, Transaction};

/// Why a row was dropped during normalization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    #[error("column {column} is missing from the row")]
    MissingColumn { column: String },

    #[error("required field {field} is empty")]
    EmptyField { field: &'static str },

    #[error("unparsable date: {value}")]
    UnparsableDate { value: String },

    #[error("unparsable amount: {value}")]
    UnparsableAmount { value: String },
}

/// A dropped row together with its position in the input batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    pub row_index: usize,
    pub reason: DropReason,
}

/// Result of normalizing a whole batch
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub transactions: Vec<Transaction>,
    pub dropped: Vec<DroppedRow>,
}

/// Maps raw rows into canonical transactions
#[derive(Debug, Clone)]
pub struct Normalizer {
    mapping: ColumnMapping,
    classifier: TypeClassifier,
}

impl Normalizer {
    /// Fails fast with a mapping error when any required column name is
    /// unresolved (before any row is processed).
    pub fn new(mapping: ColumnMapping) -> Result<Self> {
        Self::with_classifier(mapping, TypeClassifier::new())
    }

    pub fn with_classifier(mapping: ColumnMapping, classifier: TypeClassifier) -> Result<Self> {
        mapping.validate()?;
        Ok(Self {
            mapping,
            classifier,
        })
    }

    /// Normalize every row, dropping and tallying the invalid ones.
    ///
    /// Errors only when zero valid transactions remain.
    pub fn normalize_batch(&self, rows: &[RawRow]) -> Result<NormalizedBatch> {
        let mut transactions = Vec::with_capacity(rows.len());
        let mut dropped = Vec::new();

        for (row_index, row) in rows.iter().enumerate() {
            match self.normalize_row(row) {
                Ok(tx) => transactions.push(tx),
                Err(reason) => {
                    debug!(row_index, %reason, "dropped statement row");
                    dropped.push(DroppedRow { row_index, reason });
                }
            }
        }

        if transactions.is_empty() {
            return Err(Error::EmptyBatch {
                dropped: dropped.len(),
            });
        }

        info!(
            "Normalized {} of {} rows ({} dropped)",
            transactions.len(),
            rows.len(),
            dropped.len()
        );

        Ok(NormalizedBatch {
            transactions,
            dropped,
        })
    }

    /// Normalize a single row, or say why it cannot be.
    pub fn normalize_row(&self, row: &RawRow) -> std::result::Result<Transaction, DropReason> {
        let date_raw = required(row, &self.mapping.date, "date")?;
        let amount_raw = required(row, &self.mapping.amount, "amount")?;
        let identifier_raw = required(row, &self.mapping.identifier, "identifier")?;
        let description_raw = required(row, &self.mapping.description, "description")?;

        let date = parse_date(date_raw).map_err(|_| DropReason::UnparsableDate {
            value: date_raw.to_string(),
        })?;

        let (magnitude, signed) =
            parse_amount(amount_raw).map_err(|_| DropReason::UnparsableAmount {
                value: amount_raw.to_string(),
            })?;

        let tx_type = self.classifier.classify(description_raw, signed);

        Ok(Transaction {
            id: identifier_raw.trim().to_string(),
            date,
            amount: magnitude,
            tx_type,
            description: description_raw.trim().to_string(),
            original_description: description_raw.to_string(),
            category_id: None,
            subcategory_id: None,
            original_data: Some(row_to_json(row)),
            ai_suggestion: None,
        })
    }
}

/// Fetch a mapped column, distinguishing a missing column from an empty value.
fn required<'a>(
    row: &'a RawRow,
    column: &str,
    field: &'static str,
) -> std::result::Result<&'a str, DropReason> {
    let value = row.get(column).ok_or_else(|| DropReason::MissingColumn {
        column: column.to_string(),
    })?;
    if value.trim().is_empty() {
        return Err(DropReason::EmptyField { field });
    }
    Ok(value)
}

/// Serialize the raw row to a JSON object, preserving it for audit.
fn row_to_json(row: &RawRow) -> String {
    let mut map = serde_json::Map::new();
    for (column, value) in row.columns() {
        map.insert(column.to_string(), Value::String(value.to_string()));
    }
    json!(map).to_string()
}

/// Parse a statement date: day/month/year with slash separators, or an
/// already-ISO date unchanged.
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    for fmt in ["%d/%m/%Y", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::RowParse(format!("Unable to parse date: {}", s)))
}

/// Parse a statement amount string into `(magnitude, signed value)`.
///
/// Strips a leading currency symbol and reads the sign from a minus marker
/// (or accounting parentheses). `,` is the decimal separator; `.` is a
/// thousands separator only when more than two digits follow the last `.` —
/// a single two-digit-fraction form like "150.50" is treated as decimal.
pub(crate) fn parse_amount(s: &str) -> Result<(f64, f64)> {
    let mut negative = false;
    let mut t = s.trim();

    if let Some(inner) = t.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        t = inner.trim();
    }
    if let Some(rest) = t.strip_prefix('-') {
        negative = true;
        t = rest.trim_start();
    }
    for symbol in ["R$", "r$", "$"] {
        if let Some(rest) = t.strip_prefix(symbol) {
            t = rest.trim_start();
            break;
        }
    }
    // Some layouts place the minus after the currency symbol ("R$ -150,50").
    if let Some(rest) = t.strip_prefix('-') {
        negative = true;
        t = rest.trim_start();
    }
    let t = t.strip_prefix('+').unwrap_or(t);

    let normalized = if t.contains(',') {
        // Comma is the decimal separator; any dots are thousands grouping.
        t.replace('.', "").replace(',', ".")
    } else if let Some(pos) = t.rfind('.') {
        let fraction_digits = t.len() - pos - 1;
        if fraction_digits > 2 {
            t.replace('.', "")
        } else {
            // Last dot is the decimal point; drop any grouping dots before it.
            let (head, tail) = t.split_at(pos);
            format!("{}{}", head.replace('.', ""), tail)
        }
    } else {
        t.to_string()
    };

    let magnitude: f64 = normalized
        .parse()
        .map_err(|_| Error::RowParse(format!("Unable to parse amount: {}", s)))?;
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(Error::RowParse(format!("Unable to parse amount: {}", s)));
    }

    let signed = if negative { -magnitude } else { magnitude };
    Ok((magnitude, signed))
}
