//! Domain models for Extrato

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An ordered raw statement row: column name -> raw string value.
///
/// Rows are produced by an external tokenizer (the engine never reads files)
/// and addressed through a [`ColumnMapping`] resolved for the file's layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    columns: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs, preserving their order.
    pub fn from_pairs<C, V>(pairs: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Value of the first column with the given name, if present.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Resolved header -> field mapping for one statement layout.
///
/// Supplied by an external layout-matching collaborator; every field must
/// name a source column or the batch is rejected before any row is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub amount: String,
    pub identifier: String,
    pub description: String,
}

impl ColumnMapping {
    pub fn new(
        date: impl Into<String>,
        amount: impl Into<String>,
        identifier: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
            identifier: identifier.into(),
            description: description.into(),
        }
    }

    /// Fail fast when any required column name is missing.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.date.trim().is_empty() {
            missing.push("date");
        }
        if self.amount.trim().is_empty() {
            missing.push("amount");
        }
        if self.identifier.trim().is_empty() {
            missing.push("identifier");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Mapping(format!(
                "{} unresolved column(s): {}",
                missing.len(),
                missing.join(", ")
            )))
        }
    }
}

/// Economic direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category suggestion attached by the external AI collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub category_id: String,
    /// Confidence level (0.0-1.0)
    pub confidence: f64,
    /// Brief explanation of the suggestion
    pub reasoning: String,
    pub is_ai_suggested: bool,
    /// Whether the suggester fell back to a generic category
    pub used_fallback: bool,
}

/// A canonical transaction record
///
/// `amount` is a non-negative magnitude; the sign of the real-world value is
/// encoded only in `tx_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub description: String,
    /// Source description preserved verbatim for audit
    pub original_description: String,
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    /// Raw source row as JSON (for reprocessing)
    pub original_data: Option<String>,
    pub ai_suggestion: Option<AiSuggestion>,
}

impl Transaction {
    /// Signed value: positive for income, negative for expense.
    pub fn signed_amount(&self) -> f64 {
        match self.tx_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }

    /// Whether the record still needs a category assignment.
    pub fn needs_category(&self) -> bool {
        self.category_id.is_none()
    }
}

/// Two statement lines representing a purchase and its full reversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundPair {
    /// Synthetic composite id derived from the constituent ids
    pub id: String,
    pub original_transaction: Transaction,
    pub refund_transaction: Transaction,
}

/// A PIX debit matched by a same-amount incoming credit used to settle a
/// credit-card-like charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixPair {
    /// Synthetic composite id derived from the constituent ids
    pub id: String,
    pub pix_transaction: Transaction,
    pub credit_transaction: Transaction,
}

/// Status of a unified display record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnifiedStatus {
    Normal,
    Refunded,
    UnifiedPix,
}

impl UnifiedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Refunded => "refunded",
            Self::UnifiedPix => "unified-pix",
        }
    }
}

impl std::str::FromStr for UnifiedStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "refunded" => Ok(Self::Refunded),
            "unified-pix" | "unified_pix" => Ok(Self::UnifiedPix),
            _ => Err(format!("Unknown unified status: {}", s)),
        }
    }
}

impl std::fmt::Display for UnifiedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single display/aggregation record, possibly composited from a detected
/// pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTransaction {
    pub id: String,
    pub status: UnifiedStatus,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub description: String,
    pub category_id: Option<String>,
    /// Ids of the constituent transactions (empty for normal records)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grouped_transaction_ids: Vec<String>,
}

impl UnifiedTransaction {
    /// Contribution of this record to an aggregate total.
    ///
    /// A refunded pair nets to zero; a unified PIX record counts its
    /// settlement amount exactly once, never both legs.
    pub fn net_signed_amount(&self) -> f64 {
        match self.status {
            UnifiedStatus::Refunded => 0.0,
            _ => match self.tx_type {
                TransactionType::Income => self.amount,
                TransactionType::Expense => -self.amount,
            },
        }
    }
}
