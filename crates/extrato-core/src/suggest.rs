//! Category suggestion collaborator seam
//!
//! The suggestion service lives outside the core (hosted AI in production).
//! The engine treats an absent suggestion as "no hint available" and never
//! blocks on the collaborator; annotation happens post-hoc, before the
//! interactive loop starts.

use tracing::debug;

use crate::guard::WorkingSet;
use crate::models::{AiSuggestion, Transaction};

/// Something that can propose a category for a transaction
pub trait CategorySuggester {
    /// A suggestion for this transaction, or `None` when no hint is
    /// available.
    fn suggest(&self, transaction: &Transaction) -> Option<AiSuggestion>;
}

/// Annotate every transaction in the working set that does not already carry
/// a suggestion. Returns how many records were annotated.
///
/// The set is rebuilt from value copies; the suggestion field is outside the
/// guarded interactive mutation surface, so this runs directly.
pub fn annotate_suggestions(set: &mut WorkingSet, suggester: &dyn CategorySuggester) -> usize {
    let mut annotated = 0;
    let decorated: Vec<Transaction> = set
        .transactions()
        .iter()
        .map(|tx| {
            let mut copy = tx.clone();
            if copy.ai_suggestion.is_none() {
                if let Some(suggestion) = suggester.suggest(&copy) {
                    debug!(
                        id = copy.id.as_str(),
                        category_id = suggestion.category_id.as_str(),
                        confidence = suggestion.confidence,
                        "attached category suggestion"
                    );
                    copy.ai_suggestion = Some(suggestion);
                    annotated += 1;
                }
            }
            copy
        })
        .collect();

    set.replace_transactions(decorated);
    annotated
}

/// Deterministic suggester for tests and demos: a keyword -> category table
/// with an optional fallback category.
#[derive(Debug, Clone, Default)]
pub struct MockSuggester {
    hints: Vec<(String, String)>,
    fallback_category_id: Option<String>,
}

impl MockSuggester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suggest `category_id` whenever the description mentions `keyword`.
    pub fn with_hint(
        mut self,
        keyword: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        self.hints
            .push((keyword.into().to_lowercase(), category_id.into()));
        self
    }

    /// Low-confidence fallback used when no hint matches.
    pub fn with_fallback(mut self, category_id: impl Into<String>) -> Self {
        self.fallback_category_id = Some(category_id.into());
        self
    }
}

impl CategorySuggester for MockSuggester {
    fn suggest(&self, transaction: &Transaction) -> Option<AiSuggestion> {
        let description = transaction.description.to_lowercase();
        for (keyword, category_id) in &self.hints {
            if description.contains(keyword.as_str()) {
                return Some(AiSuggestion {
                    category_id: category_id.clone(),
                    confidence: 0.9,
                    reasoning: format!("description mentions \"{}\"", keyword),
                    is_ai_suggested: true,
                    used_fallback: false,
                });
            }
        }

        self.fallback_category_id.as_ref().map(|id| AiSuggestion {
            category_id: id.clone(),
            confidence: 0.2,
            reasoning: "no keyword matched; fallback category".to_string(),
            is_ai_suggested: true,
            used_fallback: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;

    fn tx(id: &str, description: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            amount: 50.0,
            tx_type: TransactionType::Expense,
            description: description.to_string(),
            original_description: description.to_string(),
            category_id: None,
            subcategory_id: None,
            original_data: None,
            ai_suggestion: None,
        }
    }

    #[test]
    fn test_annotation_attaches_hints() {
        let suggester = MockSuggester::new().with_hint("mercado", "cat-food");
        let mut set = WorkingSet::new(vec![tx("A", "Mercado Central"), tx("B", "Uber")]);

        let annotated = annotate_suggestions(&mut set, &suggester);
        assert_eq!(annotated, 1);

        let suggestion = set.get("A").unwrap().ai_suggestion.as_ref().unwrap();
        assert_eq!(suggestion.category_id, "cat-food");
        assert!(!suggestion.used_fallback);
        assert!(set.get("B").unwrap().ai_suggestion.is_none());
    }

    #[test]
    fn test_fallback_is_marked() {
        let suggester = MockSuggester::new()
            .with_hint("mercado", "cat-food")
            .with_fallback("cat-other");
        let mut set = WorkingSet::new(vec![tx("B", "Uber")]);

        annotate_suggestions(&mut set, &suggester);
        let suggestion = set.get("B").unwrap().ai_suggestion.as_ref().unwrap();
        assert_eq!(suggestion.category_id, "cat-other");
        assert!(suggestion.used_fallback);
        assert!(suggestion.confidence < 0.5);
    }

    #[test]
    fn test_existing_suggestions_are_kept() {
        let suggester = MockSuggester::new().with_hint("uber", "cat-transport");
        let mut existing = tx("A", "Uber");
        existing.ai_suggestion = Some(AiSuggestion {
            category_id: "cat-manual".to_string(),
            confidence: 1.0,
            reasoning: "confirmed earlier".to_string(),
            is_ai_suggested: false,
            used_fallback: false,
        });
        let mut set = WorkingSet::new(vec![existing]);

        let annotated = annotate_suggestions(&mut set, &suggester);
        assert_eq!(annotated, 0);
        assert_eq!(
            set.get("A").unwrap().ai_suggestion.as_ref().unwrap().category_id,
            "cat-manual"
        );
    }
}
