//! Category catalog for interactive categorization
//!
//! The catalog itself lives in the hosted database; the engine only needs to
//! resolve ids when validating assignments and to find a PIX category for
//! pre-assignment on unified records.

use serde::{Deserialize, Serialize};

/// A subcategory nested under a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: String,
    pub name: String,
}

/// A spending/income category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcategories: Vec<Subcategory>,
}

/// Read-only view over the caller-supplied category set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl CategoryCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn resolve(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    /// Find a subcategory together with its parent category.
    pub fn resolve_subcategory(&self, subcategory_id: &str) -> Option<(&Category, &Subcategory)> {
        self.categories.iter().find_map(|category| {
            category
                .subcategories
                .iter()
                .find(|s| s.id == subcategory_id)
                .map(|s| (category, s))
        })
    }

    /// First category whose name mentions PIX, if any.
    pub fn pix_category(&self) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.to_lowercase().contains("pix"))
    }
}
