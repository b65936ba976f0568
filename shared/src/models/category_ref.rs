//! Product → Category Reference Model

use serde::{Deserialize, Serialize};

use super::category::{Category, MainCategory, SubCategory};

/// Category assignment held by a product
///
/// `category_path` is cached when the reference is established and is not
/// kept in sync with later renames in the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub main_category_id: String,
    pub category_id: String,
    pub sub_category_id: String,
    pub category_path: String,
}

/// Resolved (main, category, sub) triple with display names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCategoryInfo {
    pub main_category: MainCategory,
    pub category: Category,
    pub sub_category: SubCategory,
    /// "Main/Category/Sub"
    pub category_path: String,
}

impl FullCategoryInfo {
    /// Product-side reference for this resolved triple
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            main_category_id: self.main_category.id.clone(),
            category_id: self.category.id.clone(),
            sub_category_id: self.sub_category.id.clone(),
            category_path: self.category_path.clone(),
        }
    }
}
