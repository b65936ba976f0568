//! Category Taxonomy Model
//!
//! Three-level tree: `MainCategory` → `Category` → `SubCategory`.
//! Children are owned inline, so the whole forest serializes as one JSON
//! array. Lower levels also carry denormalized ancestor ids
//! (`main_category_id`, `category_id`) that must agree with their position.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// The whole forest, persisted as a single document.
pub type TaxonomyTree = Vec<MainCategory>;

/// Root-level category (e.g. "Apparel")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Display order, not semantically significant
    #[serde(default)]
    pub category: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Second-level category (e.g. "Menswear")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Back-reference to the owning main category (written by the engine)
    #[serde(default)]
    pub main_category_id: String,
    #[serde(default)]
    pub sub_category: Vec<SubCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Leaf category (e.g. "Shirts")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Back-reference to the owning category (written by the engine)
    #[serde(default)]
    pub category_id: String,
    /// Back-reference to the grandparent main category (written by the engine)
    #[serde(default)]
    pub main_category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl MainCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: String::new(),
            category: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category.push(category);
        self
    }

    pub fn find_category(&self, category_id: &str) -> Option<&Category> {
        self.category.iter().find(|c| c.id == category_id)
    }
}

impl Category {
    /// `main_category_id` starts empty; the engine fills it on insert.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: String::new(),
            main_category_id: String::new(),
            sub_category: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_sub_category(mut self, sub: SubCategory) -> Self {
        self.sub_category.push(sub);
        self
    }

    pub fn find_sub_category(&self, sub_category_id: &str) -> Option<&SubCategory> {
        self.sub_category.iter().find(|s| s.id == sub_category_id)
    }
}

impl SubCategory {
    /// Back-references start empty; the engine fills them on insert.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: String::new(),
            category_id: String::new(),
            main_category_id: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }
}

/// Update main category payload
///
/// Carries no `id`: ids are immutable once inserted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MainCategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Update category payload (`id` and `main_category_id` are not patchable)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Update sub-category payload (`id` and both back-references are not patchable)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubCategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
}
