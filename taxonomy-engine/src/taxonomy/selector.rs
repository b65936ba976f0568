//! Cascading category selection for product forms
//!
//! Forms never read tree internals directly: they pick a main category
//! (getting its categories), then a category (getting its sub-categories),
//! then a sub-category (getting a finished [`CategoryRef`]).

use shared::models::{Category, CategoryRef, SubCategory};

use super::validation;
use crate::message::TreeSnapshot;

/// Selection state bound to one tree snapshot
#[derive(Debug, Clone)]
pub struct CategorySelector {
    tree: TreeSnapshot,
    main_id: Option<String>,
    category_id: Option<String>,
    sub_id: Option<String>,
}

impl CategorySelector {
    pub fn new(tree: TreeSnapshot) -> Self {
        Self {
            tree,
            main_id: None,
            category_id: None,
            sub_id: None,
        }
    }

    /// Main categories available at the first step
    pub fn main_categories(&self) -> &[shared::models::MainCategory] {
        &self.tree
    }

    /// Select a main category; clears lower levels
    pub fn select_main(&mut self, main_id: &str) -> Option<&[Category]> {
        self.category_id = None;
        self.sub_id = None;
        let main = self.tree.iter().position(|m| m.id == main_id);
        self.main_id = main.map(|_| main_id.to_string());
        main.map(|idx| self.tree[idx].category.as_slice())
    }

    /// Select a category under the current main category; clears the sub-category
    pub fn select_category(&mut self, category_id: &str) -> Option<&[SubCategory]> {
        self.sub_id = None;
        let main_id = self.main_id.as_deref()?;
        let found = self
            .tree
            .iter()
            .find(|m| m.id == main_id)
            .and_then(|m| m.find_category(category_id))
            .is_some();
        self.category_id = found.then(|| category_id.to_string());

        let (main_id, category_id) = (self.main_id.as_deref()?, self.category_id.as_deref()?);
        self.tree
            .iter()
            .find(|m| m.id == main_id)
            .and_then(|m| m.find_category(category_id))
            .map(|c| c.sub_category.as_slice())
    }

    /// Select the sub-category and finalize the triple
    ///
    /// Returns `None` unless the whole path passes strict validation.
    pub fn select_sub(&mut self, sub_id: &str) -> Option<CategoryRef> {
        let main_id = self.main_id.as_deref()?;
        let category_id = self.category_id.as_deref()?;
        let resolved = validation::resolve_category_ref(&self.tree, main_id, category_id, sub_id);
        self.sub_id = resolved.as_ref().map(|r| r.sub_category_id.clone());
        resolved
    }

    /// Pre-submit gate: the current selection is complete and strictly valid
    pub fn is_valid(&self) -> bool {
        match (&self.main_id, &self.category_id, &self.sub_id) {
            (Some(m), Some(c), Some(s)) => validation::validate_strict_hierarchy(&self.tree, m, c, s),
            _ => false,
        }
    }

    /// Current selection as a product reference, if complete and valid
    pub fn selection(&self) -> Option<CategoryRef> {
        let (m, c, s) = (
            self.main_id.as_deref()?,
            self.category_id.as_deref()?,
            self.sub_id.as_deref()?,
        );
        validation::resolve_category_ref(&self.tree, m, c, s)
    }

    /// Partial display path of the current selection ("" when nothing is selected)
    pub fn path(&self) -> String {
        match self.main_id.as_deref() {
            Some(m) => validation::category_path(
                &self.tree,
                m,
                self.category_id.as_deref(),
                self.sub_id.as_deref(),
            ),
            None => String::new(),
        }
    }

    pub fn clear(&mut self) {
        self.main_id = None;
        self.category_id = None;
        self.sub_id = None;
    }
}
