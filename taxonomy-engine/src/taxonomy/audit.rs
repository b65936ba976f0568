//! Invariant audit for a taxonomy tree
//!
//! Used at load time to flag documents written by something other than the
//! engine (another context, a manual edit, an older build).

use std::collections::HashSet;
use std::fmt;

use shared::models::MainCategory;

/// A broken tree invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Same id used by more than one node (any level)
    DuplicateId { id: String },
    /// `category.main_category_id` disagrees with its owning main category
    CategoryParentMismatch {
        category_id: String,
        expected: String,
        found: String,
    },
    /// `sub_category.category_id` disagrees with its owning category
    SubCategoryParentMismatch {
        sub_category_id: String,
        expected: String,
        found: String,
    },
    /// `sub_category.main_category_id` disagrees with its grandparent
    SubCategoryMainMismatch {
        sub_category_id: String,
        expected: String,
        found: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateId { id } => write!(f, "duplicate id '{id}'"),
            Violation::CategoryParentMismatch {
                category_id,
                expected,
                found,
            } => write!(
                f,
                "category '{category_id}' has main_category_id '{found}', expected '{expected}'"
            ),
            Violation::SubCategoryParentMismatch {
                sub_category_id,
                expected,
                found,
            } => write!(
                f,
                "sub-category '{sub_category_id}' has category_id '{found}', expected '{expected}'"
            ),
            Violation::SubCategoryMainMismatch {
                sub_category_id,
                expected,
                found,
            } => write!(
                f,
                "sub-category '{sub_category_id}' has main_category_id '{found}', expected '{expected}'"
            ),
        }
    }
}

/// Every id in the tree in document order, all levels
fn ids_in_order(tree: &[MainCategory]) -> impl Iterator<Item = &str> {
    tree.iter().flat_map(|main| {
        std::iter::once(main.id.as_str()).chain(main.category.iter().flat_map(|category| {
            std::iter::once(category.id.as_str())
                .chain(category.sub_category.iter().map(|sub| sub.id.as_str()))
        }))
    })
}

/// Every id in the tree, all levels
pub fn collect_ids(tree: &[MainCategory]) -> HashSet<&str> {
    ids_in_order(tree).collect()
}

/// Report every invariant violation in `tree` (empty means consistent)
pub fn audit(tree: &[MainCategory]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();
    for id in ids_in_order(tree) {
        if !seen.insert(id) && reported.insert(id) {
            violations.push(Violation::DuplicateId { id: id.to_string() });
        }
    }

    for main in tree {
        for category in &main.category {
            if category.main_category_id != main.id {
                violations.push(Violation::CategoryParentMismatch {
                    category_id: category.id.clone(),
                    expected: main.id.clone(),
                    found: category.main_category_id.clone(),
                });
            }
            for sub in &category.sub_category {
                if sub.category_id != category.id {
                    violations.push(Violation::SubCategoryParentMismatch {
                        sub_category_id: sub.id.clone(),
                        expected: category.id.clone(),
                        found: sub.category_id.clone(),
                    });
                }
                if sub.main_category_id != main.id {
                    violations.push(Violation::SubCategoryMainMismatch {
                        sub_category_id: sub.id.clone(),
                        expected: main.id.clone(),
                        found: sub.main_category_id.clone(),
                    });
                }
            }
        }
    }

    violations
}
