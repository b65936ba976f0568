//! Category path validation and resolution
//!
//! Pure queries over a tree. They never fail: an unresolved path is a
//! `false` / `None` / empty string, including against an empty tree that has
//! not been loaded yet. Forms call these on every keystroke.

use shared::models::{Category, CategoryRef, FullCategoryInfo, MainCategory, SubCategory};

/// Separator used in human-readable category paths
pub const PATH_SEPARATOR: &str = "/";

fn find_main<'a>(tree: &'a [MainCategory], main_id: &str) -> Option<&'a MainCategory> {
    tree.iter().find(|m| m.id == main_id)
}

/// Structural lookup only; denormalized fields are ignored
fn locate<'a>(
    tree: &'a [MainCategory],
    main_id: &str,
    category_id: &str,
) -> Option<(&'a MainCategory, &'a Category)> {
    let main = find_main(tree, main_id)?;
    let category = main.find_category(category_id)?;
    Some((main, category))
}

/// Lookup that also requires every back-reference to agree with the position
fn locate_strict<'a>(
    tree: &'a [MainCategory],
    main_id: &str,
    category_id: &str,
    sub_id: &str,
) -> Option<(&'a MainCategory, &'a Category, &'a SubCategory)> {
    let (main, category) = locate(tree, main_id, category_id)?;
    if category.main_category_id != main.id {
        return None;
    }
    let sub = category.find_sub_category(sub_id)?;
    if sub.category_id != category.id || sub.main_category_id != main.id {
        return None;
    }
    Some((main, category, sub))
}

/// True iff `main_id` contains `category_id` (and, when given, that category
/// contains `sub_id`)
pub fn validate_category_path(
    tree: &[MainCategory],
    main_id: &str,
    category_id: &str,
    sub_id: Option<&str>,
) -> bool {
    let Some((_, category)) = locate(tree, main_id, category_id) else {
        return false;
    };
    match sub_id {
        Some(sub_id) => category.find_sub_category(sub_id).is_some(),
        None => true,
    }
}

/// Structural containment plus agreement of every denormalized field
///
/// This is the gate a product form must pass before writing a category
/// assignment.
pub fn validate_strict_hierarchy(
    tree: &[MainCategory],
    main_id: &str,
    category_id: &str,
    sub_id: &str,
) -> bool {
    locate_strict(tree, main_id, category_id, sub_id).is_some()
}

/// Resolve a triple to its nodes and `"Main/Category/Sub"` path
pub fn full_category_info(
    tree: &[MainCategory],
    main_id: &str,
    category_id: &str,
    sub_id: &str,
) -> Option<FullCategoryInfo> {
    let (main, category, sub) = locate_strict(tree, main_id, category_id, sub_id)?;
    Some(FullCategoryInfo {
        category_path: join_path(&[&main.name, &category.name, &sub.name]),
        main_category: detached_main(main),
        category: detached_category(category),
        sub_category: sub.clone(),
    })
}

/// Display path for a full or partial selection
///
/// Returns `"Main"`, `"Main/Category"` or `"Main/Category/Sub"` depending on
/// how many ids are given, and an empty string if any given id does not
/// resolve. A `sub_id` without a `category_id` does not resolve.
pub fn category_path(
    tree: &[MainCategory],
    main_id: &str,
    category_id: Option<&str>,
    sub_id: Option<&str>,
) -> String {
    match (category_id, sub_id) {
        (None, None) => find_main(tree, main_id)
            .map(|m| m.name.clone())
            .unwrap_or_default(),
        (Some(category_id), None) => locate(tree, main_id, category_id)
            .filter(|(main, category)| category.main_category_id == main.id)
            .map(|(main, category)| join_path(&[&main.name, &category.name]))
            .unwrap_or_default(),
        (Some(category_id), Some(sub_id)) => full_category_info(tree, main_id, category_id, sub_id)
            .map(|info| info.category_path)
            .unwrap_or_default(),
        (None, Some(_)) => String::new(),
    }
}

/// Establish a product's category reference with a freshly computed path
pub fn resolve_category_ref(
    tree: &[MainCategory],
    main_id: &str,
    category_id: &str,
    sub_id: &str,
) -> Option<CategoryRef> {
    let (main, category, sub) = locate_strict(tree, main_id, category_id, sub_id)?;
    Some(CategoryRef {
        main_category_id: main.id.clone(),
        category_id: category.id.clone(),
        sub_category_id: sub.id.clone(),
        category_path: join_path(&[&main.name, &category.name, &sub.name]),
    })
}

fn join_path(names: &[&str]) -> String {
    names.join(PATH_SEPARATOR)
}

// Info carries the node itself, not its whole subtree
fn detached_main(main: &MainCategory) -> MainCategory {
    MainCategory {
        id: main.id.clone(),
        name: main.name.clone(),
        slug: main.slug.clone(),
        category: Vec::new(),
        created_at: main.created_at,
        updated_at: main.updated_at,
    }
}

fn detached_category(category: &Category) -> Category {
    Category {
        id: category.id.clone(),
        name: category.name.clone(),
        slug: category.slug.clone(),
        main_category_id: category.main_category_id.clone(),
        sub_category: Vec::new(),
        created_at: category.created_at,
        updated_at: category.updated_at,
    }
}
