//! Starter catalog used when the store holds no taxonomy yet

use shared::models::{Category, MainCategory, SubCategory, TaxonomyTree};
use shared::util::slugify;

/// (main, [(category, [sub, ...]), ...]) with ids derived from slugs
const DEFAULT_CATALOG: &[(&str, &[(&str, &[&str])])] = &[
    (
        "Apparel",
        &[
            ("Menswear", &["Shirts", "Trousers", "Outerwear"]),
            ("Womenswear", &["Dresses", "Tops", "Skirts"]),
            ("Footwear", &["Sneakers", "Boots"]),
        ],
    ),
    (
        "Electronics",
        &[
            ("Computers", &["Laptops", "Desktops", "Accessories"]),
            ("Phones", &["Smartphones", "Cases"]),
        ],
    ),
    (
        "Home & Garden",
        &[
            ("Kitchen", &["Cookware", "Utensils"]),
            ("Furniture", &["Chairs", "Tables"]),
        ],
    ),
];

/// Build the default starter tree
///
/// Ids are `main-<slug>`, `cat-<main>-<slug>`, `sub-<main>-<cat>-<slug>`, so
/// they stay globally unique even when names repeat across branches.
pub fn default_catalog() -> TaxonomyTree {
    DEFAULT_CATALOG
        .iter()
        .map(|(main_name, categories)| {
            let main_slug = slugify(main_name);
            let main_id = format!("main-{main_slug}");
            let category = categories
                .iter()
                .map(|(cat_name, subs)| {
                    let cat_slug = slugify(cat_name);
                    let cat_id = format!("cat-{main_slug}-{cat_slug}");
                    let sub_category = subs
                        .iter()
                        .map(|sub_name| {
                            let sub_slug = slugify(sub_name);
                            SubCategory {
                                id: format!("sub-{main_slug}-{cat_slug}-{sub_slug}"),
                                category_id: cat_id.clone(),
                                main_category_id: main_id.clone(),
                                ..SubCategory::new("", *sub_name).with_slug(sub_slug)
                            }
                        })
                        .collect();
                    Category {
                        id: cat_id.clone(),
                        main_category_id: main_id.clone(),
                        sub_category,
                        ..Category::new("", *cat_name).with_slug(cat_slug)
                    }
                })
                .collect();
            MainCategory {
                id: main_id,
                category,
                ..MainCategory::new("", *main_name).with_slug(main_slug)
            }
        })
        .collect()
}
