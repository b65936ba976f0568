//! Taxonomy Engine - the only writer of the category tree
//!
//! # 提交流程
//!
//! ```text
//! add/update/delete ──▶ clone current tree ──▶ mutate copy ──▶ Repository.save
//!                                                                   │
//!                         swap snapshot (Arc) ◀─────────────────────┘
//!                                 │
//!                                 └──▶ NotificationBus.publish(TreeReplaced)
//! ```
//!
//! Any error before the save leaves the in-memory tree, the persisted
//! document and the subscribers untouched. Published snapshots are never
//! mutated afterwards.
//!
//! The engine, not the caller, writes the denormalized `main_category_id`
//! and `category_id` fields on insert, and update payloads cannot carry them.
//!
//! Writers are serialized by a re-entrant lock held across
//! save-swap-publish, so a subscriber may itself call a mutating operation.
//! The bus queues the nested publish behind the one in flight, so every
//! subscriber ends on the newest snapshot.
//! Across contexts the document is last-write-wins: a save computed from a
//! stale snapshot overwrites whatever another context wrote in between.

use std::collections::HashSet;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use shared::models::{
    Category, CategoryRef, CategoryUpdate, FullCategoryInfo, MainCategory, MainCategoryUpdate,
    SubCategory, SubCategoryUpdate, TaxonomyTree,
};
use shared::util::{now_millis, slugify};

use super::audit::{audit, collect_ids};
use super::error::{NodeKind, TaxonomyError, TaxonomyResult};
use super::repository::{RepositoryError, TaxonomyRepository};
use super::selector::CategorySelector;
use super::validation;
use crate::message::{ChangeCause, NotificationBus, Subscription, TreeReplaced, TreeSnapshot};
use crate::store::StoreChange;
use crate::utils::validation::{MAX_ID_LEN, MAX_NAME_LEN, validate_optional_text, validate_required_text};

/// How the tree held by the engine was obtained at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Document parsed (or key absent, which is an empty tree)
    Loaded,
    /// Document did not parse; engine started from an empty tree
    Corrupt,
    /// Store read failed; engine started from an empty tree
    Unavailable,
    /// Store was empty and the seed catalog was written
    Seeded,
}

pub struct TaxonomyEngine {
    repository: TaxonomyRepository,
    bus: NotificationBus,
    tree: RwLock<TreeSnapshot>,
    writer: ReentrantMutex<()>,
    load_outcome: Mutex<LoadOutcome>,
}

impl std::fmt::Debug for TaxonomyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let main_count = self.tree.read().len();
        f.debug_struct("TaxonomyEngine")
            .field("repository", &self.repository)
            .field("main_categories", &main_count)
            .field("load_outcome", &*self.load_outcome.lock())
            .finish()
    }
}

impl TaxonomyEngine {
    // =========================================================================
    // Startup
    // =========================================================================

    /// Load the persisted tree
    ///
    /// Never fails: a corrupt or unreadable document is logged and the engine
    /// starts from an empty tree (see [`LoadOutcome`]).
    pub fn load(repository: TaxonomyRepository, bus: NotificationBus) -> Self {
        let (tree, outcome) = match repository.load() {
            Ok(tree) => (tree, LoadOutcome::Loaded),
            Err(RepositoryError::CorruptDocument(e)) => {
                tracing::error!(
                    key = %repository.document_key(),
                    error = %e,
                    "Taxonomy document is corrupt, starting from an empty tree"
                );
                (TaxonomyTree::new(), LoadOutcome::Corrupt)
            }
            Err(e) => {
                tracing::error!(
                    key = %repository.document_key(),
                    error = %e,
                    "Failed to read taxonomy document, starting from an empty tree"
                );
                (TaxonomyTree::new(), LoadOutcome::Unavailable)
            }
        };
        log_violations(&tree);
        tracing::info!(
            main_categories = tree.len(),
            outcome = ?outcome,
            "📦 TaxonomyEngine: tree loaded"
        );

        Self {
            repository,
            bus,
            tree: RwLock::new(TreeSnapshot::new(tree)),
            writer: ReentrantMutex::new(()),
            load_outcome: Mutex::new(outcome),
        }
    }

    /// Load, then seed the store if it held no taxonomy
    pub fn bootstrap(
        repository: TaxonomyRepository,
        bus: NotificationBus,
        seed: Option<TaxonomyTree>,
    ) -> TaxonomyResult<Self> {
        let engine = Self::load(repository, bus);
        if let Some(seed) = seed {
            engine.seed_if_empty(seed)?;
        }
        Ok(engine)
    }

    /// Write `seed` when the store held no taxonomy at startup
    ///
    /// Does nothing (returns `false`) if a document was loaded with content,
    /// or if it could not be read/parsed: a corrupt document is left in
    /// place rather than overwritten by the seed.
    pub fn seed_if_empty(&self, seed: TaxonomyTree) -> TaxonomyResult<bool> {
        let _writer = self.writer.lock();
        if *self.load_outcome.lock() != LoadOutcome::Loaded || !self.tree.read().is_empty() {
            return Ok(false);
        }

        let violations = audit(&seed);
        if let Some(first) = violations.first() {
            return Err(TaxonomyError::validation(format!("Seed catalog is inconsistent: {first}")));
        }

        self.repository.save(&seed)?;
        let snapshot = TreeSnapshot::new(seed);
        *self.tree.write() = TreeSnapshot::clone(&snapshot);
        *self.load_outcome.lock() = LoadOutcome::Seeded;
        tracing::info!(main_categories = snapshot.len(), "🌱 Taxonomy seeded");
        self.bus.publish(TreeReplaced {
            tree: snapshot,
            cause: ChangeCause::Mutation,
        });
        Ok(true)
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        *self.load_outcome.lock()
    }

    pub fn repository(&self) -> &TaxonomyRepository {
        &self.repository
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Register a consumer for tree replacements
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&TreeReplaced) + Send + Sync + 'static,
    {
        self.bus.subscribe(handler)
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Current immutable snapshot of the whole tree
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::clone(&self.tree.read())
    }

    pub fn main_category(&self, id: &str) -> Option<MainCategory> {
        self.tree.read().iter().find(|m| m.id == id).cloned()
    }

    pub fn category(&self, main_id: &str, category_id: &str) -> Option<Category> {
        self.tree
            .read()
            .iter()
            .find(|m| m.id == main_id)
            .and_then(|m| m.find_category(category_id))
            .cloned()
    }

    pub fn sub_category(
        &self,
        main_id: &str,
        category_id: &str,
        sub_id: &str,
    ) -> Option<SubCategory> {
        self.tree
            .read()
            .iter()
            .find(|m| m.id == main_id)
            .and_then(|m| m.find_category(category_id))
            .and_then(|c| c.find_sub_category(sub_id))
            .cloned()
    }

    /// Cascading selection bound to the current snapshot
    pub fn selector(&self) -> CategorySelector {
        CategorySelector::new(self.snapshot())
    }

    // =========================================================================
    // Validation (never fails, see `validation`)
    // =========================================================================

    pub fn validate_category_path(&self, main_id: &str, category_id: &str, sub_id: Option<&str>) -> bool {
        validation::validate_category_path(&self.tree.read(), main_id, category_id, sub_id)
    }

    pub fn validate_strict_hierarchy(&self, main_id: &str, category_id: &str, sub_id: &str) -> bool {
        validation::validate_strict_hierarchy(&self.tree.read(), main_id, category_id, sub_id)
    }

    pub fn full_category_info(
        &self,
        main_id: &str,
        category_id: &str,
        sub_id: &str,
    ) -> Option<FullCategoryInfo> {
        validation::full_category_info(&self.tree.read(), main_id, category_id, sub_id)
    }

    pub fn category_path(
        &self,
        main_id: &str,
        category_id: Option<&str>,
        sub_id: Option<&str>,
    ) -> String {
        validation::category_path(&self.tree.read(), main_id, category_id, sub_id)
    }

    pub fn resolve_category_ref(
        &self,
        main_id: &str,
        category_id: &str,
        sub_id: &str,
    ) -> Option<CategoryRef> {
        validation::resolve_category_ref(&self.tree.read(), main_id, category_id, sub_id)
    }

    // =========================================================================
    // Main Category
    // =========================================================================

    /// Append a main category (with any children supplied inline)
    pub fn add_main_category(&self, node: MainCategory) -> TaxonomyResult<MainCategory> {
        check_main_fields(&node)?;
        self.commit("add_main_category", move |tree| {
            ensure_unique(tree, main_ids(&node))?;
            let mut node = node;
            prepare_main(&mut node, now_millis());
            tree.push(node.clone());
            Ok(node)
        })
    }

    pub fn update_main_category(
        &self,
        id: &str,
        patch: MainCategoryUpdate,
    ) -> TaxonomyResult<MainCategory> {
        validate_optional_text(&patch.name, "name", MAX_NAME_LEN)?;
        self.commit("update_main_category", move |tree| {
            let main = find_main_mut(tree, id)?;
            apply_patch(&mut main.name, &mut main.slug, patch.name, patch.slug);
            main.updated_at = Some(now_millis());
            Ok(main.clone())
        })
    }

    /// Remove a main category with all of its categories and sub-categories
    pub fn delete_main_category(&self, id: &str) -> TaxonomyResult<MainCategory> {
        self.commit("delete_main_category", |tree| {
            let idx = tree
                .iter()
                .position(|m| m.id == id)
                .ok_or_else(|| TaxonomyError::not_found(NodeKind::MainCategory, id))?;
            Ok(tree.remove(idx))
        })
    }

    // =========================================================================
    // Category
    // =========================================================================

    /// Insert a category under `main_id`; `main_category_id` is overwritten
    pub fn add_category(&self, main_id: &str, node: Category) -> TaxonomyResult<Category> {
        check_category_fields(&node)?;
        self.commit("add_category", move |tree| {
            find_main_mut(tree, main_id)?;
            ensure_unique(tree, category_ids(&node))?;
            let main = find_main_mut(tree, main_id)?;
            let mut node = node;
            prepare_category(&mut node, &main.id, now_millis());
            main.category.push(node.clone());
            Ok(node)
        })
    }

    pub fn update_category(
        &self,
        main_id: &str,
        category_id: &str,
        patch: CategoryUpdate,
    ) -> TaxonomyResult<Category> {
        validate_optional_text(&patch.name, "name", MAX_NAME_LEN)?;
        self.commit("update_category", move |tree| {
            let category = find_category_mut(tree, main_id, category_id)?;
            apply_patch(&mut category.name, &mut category.slug, patch.name, patch.slug);
            category.updated_at = Some(now_millis());
            Ok(category.clone())
        })
    }

    /// Remove a category with all of its sub-categories
    pub fn delete_category(&self, main_id: &str, category_id: &str) -> TaxonomyResult<Category> {
        self.commit("delete_category", |tree| {
            let main = find_main_mut(tree, main_id)?;
            let idx = main
                .category
                .iter()
                .position(|c| c.id == category_id)
                .ok_or_else(|| TaxonomyError::not_found(NodeKind::Category, category_id))?;
            Ok(main.category.remove(idx))
        })
    }

    // =========================================================================
    // Sub-Category
    // =========================================================================

    /// Insert a sub-category; both back-references come from the resolved path
    pub fn add_sub_category(
        &self,
        main_id: &str,
        category_id: &str,
        node: SubCategory,
    ) -> TaxonomyResult<SubCategory> {
        check_text(&node.id, &node.name)?;
        self.commit("add_sub_category", move |tree| {
            find_category_mut(tree, main_id, category_id)?;
            ensure_unique(tree, vec![node.id.as_str()])?;
            let category = find_category_mut(tree, main_id, category_id)?;
            let mut node = node;
            prepare_sub(&mut node, &category.id, main_id, now_millis());
            category.sub_category.push(node.clone());
            Ok(node)
        })
    }

    pub fn update_sub_category(
        &self,
        main_id: &str,
        category_id: &str,
        sub_id: &str,
        patch: SubCategoryUpdate,
    ) -> TaxonomyResult<SubCategory> {
        validate_optional_text(&patch.name, "name", MAX_NAME_LEN)?;
        self.commit("update_sub_category", move |tree| {
            let category = find_category_mut(tree, main_id, category_id)?;
            let sub = category
                .sub_category
                .iter_mut()
                .find(|s| s.id == sub_id)
                .ok_or_else(|| TaxonomyError::not_found(NodeKind::SubCategory, sub_id))?;
            apply_patch(&mut sub.name, &mut sub.slug, patch.name, patch.slug);
            sub.updated_at = Some(now_millis());
            Ok(sub.clone())
        })
    }

    pub fn delete_sub_category(
        &self,
        main_id: &str,
        category_id: &str,
        sub_id: &str,
    ) -> TaxonomyResult<SubCategory> {
        self.commit("delete_sub_category", |tree| {
            let category = find_category_mut(tree, main_id, category_id)?;
            let idx = category
                .sub_category
                .iter()
                .position(|s| s.id == sub_id)
                .ok_or_else(|| TaxonomyError::not_found(NodeKind::SubCategory, sub_id))?;
            Ok(category.sub_category.remove(idx))
        })
    }

    // =========================================================================
    // Reload / external changes
    // =========================================================================

    /// Re-read the persisted document and replace the tree
    ///
    /// A corrupt document becomes an empty tree (logged). A store failure is
    /// returned and leaves the current tree in place.
    pub fn reload(&self) -> TaxonomyResult<TreeSnapshot> {
        let _writer = self.writer.lock();
        let tree = match self.repository.load() {
            Ok(tree) => tree,
            Err(RepositoryError::CorruptDocument(e)) => {
                tracing::error!(error = %e, "Taxonomy document is corrupt on reload, using an empty tree");
                TaxonomyTree::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(self.replace(tree, ChangeCause::Reload))
    }

    /// Replace the tree with a value another context wrote (`None` = deleted)
    pub fn apply_external_change(&self, raw: Option<&str>) -> TreeSnapshot {
        let _writer = self.writer.lock();
        let tree = match raw.map(TaxonomyRepository::decode) {
            None => TaxonomyTree::new(),
            Some(Ok(tree)) => tree,
            Some(Err(e)) => {
                tracing::error!(error = %e, "External taxonomy change is corrupt, using an empty tree");
                TaxonomyTree::new()
            }
        };
        self.replace(tree, ChangeCause::ExternalChange)
    }

    /// Apply a store notification if it is another context's write to our key
    pub fn handle_store_change(&self, change: &StoreChange) -> Option<TreeSnapshot> {
        let own_context = self.repository.store().context_id();
        if change.key != self.repository.document_key() || !change.is_external_to(own_context) {
            return None;
        }
        tracing::debug!(origin = %change.origin, "Taxonomy changed in another context");
        Some(self.apply_external_change(change.value.as_deref()))
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn replace(&self, tree: TaxonomyTree, cause: ChangeCause) -> TreeSnapshot {
        log_violations(&tree);
        let snapshot = TreeSnapshot::new(tree);
        *self.tree.write() = TreeSnapshot::clone(&snapshot);
        tracing::info!(main_categories = snapshot.len(), cause = %cause, "Taxonomy replaced");
        self.bus.publish(TreeReplaced {
            tree: TreeSnapshot::clone(&snapshot),
            cause,
        });
        snapshot
    }

    /// Read-modify-write-notify on a private copy of the tree
    fn commit<R, F>(&self, op: &'static str, mutate: F) -> TaxonomyResult<R>
    where
        F: FnOnce(&mut TaxonomyTree) -> TaxonomyResult<R>,
    {
        let _writer = self.writer.lock();
        let mut next: TaxonomyTree = (**self.tree.read()).clone();

        let result = match mutate(&mut next) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(op, error = %e, "Taxonomy operation rejected");
                return Err(e);
            }
        };

        if let Err(e) = self.repository.save(&next) {
            tracing::error!(op, error = %e, "Failed to persist taxonomy");
            return Err(e.into());
        }

        let snapshot = TreeSnapshot::new(next);
        *self.tree.write() = TreeSnapshot::clone(&snapshot);
        tracing::info!(op, main_categories = snapshot.len(), "Taxonomy updated");
        self.bus.publish(TreeReplaced {
            tree: snapshot,
            cause: ChangeCause::Mutation,
        });
        Ok(result)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn log_violations(tree: &[MainCategory]) {
    for violation in audit(tree) {
        tracing::warn!(violation = %violation, "Taxonomy invariant violated in loaded document");
    }
}

fn check_text(id: &str, name: &str) -> TaxonomyResult<()> {
    validate_required_text(id, "id", MAX_ID_LEN)?;
    validate_required_text(name, "name", MAX_NAME_LEN)?;
    Ok(())
}

fn check_category_fields(node: &Category) -> TaxonomyResult<()> {
    check_text(&node.id, &node.name)?;
    for sub in &node.sub_category {
        check_text(&sub.id, &sub.name)?;
    }
    Ok(())
}

fn check_main_fields(node: &MainCategory) -> TaxonomyResult<()> {
    check_text(&node.id, &node.name)?;
    for category in &node.category {
        check_category_fields(category)?;
    }
    Ok(())
}

fn main_ids(node: &MainCategory) -> Vec<&str> {
    let mut ids = vec![node.id.as_str()];
    for category in &node.category {
        ids.extend(category_ids(category));
    }
    ids
}

fn category_ids(node: &Category) -> Vec<&str> {
    let mut ids = vec![node.id.as_str()];
    ids.extend(node.sub_category.iter().map(|s| s.id.as_str()));
    ids
}

/// Reject ids already used anywhere in the tree or repeated within the new subtree
fn ensure_unique(tree: &[MainCategory], incoming: Vec<&str>) -> TaxonomyResult<()> {
    let existing = collect_ids(tree);
    let mut fresh: HashSet<&str> = HashSet::with_capacity(incoming.len());
    for id in incoming {
        if existing.contains(id) || !fresh.insert(id) {
            return Err(TaxonomyError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}

fn find_main_mut<'a>(tree: &'a mut [MainCategory], main_id: &str) -> TaxonomyResult<&'a mut MainCategory> {
    tree.iter_mut()
        .find(|m| m.id == main_id)
        .ok_or_else(|| TaxonomyError::not_found(NodeKind::MainCategory, main_id))
}

fn find_category_mut<'a>(
    tree: &'a mut [MainCategory],
    main_id: &str,
    category_id: &str,
) -> TaxonomyResult<&'a mut Category> {
    find_main_mut(tree, main_id)?
        .category
        .iter_mut()
        .find(|c| c.id == category_id)
        .ok_or_else(|| TaxonomyError::not_found(NodeKind::Category, category_id))
}

fn apply_patch(name: &mut String, slug: &mut String, new_name: Option<String>, new_slug: Option<String>) {
    if let Some(n) = new_name {
        *name = n;
    }
    if let Some(s) = new_slug {
        *slug = s;
    }
}

fn fill_slug(slug: &mut String, name: &str) {
    if slug.trim().is_empty() {
        *slug = slugify(name);
    }
}

fn prepare_main(node: &mut MainCategory, now: i64) {
    fill_slug(&mut node.slug, &node.name);
    node.created_at.get_or_insert(now);
    for category in &mut node.category {
        prepare_category(category, &node.id, now);
    }
}

fn prepare_category(node: &mut Category, main_id: &str, now: i64) {
    node.main_category_id = main_id.to_string();
    fill_slug(&mut node.slug, &node.name);
    node.created_at.get_or_insert(now);
    for sub in &mut node.sub_category {
        prepare_sub(sub, &node.id, main_id, now);
    }
}

fn prepare_sub(node: &mut SubCategory, category_id: &str, main_id: &str, now: i64) {
    node.category_id = category_id.to_string();
    node.main_category_id = main_id.to_string();
    fill_slug(&mut node.slug, &node.name);
    node.created_at.get_or_insert(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use crate::taxonomy::repository::DEFAULT_DOCUMENT_KEY;
    use crate::taxonomy::seed::default_catalog;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine() -> (TaxonomyEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let repo = TaxonomyRepository::new(store.clone());
        (TaxonomyEngine::load(repo, NotificationBus::new()), store)
    }

    fn populated() -> (TaxonomyEngine, Arc<MemoryStore>) {
        let (engine, store) = engine();
        engine.add_main_category(MainCategory::new("m1", "Apparel")).unwrap();
        engine.add_category("m1", Category::new("c1", "Menswear")).unwrap();
        engine
            .add_sub_category("m1", "c1", SubCategory::new("s1", "Shirts"))
            .unwrap();
        (engine, store)
    }

    #[test]
    fn test_apparel_scenario() {
        let (engine, _) = populated();

        assert!(engine.validate_strict_hierarchy("m1", "c1", "s1"));
        assert_eq!(
            engine.full_category_info("m1", "c1", "s1").unwrap().category_path,
            "Apparel/Menswear/Shirts"
        );
        assert!(!engine.validate_category_path("m1", "c1", Some("s2")));

        engine.delete_category("m1", "c1").unwrap();
        assert!(!engine.validate_category_path("m1", "c1", Some("s1")));
    }

    #[test]
    fn test_engine_writes_back_references() {
        let (engine, _) = engine();
        engine.add_main_category(MainCategory::new("m1", "Apparel")).unwrap();
        engine.add_main_category(MainCategory::new("m2", "Electronics")).unwrap();

        let stale = Category {
            main_category_id: "m2".into(),
            ..Category::new("c1", "Menswear")
        };
        let added = engine.add_category("m1", stale).unwrap();
        assert_eq!(added.main_category_id, "m1");

        let stale_sub = SubCategory {
            category_id: "zzz".into(),
            main_category_id: "m2".into(),
            ..SubCategory::new("s1", "Shirts")
        };
        let added = engine.add_sub_category("m1", "c1", stale_sub).unwrap();
        assert_eq!(added.category_id, "c1");
        assert_eq!(added.main_category_id, "m1");
        assert!(engine.validate_strict_hierarchy("m1", "c1", "s1"));
    }

    #[test]
    fn test_inline_children_are_normalized() {
        let (engine, _) = engine();
        let node = MainCategory::new("m1", "Apparel").with_category(
            Category::new("c1", "Menswear").with_sub_category(SubCategory::new("s1", "Shirts")),
        );
        engine.add_main_category(node).unwrap();

        assert!(engine.validate_strict_hierarchy("m1", "c1", "s1"));
        assert!(audit(&engine.snapshot()).is_empty());
    }

    #[test]
    fn test_slug_and_created_at_filled() {
        let (engine, _) = engine();
        let added = engine
            .add_main_category(MainCategory::new("m1", "Home & Garden"))
            .unwrap();
        assert_eq!(added.slug, "home-garden");
        assert!(added.created_at.is_some());
        assert!(added.updated_at.is_none());

        let kept = engine
            .add_main_category(MainCategory::new("m2", "Toys").with_slug("kids-toys"))
            .unwrap();
        assert_eq!(kept.slug, "kids-toys");
    }

    #[test]
    fn test_duplicate_ids_rejected_at_every_level() {
        let (engine, _) = populated();

        assert!(matches!(
            engine.add_main_category(MainCategory::new("m1", "Again")),
            Err(TaxonomyError::DuplicateId(id)) if id == "m1"
        ));
        // ids are global, not scoped per parent
        assert!(matches!(
            engine.add_main_category(MainCategory::new("s1", "Clash")),
            Err(TaxonomyError::DuplicateId(_))
        ));
        assert!(matches!(
            engine.add_category("m1", Category::new("m1", "Clash")),
            Err(TaxonomyError::DuplicateId(_))
        ));
        assert!(matches!(
            engine.add_sub_category("m1", "c1", SubCategory::new("c1", "Clash")),
            Err(TaxonomyError::DuplicateId(_))
        ));
        let repeated = Category::new("c2", "Womenswear")
            .with_sub_category(SubCategory::new("s2", "Dresses"))
            .with_sub_category(SubCategory::new("s2", "Tops"));
        assert!(matches!(
            engine.add_category("m1", repeated),
            Err(TaxonomyError::DuplicateId(id)) if id == "s2"
        ));
    }

    #[test]
    fn test_missing_parent_is_not_found() {
        let (engine, _) = populated();

        let err = engine
            .add_category("m9", Category::new("c2", "Womenswear"))
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::NotFound { kind: NodeKind::MainCategory, .. }));

        let err = engine
            .add_sub_category("m1", "c9", SubCategory::new("s2", "Dresses"))
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::NotFound { kind: NodeKind::Category, .. }));

        // parent lookup wins over the duplicate check
        let err = engine
            .add_category("m9", Category::new("c1", "Menswear"))
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::NotFound { .. }));
    }

    #[test]
    fn test_update_patches_and_stamps() {
        let (engine, _) = populated();

        let main = engine
            .update_main_category(
                "m1",
                MainCategoryUpdate {
                    name: Some("Clothing".into()),
                    slug: None,
                },
            )
            .unwrap();
        assert_eq!(main.name, "Clothing");
        assert_eq!(main.id, "m1");
        assert!(main.updated_at.is_some());

        let cat = engine
            .update_category(
                "m1",
                "c1",
                CategoryUpdate {
                    name: None,
                    slug: Some("mens".into()),
                },
            )
            .unwrap();
        assert_eq!(cat.slug, "mens");
        assert_eq!(cat.main_category_id, "m1");

        let sub = engine
            .update_sub_category(
                "m1",
                "c1",
                "s1",
                SubCategoryUpdate {
                    name: Some("Dress Shirts".into()),
                    slug: None,
                },
            )
            .unwrap();
        assert_eq!(sub.name, "Dress Shirts");
        assert_eq!(
            engine.category_path("m1", Some("c1"), Some("s1")),
            "Clothing/Menswear/Dress Shirts"
        );
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (engine, _) = populated();
        assert!(matches!(
            engine.update_main_category("m9", MainCategoryUpdate::default()),
            Err(TaxonomyError::NotFound { .. })
        ));
        assert!(matches!(
            engine.update_category("m1", "c9", CategoryUpdate::default()),
            Err(TaxonomyError::NotFound { .. })
        ));
        assert!(matches!(
            engine.update_sub_category("m1", "c1", "s9", SubCategoryUpdate::default()),
            Err(TaxonomyError::NotFound { kind: NodeKind::SubCategory, .. })
        ));
    }

    #[test]
    fn test_delete_main_cascades() {
        let (engine, _) = populated();
        let removed = engine.delete_main_category("m1").unwrap();
        assert_eq!(removed.category[0].sub_category[0].id, "s1");

        assert!(engine.snapshot().is_empty());
        assert!(engine.category("m1", "c1").is_none());
        // ids of removed descendants are free again
        engine.add_main_category(MainCategory::new("s1", "Reused")).unwrap();
    }

    #[test]
    fn test_delete_sub_category() {
        let (engine, _) = populated();
        engine.delete_sub_category("m1", "c1", "s1").unwrap();
        assert!(engine.sub_category("m1", "c1", "s1").is_none());
        assert!(engine.category("m1", "c1").is_some());
        assert!(matches!(
            engine.delete_sub_category("m1", "c1", "s1"),
            Err(TaxonomyError::NotFound { .. })
        ));
    }

    #[test]
    fn test_failed_operation_changes_nothing() {
        let (engine, store) = populated();
        let published = Arc::new(AtomicUsize::new(0));
        let p = Arc::clone(&published);
        let _sub = engine.subscribe(move |_| {
            p.fetch_add(1, Ordering::SeqCst);
        });

        let before_doc = store.get(DEFAULT_DOCUMENT_KEY).unwrap();
        let before_tree = engine.snapshot();

        assert!(engine.delete_main_category("m9").is_err());
        assert!(engine.add_category("m1", Category::new("c1", "Dup")).is_err());
        assert!(engine.add_main_category(MainCategory::new("", "No id")).is_err());
        assert!(engine
            .update_category("m1", "c1", CategoryUpdate { name: Some("   ".into()), slug: None })
            .is_err());

        assert_eq!(store.get(DEFAULT_DOCUMENT_KEY).unwrap(), before_doc);
        assert!(Arc::ptr_eq(&engine.snapshot(), &before_tree));
        assert_eq!(published.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_published_snapshots_are_not_aliased() {
        let (engine, _) = populated();
        let old = engine.snapshot();
        engine.add_category("m1", Category::new("c2", "Womenswear")).unwrap();

        assert_eq!(old[0].category.len(), 1);
        assert_eq!(engine.snapshot()[0].category.len(), 2);
    }

    #[test]
    fn test_every_mutation_publishes_new_tree() {
        let (engine, _) = engine();
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sizes);
        let _sub = engine.subscribe(move |event| {
            assert_eq!(event.cause, ChangeCause::Mutation);
            sink.lock().push(event.tree.len());
        });

        engine.add_main_category(MainCategory::new("m1", "A")).unwrap();
        engine.add_main_category(MainCategory::new("m2", "B")).unwrap();
        engine.delete_main_category("m1").unwrap();

        assert_eq!(*sizes.lock(), vec![1, 2, 1]);
    }

    #[test]
    fn test_subscriber_may_mutate() {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(TaxonomyEngine::load(
            TaxonomyRepository::new(store),
            NotificationBus::new(),
        ));
        let weak = Arc::downgrade(&engine);
        let _sub = engine.subscribe(move |event| {
            if let Some(engine) = weak.upgrade()
                && event.tree.iter().any(|m| m.id == "m1")
                && engine.main_category("m-audit").is_none()
            {
                engine
                    .add_main_category(MainCategory::new("m-audit", "Audit"))
                    .unwrap();
            }
        });
        // registered after the mutating handler
        let last_len = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&last_len);
        let _late = engine.subscribe(move |event| sink.store(event.tree.len(), Ordering::SeqCst));
        let mut rx = engine.bus().receiver();

        engine.add_main_category(MainCategory::new("m1", "A")).unwrap();
        assert!(engine.main_category("m-audit").is_some());

        assert_eq!(last_len.load(Ordering::SeqCst), engine.snapshot().len());
        let mut last_async = None;
        while let Ok(event) = rx.try_recv() {
            last_async = Some(event.tree);
        }
        assert!(Arc::ptr_eq(&last_async.unwrap(), &engine.snapshot()));
    }

    #[test]
    fn test_mutations_are_persisted() {
        let (engine, store) = populated();
        let reloaded = TaxonomyEngine::load(TaxonomyRepository::new(store), NotificationBus::new());
        assert_eq!(*reloaded.snapshot(), *engine.snapshot());
    }

    #[test]
    fn test_corrupt_document_loads_empty_tree() {
        let store = Arc::new(MemoryStore::new());
        store.set(DEFAULT_DOCUMENT_KEY, "definitely not json").unwrap();
        let engine = TaxonomyEngine::load(TaxonomyRepository::new(store.clone()), NotificationBus::new());

        assert_eq!(engine.load_outcome(), LoadOutcome::Corrupt);
        assert!(engine.snapshot().is_empty());
        assert!(!engine.validate_category_path("m1", "c1", None));
        // corrupt documents are not overwritten by the seed
        assert!(!engine.seed_if_empty(default_catalog()).unwrap());
        assert_eq!(
            store.get(DEFAULT_DOCUMENT_KEY).unwrap().as_deref(),
            Some("definitely not json")
        );
    }

    struct UnreadableStore;

    impl DocumentStore for UnreadableStore {
        fn get(&self, _key: &str) -> crate::store::StoreResult<Option<String>> {
            Err(redb::StorageError::Corrupted("bad page".into()).into())
        }

        fn set(&self, _key: &str, _value: &str) -> crate::store::StoreResult<()> {
            Err(redb::StorageError::Corrupted("bad page".into()).into())
        }

        fn delete(&self, _key: &str) -> crate::store::StoreResult<()> {
            Ok(())
        }

        fn context_id(&self) -> crate::store::ContextId {
            crate::store::ContextId::next()
        }

        fn changes(&self) -> tokio::sync::broadcast::Receiver<StoreChange> {
            tokio::sync::broadcast::channel(1).1
        }
    }

    #[test]
    fn test_unreadable_store() {
        let engine = TaxonomyEngine::load(
            TaxonomyRepository::new(Arc::new(UnreadableStore)),
            NotificationBus::new(),
        );
        assert_eq!(engine.load_outcome(), LoadOutcome::Unavailable);
        assert!(engine.snapshot().is_empty());
        assert!(!engine.seed_if_empty(default_catalog()).unwrap());

        let err = engine
            .add_main_category(MainCategory::new("m1", "Apparel"))
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::Storage(_)));
        assert_eq!(err.code(), shared::error::ErrorCode::StorageError);
        assert!(engine.snapshot().is_empty());
        assert!(engine.reload().is_err());
    }

    #[test]
    fn test_seed_if_empty() {
        let (engine, store) = engine();
        assert!(engine.seed_if_empty(default_catalog()).unwrap());
        assert_eq!(engine.load_outcome(), LoadOutcome::Seeded);
        assert_eq!(engine.snapshot().len(), 3);
        assert!(store.get(DEFAULT_DOCUMENT_KEY).unwrap().is_some());

        // second call is a no-op
        assert!(!engine.seed_if_empty(default_catalog()).unwrap());
    }

    #[test]
    fn test_apply_external_change() {
        let (engine, _) = populated();
        let causes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&causes);
        let _sub = engine.subscribe(move |e| sink.lock().push(e.cause));

        let snapshot = engine.apply_external_change(Some(r#"[{"id":"m7","name":"Books"}]"#));
        assert_eq!(snapshot[0].id, "m7");
        assert!(engine.main_category("m1").is_none());

        let snapshot = engine.apply_external_change(Some("<garbage>"));
        assert!(snapshot.is_empty());

        let snapshot = engine.apply_external_change(None);
        assert!(snapshot.is_empty());

        assert_eq!(*causes.lock(), vec![ChangeCause::ExternalChange; 3]);
    }

    #[test]
    fn test_handle_store_change_ignores_own_writes_and_other_keys() {
        let store = Arc::new(MemoryStore::new());
        let engine = TaxonomyEngine::load(TaxonomyRepository::new(store.clone()), NotificationBus::new());
        let mut rx = store.changes();

        engine.add_main_category(MainCategory::new("m1", "A")).unwrap();
        let own = rx.try_recv().unwrap();
        assert!(engine.handle_store_change(&own).is_none());

        let other_tab = store.new_context();
        other_tab.set("cart", "[]").unwrap();
        let unrelated = rx.try_recv().unwrap();
        assert!(engine.handle_store_change(&unrelated).is_none());

        other_tab.set(DEFAULT_DOCUMENT_KEY, "[]").unwrap();
        let external = rx.try_recv().unwrap();
        assert!(engine.handle_store_change(&external).is_some());
        assert!(engine.snapshot().is_empty());
    }

    #[test]
    fn test_reload_picks_up_direct_writes() {
        let (engine, store) = populated();
        store.set(DEFAULT_DOCUMENT_KEY, r#"[{"id":"m5","name":"Garden"}]"#).unwrap();

        let snapshot = engine.reload().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(engine.main_category("m5").unwrap().name, "Garden");
    }

    #[test]
    fn test_name_validation() {
        let (engine, _) = engine();
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            engine.add_main_category(MainCategory::new("m1", long)),
            Err(TaxonomyError::Validation(_))
        ));
        assert!(matches!(
            engine.add_main_category(MainCategory::new("m1", "  ")),
            Err(TaxonomyError::Validation(_))
        ));
    }
}
