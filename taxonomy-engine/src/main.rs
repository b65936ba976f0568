use std::sync::Arc;

use anyhow::Context;
use taxonomy_engine::store::DocumentStore;
use taxonomy_engine::taxonomy::seed::default_catalog;
use taxonomy_engine::{
    BackgroundTasks, Config, ExternalChangeListener, NotificationBus, RedbStore, TaxonomyEngine,
    TaxonomyRepository, init_logger_with_file,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 (.env) 与日志
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!("🗂️ Taxonomy server starting...");

    // 2. 打开存储
    std::fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("Failed to create work dir {}", config.work_dir))?;
    let db_path = config.db_path();
    let store: Arc<dyn DocumentStore> = Arc::new(
        RedbStore::open(&db_path)
            .with_context(|| format!("Failed to open store at {}", db_path.display()))?,
    );
    tracing::info!(path = %db_path.display(), context = %store.context_id(), "Store opened");

    // 3. 加载分类树 (必要时写入默认分类)
    let repository = TaxonomyRepository::with_key(store, config.document_key.clone());
    let bus = NotificationBus::with_capacity(config.bus_capacity);
    let seed = config.seed_on_empty.then(default_catalog);
    let engine = Arc::new(TaxonomyEngine::bootstrap(repository, bus, seed)?);
    log_tree_summary(&engine);

    let _summary = engine.subscribe(|event| {
        tracing::info!(cause = %event.cause, main_categories = event.tree.len(), "Taxonomy tree replaced");
    });

    // 4. 后台任务
    let mut tasks = BackgroundTasks::new();
    let listener = ExternalChangeListener::new(engine.clone(), tasks.shutdown_token());
    tasks.spawn("external_change_listener", listener.run());

    // 5. 等待退出信号
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    if tasks.check_health() > 0 {
        tracing::warn!("Some background tasks exited before shutdown");
    }
    tasks.shutdown().await;
    Ok(())
}

fn log_tree_summary(engine: &TaxonomyEngine) {
    let tree = engine.snapshot();
    let categories: usize = tree.iter().map(|m| m.category.len()).sum();
    let sub_categories: usize = tree
        .iter()
        .flat_map(|m| &m.category)
        .map(|c| c.sub_category.len())
        .sum();
    tracing::info!(
        main_categories = tree.len(),
        categories,
        sub_categories,
        outcome = ?engine.load_outcome(),
        "📦 Taxonomy ready"
    );
}
