//! Taxonomy Engine - storefront product category taxonomy
//!
//! # 架构概述
//!
//! - **分类引擎** (`taxonomy`): 三级分类树的增删改查、级联删除与路径校验
//! - **存储** (`store`): 文档存储抽象，内存实现与 redb 实现
//! - **消息总线** (`message`): 分类树替换通知
//! - **核心** (`core`): 配置与后台任务
//!
//! # 模块结构
//!
//! ```text
//! taxonomy-engine/src/
//! ├── core/          # 配置、后台任务
//! ├── message/       # 通知总线
//! ├── store/         # 文档存储 (memory / redb)
//! ├── taxonomy/      # 引擎、仓储、校验、选择器
//! └── utils/         # 日志、字段校验
//! ```

pub mod core;
pub mod message;
pub mod store;
pub mod taxonomy;
pub mod utils;

// Re-export 公共类型
pub use core::{BackgroundTasks, Config};
pub use message::{ChangeCause, NotificationBus, Subscription, TreeReplaced, TreeSnapshot};
pub use store::{ContextId, DocumentStore, MemoryStore, RedbStore, StoreChange, StoreError};
pub use taxonomy::{
    CategorySelector, ExternalChangeListener, LoadOutcome, NodeKind, TaxonomyEngine,
    TaxonomyError, TaxonomyRepository, TaxonomyResult,
};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
