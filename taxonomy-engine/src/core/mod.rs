//! 核心模块 - 服务配置与后台任务
//!
//! - [`Config`] - 服务配置
//! - [`BackgroundTasks`] - 后台任务管理

pub mod config;
pub mod tasks;

pub use config::Config;
pub use tasks::BackgroundTasks;
