use std::path::PathBuf;

use crate::message::DEFAULT_BUS_CAPACITY;
use crate::taxonomy::DEFAULT_DOCUMENT_KEY;

/// 服务配置 - 分类引擎的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | TAXONOMY_DB_FILE | taxonomy.redb | 数据库文件名 |
/// | TAXONOMY_DOCUMENT_KEY | categories | 分类文档的存储键 |
/// | SEED_ON_EMPTY | true | 存储为空时写入默认分类 |
/// | BUS_CAPACITY | 64 | 通知总线广播容量 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 日志目录，设置后写入滚动日志文件 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/taxonomy LOG_LEVEL=debug cargo run --bin taxonomy-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// redb 数据库文件名 (相对 work_dir)
    pub db_file: String,
    /// 分类文档的存储键
    pub document_key: String,
    /// 存储为空时是否写入默认分类
    pub seed_on_empty: bool,
    /// 通知总线广播容量
    pub bus_capacity: usize,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            db_file: std::env::var("TAXONOMY_DB_FILE").unwrap_or_else(|_| "taxonomy.redb".into()),
            document_key: std::env::var("TAXONOMY_DOCUMENT_KEY")
                .unwrap_or_else(|_| DEFAULT_DOCUMENT_KEY.into()),
            seed_on_empty: std::env::var("SEED_ON_EMPTY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            bus_capacity: std::env::var("BUS_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|c: &usize| *c > 0)
                .unwrap_or(DEFAULT_BUS_CAPACITY),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, document_key: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.document_key = document_key.into();
        config
    }

    /// 数据库文件完整路径
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
