pub mod memory;
pub mod schema;
pub mod sqlite;

use std::fmt::Debug;
use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::common::hash::AlgorithmSet;
use crate::file::FileSet;
use crate::reconcile::{ChangeRecord, ChangeReport};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A named, persisted file set. Never modified after creation.
//
// // 一个已命名并持久化的文件集。创建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Baseline {
    /// Surrogate key. Ids are never reused.
    pub id: i64,
    pub name: String,
    /// Normalized absolute root the baseline covers.
    pub root_path: String,
    pub created_at: DateTime<Utc>,
    pub file_count: u64,
    pub total_size: u64,
    /// The algorithms every member record was fingerprinted with.
    pub algorithms: AlgorithmSet,
}

/// Defines errors raised by a baseline store.
//
// // 定义基线存储可能产生的错误。
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An SQLite operation failed. The surrounding transaction was rolled back.
    //
    // // SQLite 操作失败，所在事务已回滚。
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored record could not be encoded or decoded.
    //
    // // 存储的记录无法编码或解码。
    #[error("Failed to serialize a stored record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred while preparing the database location.
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No baseline exists with the given id.
    //
    // // 不存在具有给定 id 的基线。
    #[error("Baseline with id {0} not found")]
    BaselineNotFound(i64),

    /// Stored data violates an invariant of the store.
    //
    // // 存储的数据违反了存储的不变量。
    #[error("Store data is corrupt: {0}")]
    Corrupt(String),

    /// The database was written by an incompatible version.
    //
    // // 数据库由不兼容的版本写入。
    #[error("Unsupported store schema version: found {found}, but this library supports version {supported}.")]
    UnsupportedSchema {
        found: u32,
        supported: u32,
    },
}

/// Persistence of baselines and change history.
///
/// Every write is atomic: after an error nothing of the failed call is visible.
/// Root paths are passed already normalized; stores compare them as plain strings.
//
// // 基线与变更历史的持久化。每次写入都是原子的。
pub trait BaselineStore: Debug {
    /// Stores `files` as a new baseline of `root_path` and returns it.
    fn create_baseline(&mut self, name: &str, root_path: &str, files: &FileSet) -> Result<Baseline, StoreError>;

    /// The newest baseline of `root_path`, ties broken by the highest id.
    fn get_latest_baseline(&self, root_path: &str) -> Result<Option<Baseline>, StoreError>;

    /// Rebuilds the complete file set of a baseline.
    fn load_file_set(&self, baseline_id: i64) -> Result<FileSet, StoreError>;

    /// Appends every change of `report` to the history.
    fn append_change_history(&mut self, report: &ChangeReport) -> Result<(), StoreError>;

    /// History of `root_path`, oldest first, optionally limited to `detected_at >= since`.
    fn get_change_history(&self, root_path: &str, since: Option<DateTime<Utc>>) -> Result<Vec<ChangeRecord>, StoreError>;

    /// Baselines, newest first, optionally limited to one root.
    fn list_baselines(&self, root_path: Option<&str>) -> Result<Vec<Baseline>, StoreError>;
}
