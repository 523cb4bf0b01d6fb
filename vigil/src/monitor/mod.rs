//! The controller tying scanner, store and reconciler together.

pub mod config;
mod check;
mod create;

use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use crate::common::hash::AlgorithmSet;
use crate::file::{RecordPath, normalize_root};
use crate::reconcile::{ChangeRecord, ChangeReport, ReconcileError};
use crate::scanner::{ScanError, Scanner};
use crate::storage::{Baseline, BaselineStore, SqliteStore, StoreError};
pub use config::{ConfigError, LogSettings, MonitorConfig, ReportSettings, ValidatedConfig};

/// Defines errors that can occur in monitor operations.
//
// // 定义监控操作中可能发生的错误。
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The root does not exist or is not a directory.
    //
    // // 根目录不存在或不是目录。
    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The root path could not be resolved.
    #[error("Failed to resolve root '{}': {source}", path.display())]
    RootResolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No baseline has been created for the root yet.
    //
    // // 该根目录尚未创建基线。
    #[error("No baseline found for '{0}'. Create one first.")]
    NoBaseline(String),

    /// The configuration is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The stored baseline cannot be compared with the current scan.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// The baseline store failed. Nothing of the failed operation was written.
    //
    // // 基线存储失败，失败操作的任何内容都未写入。
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ScanError> for MonitorError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::RootNotFound(path) => MonitorError::RootNotFound(path),
            ScanError::RootResolve { path, source } => MonitorError::RootResolve { path, source },
        }
    }
}

/// Creates baselines and checks directory trees against them.
///
/// The monitor holds no state besides its validated configuration and its
/// store, so one instance can serve any number of roots.
//
// // 创建基线并依据基线检查目录树。
#[derive(Debug)]
pub struct Monitor<S: BaselineStore> {
    store: S,
    algorithms: AlgorithmSet,
    scanner: Scanner,
    critical_paths: Vec<PathBuf>,
}

impl<S: BaselineStore> Monitor<S> {
    /// Validates `config` and builds a monitor on top of `store`.
    pub fn new(config: &MonitorConfig, store: S) -> Result<Self, MonitorError> {
        let ValidatedConfig {
            algorithms,
            scanner,
            critical_paths,
        } = config.validate()?;
        Ok(Self {
            store,
            algorithms,
            scanner,
            critical_paths,
        })
    }

    /// Scans `root` and stores the result as a new baseline.
    ///
    /// Without a name, `auto_baseline_<YYYYmmdd_HHMMSS>` is used.
    pub fn create_baseline(&mut self, root: &Path, name: Option<&str>) -> Result<Baseline, MonitorError> {
        create::create_baseline(self, root, name)
    }

    /// Compares `root` with its latest baseline and records the differences.
    ///
    /// # Errors
    /// `MonitorError::NoBaseline` when the root has never been baselined; in
    /// that case nothing is written.
    pub fn check_integrity(&mut self, root: &Path) -> Result<ChangeReport, MonitorError> {
        check::check_integrity(self, root)
    }

    /// Recorded changes of `root`, oldest first.
    pub fn change_history(&self, root: &Path, since: Option<DateTime<Utc>>) -> Result<Vec<ChangeRecord>, MonitorError> {
        let root = root_key(root)?;
        Ok(self.store.get_change_history(&root, since)?)
    }

    /// Stored baselines, newest first, optionally for one root only.
    pub fn list_baselines(&self, root: Option<&Path>) -> Result<Vec<Baseline>, MonitorError> {
        let root = root.map(root_key).transpose()?;
        Ok(self.store.list_baselines(root.as_deref())?)
    }

    pub fn algorithms(&self) -> &AlgorithmSet {
        &self.algorithms
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether `path` lies under one of the configured critical paths.
    fn is_critical(&self, path: &RecordPath) -> bool {
        self.critical_paths.iter().any(|p| path.is_under(p))
    }
}

impl Monitor<SqliteStore> {
    /// Opens the SQLite store named by `config.database`.
    pub fn open_local(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let store = SqliteStore::open(&config.database)?;
        Self::new(config, store)
    }
}

/// 规范化根目录，得到存储中使用的键
fn root_key(root: &Path) -> Result<String, MonitorError> {
    let normalized = normalize_root(root).map_err(|source| MonitorError::RootResolve {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(RecordPath::from(normalized.as_path()).as_str().to_string())
}
