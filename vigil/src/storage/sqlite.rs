use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tracing::{debug, info};
use crate::common::constants::{CURRENT_SCHEMA_VERSION, META_SCHEMA_VERSION, META_STORE_CREATE_TIME};
use crate::common::hash::{AlgorithmSet, DigestMap, HashAlgorithm};
use crate::file::{FileRecord, FileSet, RecordPath};
use crate::reconcile::{Change, ChangeKind, ChangeRecord, ChangeReport};
use crate::utils::time::{now, parse_rfc3339_string, to_storage_string};
use super::schema::SCHEMA;
use super::{Baseline, BaselineStore, StoreError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const BASELINE_COLUMNS: &str = "id, name, root_path, created_at, file_count, total_size, algorithms";

/// Baseline store backed by a single SQLite file.
//
// // 基于单个 SQLite 文件的基线存储。
#[derive(Debug)]
pub struct SqliteStore {
    /// `None` for in-memory databases.
    path: Option<PathBuf>,
    connection: Connection,
}

/// 数据库中一行基线的原始值
struct BaselineRow {
    id: i64,
    name: String,
    root_path: String,
    created_at: String,
    file_count: i64,
    total_size: i64,
    algorithms: AlgorithmSet,
}

impl BaselineRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            root_path: row.get(2)?,
            created_at: row.get(3)?,
            file_count: row.get(4)?,
            total_size: row.get(5)?,
            algorithms: row.get(6)?,
        })
    }

    fn into_baseline(self) -> Result<Baseline, StoreError> {
        Ok(Baseline {
            id: self.id,
            name: self.name,
            root_path: self.root_path,
            created_at: parse_timestamp(&self.created_at)?,
            file_count: from_sql_int(self.file_count, "file_count")?,
            total_size: from_sql_int(self.total_size, "total_size")?,
            algorithms: self.algorithms,
        })
    }
}

/// 数据库中一行文件记录的原始值
struct FileRow {
    path: RecordPath,
    size: i64,
    modified_time: String,
    permissions: i64,
    inode: Option<i64>,
    sha256: Option<String>,
    sha1: Option<String>,
    md5: Option<String>,
}

impl FileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            size: row.get(1)?,
            modified_time: row.get(2)?,
            permissions: row.get(3)?,
            inode: row.get(4)?,
            sha256: row.get(5)?,
            sha1: row.get(6)?,
            md5: row.get(7)?,
        })
    }

    fn into_record(self, algorithms: &AlgorithmSet) -> Result<FileRecord, StoreError> {
        let mut digests = DigestMap::new();
        for algorithm in algorithms.iter() {
            let column = match algorithm {
                HashAlgorithm::Sha256 => &self.sha256,
                HashAlgorithm::Sha1 => &self.sha1,
                HashAlgorithm::Md5 => &self.md5,
            };
            let digest = column.clone().ok_or_else(|| {
                StoreError::Corrupt(format!("'{}' has no {} digest", self.path, algorithm))
            })?;
            digests.insert(algorithm, digest);
        }
        let permissions = u32::try_from(self.permissions)
            .map_err(|_| StoreError::Corrupt(format!("'{}' has invalid permissions {}", self.path, self.permissions)))?;
        let inode = self.inode.map(|i| from_sql_int(i, "inode")).transpose()?;
        Ok(FileRecord {
            size_bytes: from_sql_int(self.size, "size")?,
            modified_time: parse_timestamp(&self.modified_time)?,
            permissions,
            inode,
            digests,
            path: self.path,
        })
    }
}

/// 数据库中一行变更历史的原始值
struct HistoryRow {
    change_type: String,
    old_record: Option<String>,
    new_record: Option<String>,
    detected_at: String,
    critical: bool,
}

impl HistoryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            change_type: row.get(0)?,
            old_record: row.get(1)?,
            new_record: row.get(2)?,
            detected_at: row.get(3)?,
            critical: row.get(4)?,
        })
    }

    fn into_change_record(self) -> Result<ChangeRecord, StoreError> {
        let kind = ChangeKind::parse(&self.change_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown change type '{}'", self.change_type)))?;
        let old: Option<FileRecord> = self.old_record.as_deref().map(serde_json::from_str::<FileRecord>).transpose()?;
        let new: Option<FileRecord> = self.new_record.as_deref().map(serde_json::from_str::<FileRecord>).transpose()?;
        let change = match (kind, old, new) {
            (ChangeKind::Added, None, Some(new)) => Change::Added { new },
            (ChangeKind::Modified, Some(old), Some(new)) => Change::Modified { old, new },
            (ChangeKind::Removed, Some(old), None) => Change::Removed { old },
            (kind, _, _) => {
                return Err(StoreError::Corrupt(format!("{kind} history row carries the wrong records")));
            }
        };
        Ok(ChangeRecord {
            change,
            detected_at: parse_timestamp(&self.detected_at)?,
            critical: self.critical,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    parse_rfc3339_string(s).map_err(|e| StoreError::Corrupt(format!("invalid timestamp '{s}': {e}")))
}

fn from_sql_int(value: i64, column: &str) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column} {value}")))
}

fn to_sql_int(value: u64, column: &str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} {value} does not fit the database")))
}

fn to_json(record: Option<&FileRecord>) -> Result<Option<String>, StoreError> {
    Ok(record.map(serde_json::to_string).transpose()?)
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Errors
    /// Returns `StoreError::UnsupportedSchema` when the file was written by an
    /// incompatible version.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let connection = Connection::open(path)?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        let mut store = Self {
            path: Some(path.to_path_buf()),
            connection,
        };
        store.initialize()?;
        info!(database = %path.display(), "Opened baseline store");
        Ok(store)
    }

    /// A private database that disappears when the store is dropped.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut store = Self {
            path: None,
            connection: Connection::open_in_memory()?,
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 建表并检查（或写入）架构版本
    fn initialize(&mut self) -> Result<(), StoreError> {
        self.connection.execute_batch(SCHEMA)?;

        let tx = self.connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stored: Option<String> = tx
            .query_row(
                "SELECT meta_value FROM store_metadata WHERE meta_key = ?1",
                params![META_SCHEMA_VERSION],
                |row| row.get(0),
            )
            .optional()?;
        match stored {
            Some(value) => {
                let found: u32 = value
                    .parse()
                    .map_err(|_| StoreError::Corrupt(format!("invalid schema version '{value}'")))?;
                if found != CURRENT_SCHEMA_VERSION {
                    return Err(StoreError::UnsupportedSchema {
                        found,
                        supported: CURRENT_SCHEMA_VERSION,
                    });
                }
            }
            None => {
                tx.execute(
                    "INSERT INTO store_metadata (meta_key, meta_value) VALUES (?1, ?2), (?3, ?4)",
                    params![
                        META_SCHEMA_VERSION,
                        CURRENT_SCHEMA_VERSION.to_string(),
                        META_STORE_CREATE_TIME,
                        to_storage_string(&now()),
                    ],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn baseline_by_id(&self, baseline_id: i64) -> Result<Option<Baseline>, StoreError> {
        let sql = format!("SELECT {BASELINE_COLUMNS} FROM baselines WHERE id = ?1");
        self.connection
            .query_row(&sql, params![baseline_id], BaselineRow::from_row)
            .optional()?
            .map(BaselineRow::into_baseline)
            .transpose()
    }
}

impl BaselineStore for SqliteStore {
    fn create_baseline(&mut self, name: &str, root_path: &str, files: &FileSet) -> Result<Baseline, StoreError> {
        let created_at = now();
        let file_count = files.len() as u64;
        let total_size = files.total_size();

        let tx = self.connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO baselines (name, root_path, created_at, file_count, total_size, algorithms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                root_path,
                to_storage_string(&created_at),
                to_sql_int(file_count, "file_count")?,
                to_sql_int(total_size, "total_size")?,
                files.algorithms(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO baseline_files
                    (baseline_id, path, size, modified_time, permissions, inode, sha256, sha1, md5)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for record in files {
                let inode = record.inode.map(|i| to_sql_int(i, "inode")).transpose()?;
                stmt.execute(params![
                    id,
                    record.path,
                    to_sql_int(record.size_bytes, "size")?,
                    to_storage_string(&record.modified_time),
                    i64::from(record.permissions),
                    inode,
                    record.digest(HashAlgorithm::Sha256),
                    record.digest(HashAlgorithm::Sha1),
                    record.digest(HashAlgorithm::Md5),
                ])?;
            }
        }
        tx.commit()?;

        debug!(id, name, root = root_path, files = file_count, "Stored baseline");
        Ok(Baseline {
            id,
            name: name.to_string(),
            root_path: root_path.to_string(),
            created_at,
            file_count,
            total_size,
            algorithms: files.algorithms().clone(),
        })
    }

    fn get_latest_baseline(&self, root_path: &str) -> Result<Option<Baseline>, StoreError> {
        let sql = format!(
            "SELECT {BASELINE_COLUMNS} FROM baselines WHERE root_path = ?1
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        self.connection
            .query_row(&sql, params![root_path], BaselineRow::from_row)
            .optional()?
            .map(BaselineRow::into_baseline)
            .transpose()
    }

    fn load_file_set(&self, baseline_id: i64) -> Result<FileSet, StoreError> {
        let baseline = self
            .baseline_by_id(baseline_id)?
            .ok_or(StoreError::BaselineNotFound(baseline_id))?;

        let mut stmt = self.connection.prepare(
            "SELECT path, size, modified_time, permissions, inode, sha256, sha1, md5
             FROM baseline_files WHERE baseline_id = ?1 ORDER BY path",
        )?;
        let rows = stmt
            .query_map(params![baseline_id], FileRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut files = FileSet::new(baseline.algorithms.clone());
        for row in rows {
            let record = row.into_record(&baseline.algorithms)?;
            files
                .insert(record)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        }
        if files.len() as u64 != baseline.file_count {
            return Err(StoreError::Corrupt(format!(
                "baseline {} lists {} files but {} are stored",
                baseline_id,
                baseline.file_count,
                files.len()
            )));
        }
        Ok(files)
    }

    fn append_change_history(&mut self, report: &ChangeReport) -> Result<(), StoreError> {
        let scanned_at = to_storage_string(&report.scanned_at);
        let tx = self.connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO change_history
                    (baseline_id, change_type, path, old_record, new_record, detected_at, scanned_at, critical)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for record in &report.changes {
                stmt.execute(params![
                    report.baseline_id,
                    record.kind().as_str(),
                    record.path(),
                    to_json(record.change.old_record())?,
                    to_json(record.change.new_record())?,
                    to_storage_string(&record.detected_at),
                    scanned_at,
                    record.critical,
                ])?;
            }
        }
        tx.commit()?;
        debug!(baseline = report.baseline_id, changes = report.changes.len(), "Appended change history");
        Ok(())
    }

    fn get_change_history(&self, root_path: &str, since: Option<DateTime<Utc>>) -> Result<Vec<ChangeRecord>, StoreError> {
        let since = since.map(|s| to_storage_string(&s));
        let mut stmt = self.connection.prepare(
            "SELECT h.change_type, h.old_record, h.new_record, h.detected_at, h.critical
             FROM change_history h JOIN baselines b ON b.id = h.baseline_id
             WHERE b.root_path = ?1 AND (?2 IS NULL OR h.detected_at >= ?2)
             ORDER BY h.detected_at, h.id",
        )?;
        let rows = stmt
            .query_map(params![root_path, since], HistoryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(HistoryRow::into_change_record).collect()
    }

    fn list_baselines(&self, root_path: Option<&str>) -> Result<Vec<Baseline>, StoreError> {
        let sql = format!(
            "SELECT {BASELINE_COLUMNS} FROM baselines WHERE (?1 IS NULL OR root_path = ?1)
             ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = self.connection.prepare(&sql)?;
        let rows = stmt
            .query_map(params![root_path], BaselineRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(BaselineRow::into_baseline).collect()
    }
}
