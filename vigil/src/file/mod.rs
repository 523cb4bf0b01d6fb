use std::collections::BTreeMap;
use std::collections::btree_map;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::common::hash::{AlgorithmSet, DigestMap, HashAlgorithm};

pub mod fingerprint;
pub mod path;
pub use fingerprint::{Fingerprint, FingerprintError, fingerprint_file};
pub use path::{RecordPath, normalize_root};

/// One tracked file at one point in time.
///
/// Records are produced by a scan (or reloaded from a baseline) and never
/// modified afterwards.
//
// // 某一时刻的一个被跟踪文件。记录由扫描产生（或从基线重新加载），之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute, normalized path. Unique within a file set.
    // // 绝对的、规范化的路径。在文件集中唯一。
    pub path: RecordPath,

    /// Lowercase hex digest per algorithm of the owning file set.
    // // 所属文件集中每个算法对应的小写十六进制摘要。
    pub digests: DigestMap,

    /// Exact number of bytes that were hashed.
    pub size_bytes: u64,

    /// Last content modification as reported by the filesystem.
    pub modified_time: DateTime<Utc>,

    /// Platform mode bits. Only ever compared for equality.
    pub permissions: u32,

    /// Platform file identifier, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inode: Option<u64>,
}

impl FileRecord {
    pub fn digest(&self, algorithm: HashAlgorithm) -> Option<&str> {
        self.digests.get(&algorithm).map(String::as_str)
    }

    /// The authoritative equality test between two snapshots of one path:
    /// digests, size and permissions. The modification time is not compared.
    pub fn same_content(&self, other: &FileRecord) -> bool {
        self.digests == other.digests
            && self.size_bytes == other.size_bytes
            && self.permissions == other.permissions
    }
}

/// Errors raised while assembling a file set.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FileSetError {
    /// A record was fingerprinted with a different algorithm set than the file set.
    //
    // // 记录的摘要算法与文件集的算法集合不一致。
    #[error("Record '{path}' carries digests [{found}] but the file set uses [{expected}]")]
    AlgorithmMismatch {
        path: RecordPath,
        expected: AlgorithmSet,
        found: String,
    },
}

/// All records of one scan of one root, keyed and ordered by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    algorithms: AlgorithmSet,
    records: BTreeMap<RecordPath, FileRecord>,
}

impl FileSet {
    pub fn new(algorithms: AlgorithmSet) -> Self {
        Self {
            algorithms,
            records: BTreeMap::new(),
        }
    }

    pub fn algorithms(&self) -> &AlgorithmSet {
        &self.algorithms
    }

    /// Adds a record, replacing any previous record for the same path.
    ///
    /// # Errors
    /// Fails when the record's digests are not exactly this set's algorithms.
    pub fn insert(&mut self, record: FileRecord) -> Result<Option<FileRecord>, FileSetError> {
        if !self.algorithms.covers_exactly(&record.digests) {
            let found: Vec<&str> = record.digests.keys().map(|a| a.as_str()).collect();
            return Err(FileSetError::AlgorithmMismatch {
                path: record.path.clone(),
                expected: self.algorithms.clone(),
                found: found.join(","),
            });
        }
        Ok(self.records.insert(record.path.clone(), record))
    }

    /// Adds a record that was fingerprinted with this set's own algorithms.
    pub(crate) fn insert_fingerprinted(&mut self, record: FileRecord) {
        debug_assert!(self.algorithms.covers_exactly(&record.digests));
        self.records.insert(record.path.clone(), record);
    }

    pub fn get(&self, path: &RecordPath) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn contains(&self, path: &RecordPath) -> bool {
        self.records.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in path order.
    pub fn iter(&self) -> btree_map::Values<'_, RecordPath, FileRecord> {
        self.records.values()
    }

    /// Sum of all record sizes.
    pub fn total_size(&self) -> u64 {
        self.records.values().map(|r| r.size_bytes).sum()
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a FileRecord;
    type IntoIter = btree_map::Values<'a, RecordPath, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
