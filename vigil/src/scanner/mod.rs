//! Directory walking and per-file fingerprinting.
//!
//! A scan never fails because of a single file: unreadable, oversized, symlinked
//! and special files end up in the skip list of the `ScanResult`. The only fatal
//! condition is a root that does not exist or is not a directory.

pub mod filter;

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use crate::common::constants::{DEFAULT_MAX_FILE_SIZE, DEFAULT_WORKERS};
use crate::common::hash::AlgorithmSet;
use crate::file::{FileRecord, FileSet, RecordPath, fingerprint_file, normalize_root};
use crate::utils::time::from_system_time;
pub use filter::ExclusionRules;

/// Defines errors that make a whole scan fail.
//
// // 定义导致整个扫描失败的错误。
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root does not exist or is not a directory.
    //
    // // 扫描根目录不存在或不是目录。
    #[error("Scan root does not exist or is not a directory: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The scan root could not be turned into an absolute path.
    #[error("Failed to resolve scan root '{}': {source}", path.display())]
    RootResolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Defines errors in scanner settings.
#[derive(Debug, Error)]
pub enum ScannerSetupError {
    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid excluded path '{}': {source}", path.display())]
    InvalidPrefix {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("The number of scan workers must be at least 1")]
    ZeroWorkers,

    #[error("Failed to start the fingerprint worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings of a scanner. The algorithm set is passed per scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Glob patterns matched against the full path and the file name.
    pub exclude_patterns: Vec<String>,
    /// Directory names pruned wherever they appear below the root.
    pub exclude_dirs: Vec<String>,
    /// Absolute path prefixes that are never visited.
    pub exclude_paths: Vec<PathBuf>,
    /// Files larger than this are skipped.
    pub max_file_size: u64,
    /// Upper bound of files fingerprinted (and open) at the same time.
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            exclude_dirs: Vec::new(),
            exclude_paths: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Why a discovered file is missing from the file set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Larger than the configured `max_file_size`.
    TooLarge { size: u64, limit: u64 },
    /// Could not be read (permission denied, vanished, I/O error).
    Unreadable { error: String },
    /// Symbolic links are never followed.
    Symlink,
    /// FIFOs, sockets, device nodes.
    Special,
    /// The path is not valid UTF-8 and cannot be used as a record key.
    NonUtf8Path,
}

/// A file that was seen but not fingerprinted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: RecordPath,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// The outcome of one scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Normalized absolute root that was scanned.
    pub root: PathBuf,
    /// Every file that was discovered and fingerprinted.
    pub files: FileSet,
    /// Every file that was discovered but left out, in path order.
    pub skipped: Vec<SkippedFile>,
    /// Number of entries dropped by exclusion rules (pruned directories count once).
    pub excluded: usize,
}

/// 一个待计算指纹的候选文件
struct Candidate {
    path: PathBuf,
    metadata: Metadata,
}

/// Walks directory trees and fingerprints the files it finds.
#[derive(Debug)]
pub struct Scanner {
    rules: ExclusionRules,
    max_file_size: u64,
    pool: rayon::ThreadPool,
}

impl Scanner {
    pub fn new(options: &ScanOptions) -> Result<Self, ScannerSetupError> {
        if options.workers == 0 {
            return Err(ScannerSetupError::ZeroWorkers);
        }
        let rules = ExclusionRules::new(
            &options.exclude_patterns,
            &options.exclude_dirs,
            &options.exclude_paths,
        )?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .thread_name(|i| format!("vigil-hash-{i}"))
            .build()?;
        Ok(Self {
            rules,
            max_file_size: options.max_file_size,
            pool,
        })
    }

    /// Scans `root` and fingerprints every eligible file with `algorithms`.
    ///
    /// # Errors
    /// Only `ScanError::RootNotFound` (or a root that cannot be made absolute).
    /// Per-file problems are reported through `ScanResult::skipped`.
    pub fn scan(&self, root: &Path, algorithms: &AlgorithmSet) -> Result<ScanResult, ScanError> {
        let root = normalize_root(root).map_err(|source| ScanError::RootResolve {
            path: root.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(ScanError::RootNotFound(root));
        }
        info!(root = %root.display(), algorithms = %algorithms, "Scanning directory");

        // 1. 遍历目录树，收集候选文件
        let (candidates, mut skipped, excluded) = self.discover(&root);

        // 2. 在有界线程池中并行计算指纹
        let outcomes: Vec<Result<FileRecord, SkippedFile>> = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|candidate| self.fingerprint_candidate(candidate, algorithms))
                .collect()
        });

        // 3. 按路径合并结果，完成顺序不影响最终文件集
        let mut files = FileSet::new(algorithms.clone());
        for outcome in outcomes {
            match outcome {
                Ok(record) => files.insert_fingerprinted(record),
                Err(skip) => skipped.push(skip),
            }
        }
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            root = %root.display(),
            files = files.len(),
            skipped = skipped.len(),
            excluded,
            "Scan finished"
        );
        Ok(ScanResult {
            root,
            files,
            skipped,
            excluded,
        })
    }

    /// Walks the tree without following links and sorts entries into
    /// candidates, skips and exclusions.
    fn discover(&self, root: &Path) -> (Vec<Candidate>, Vec<SkippedFile>, usize) {
        let mut candidates = Vec::new();
        let mut skipped = Vec::new();
        let mut excluded = 0usize;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_excluded = if entry.file_type().is_dir() {
                    self.rules.is_excluded_dir(entry.path(), entry.file_name())
                } else {
                    self.rules.is_excluded_file(entry.path())
                };
                if is_excluded {
                    debug!(path = %entry.path().display(), "Excluded by configuration");
                    excluded += 1;
                }
                !is_excluded
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    warn!(path = %path.display(), error = %err, "Skipping unreadable entry");
                    skipped.push(SkippedFile {
                        path: RecordPath::from(path.as_path()),
                        reason: SkipReason::Unreadable { error: err.to_string() },
                    });
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            let path = entry.path().to_path_buf();
            if path.to_str().is_none() {
                warn!(path = %path.display(), "Skipping file with a non UTF-8 path");
                skipped.push(SkippedFile { path: RecordPath::from(path.as_path()), reason: SkipReason::NonUtf8Path });
                continue;
            }
            if file_type.is_symlink() {
                debug!(path = %path.display(), "Skipping symbolic link");
                skipped.push(SkippedFile { path: RecordPath::from(path.as_path()), reason: SkipReason::Symlink });
                continue;
            }
            if !file_type.is_file() {
                debug!(path = %path.display(), "Skipping special file");
                skipped.push(SkippedFile { path: RecordPath::from(path.as_path()), reason: SkipReason::Special });
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Skipping file without metadata");
                    skipped.push(SkippedFile {
                        path: RecordPath::from(path.as_path()),
                        reason: SkipReason::Unreadable { error: err.to_string() },
                    });
                    continue;
                }
            };
            if metadata.len() > self.max_file_size {
                warn!(
                    path = %path.display(),
                    size = metadata.len(),
                    limit = self.max_file_size,
                    "Skipping large file"
                );
                skipped.push(SkippedFile {
                    path: RecordPath::from(path.as_path()),
                    reason: SkipReason::TooLarge { size: metadata.len(), limit: self.max_file_size },
                });
                continue;
            }
            candidates.push(Candidate { path, metadata });
        }

        (candidates, skipped, excluded)
    }

    fn fingerprint_candidate(&self, candidate: &Candidate, algorithms: &AlgorithmSet) -> Result<FileRecord, SkippedFile> {
        let path = RecordPath::from(candidate.path.as_path());
        let fingerprint = match fingerprint_file(&candidate.path, algorithms) {
            Ok(fingerprint) => fingerprint,
            Err(err) => {
                warn!(path = %path, error = %err, "Could not hash file");
                return Err(SkippedFile { path, reason: SkipReason::Unreadable { error: err.to_string() } });
            }
        };
        // 文件在发现之后可能被追加写入
        if fingerprint.bytes_read > self.max_file_size {
            warn!(path = %path, size = fingerprint.bytes_read, "File grew past the size limit while hashing");
            return Err(SkippedFile {
                path,
                reason: SkipReason::TooLarge { size: fingerprint.bytes_read, limit: self.max_file_size },
            });
        }

        Ok(FileRecord {
            path,
            digests: fingerprint.digests,
            size_bytes: fingerprint.bytes_read,
            modified_time: modified_time(&candidate.metadata),
            permissions: permission_bits(&candidate.metadata),
            inode: inode(&candidate.metadata),
        })
    }
}

fn modified_time(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(from_system_time)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

/// Only the read-only attribute is portable outside Unix.
#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    u32::from(metadata.permissions().readonly())
}

#[cfg(unix)]
fn inode(metadata: &Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.ino())
}

#[cfg(not(unix))]
fn inode(_metadata: &Metadata) -> Option<u64> {
    None
}
