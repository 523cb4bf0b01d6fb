use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::file::{FileRecord, RecordPath};
use crate::scanner::SkippedFile;

/// The kind of a change, as stored in the history table and shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Modified => "MODIFIED",
            ChangeKind::Removed => "REMOVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADDED" => Some(ChangeKind::Added),
            "MODIFIED" => Some(ChangeKind::Modified),
            "REMOVED" => Some(ChangeKind::Removed),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One difference between a baseline and a current file set.
///
/// Each variant carries exactly the records that exist for it, so a removed file
/// can never have a "new" side.
//
// // 基线与当前文件集之间的一处差异。每个变体只携带实际存在的记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Change {
    Added { new: FileRecord },
    Modified { old: FileRecord, new: FileRecord },
    Removed { old: FileRecord },
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Added { .. } => ChangeKind::Added,
            Change::Modified { .. } => ChangeKind::Modified,
            Change::Removed { .. } => ChangeKind::Removed,
        }
    }

    pub fn path(&self) -> &RecordPath {
        match self {
            Change::Added { new } => &new.path,
            Change::Modified { new, .. } => &new.path,
            Change::Removed { old } => &old.path,
        }
    }

    pub fn old_record(&self) -> Option<&FileRecord> {
        match self {
            Change::Added { .. } => None,
            Change::Modified { old, .. } | Change::Removed { old } => Some(old),
        }
    }

    pub fn new_record(&self) -> Option<&FileRecord> {
        match self {
            Change::Removed { .. } => None,
            Change::Added { new } | Change::Modified { new, .. } => Some(new),
        }
    }
}

/// A change together with when it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(flatten)]
    pub change: Change,
    pub detected_at: DateTime<Utc>,
    /// Set when the path lies under a configured critical path.
    #[serde(default)]
    pub critical: bool,
}

impl ChangeRecord {
    pub fn new(change: Change, detected_at: DateTime<Utc>) -> Self {
        Self {
            change,
            detected_at,
            critical: false,
        }
    }

    pub fn path(&self) -> &RecordPath {
        self.change.path()
    }

    pub fn kind(&self) -> ChangeKind {
        self.change.kind()
    }
}

/// Per-kind counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub critical: usize,
}

impl ChangeSummary {
    pub fn total(&self) -> usize {
        self.added + self.modified + self.removed
    }
}

/// The result of one integrity check.
//
// // 一次完整性检查的结果。
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub root_path: String,
    pub baseline_id: i64,
    pub baseline_name: String,
    pub scanned_at: DateTime<Utc>,
    /// Changes in path order.
    pub changes: Vec<ChangeRecord>,
    /// Files the check scan could not include.
    pub skipped: Vec<SkippedFile>,
}

impl ChangeReport {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for record in &self.changes {
            match record.kind() {
                ChangeKind::Added => summary.added += 1,
                ChangeKind::Modified => summary.modified += 1,
                ChangeKind::Removed => summary.removed += 1,
            }
            if record.critical {
                summary.critical += 1;
            }
        }
        summary
    }

    pub fn critical_changes(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter().filter(|c| c.critical)
    }
}
