//! Comparison of two file sets.

pub mod change;

use std::cmp::Ordering;
use chrono::{DateTime, Utc};
use thiserror::Error;
use crate::common::hash::AlgorithmSet;
use crate::file::{FileRecord, FileSet};
pub use change::{Change, ChangeKind, ChangeRecord, ChangeReport, ChangeSummary};

/// Defines errors that prevent two file sets from being compared.
//
// // 定义导致两个文件集无法比较的错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The baseline and the current scan were fingerprinted with different algorithms.
    //
    // // 基线与当前扫描使用了不同的摘要算法。
    #[error("Cannot compare file sets with different algorithms: baseline uses [{baseline}], current scan uses [{current}]")]
    AlgorithmMismatch {
        baseline: AlgorithmSet,
        current: AlgorithmSet,
    },
}

/// Compares `baseline` with `current` and returns every difference in path order.
///
/// A path present on both sides is unchanged iff every digest, the size and the
/// permissions are equal (see `FileRecord::same_content`).
pub fn reconcile(
    baseline: &FileSet,
    current: &FileSet,
    detected_at: DateTime<Utc>,
) -> Result<Vec<ChangeRecord>, ReconcileError> {
    if baseline.algorithms() != current.algorithms() {
        return Err(ReconcileError::AlgorithmMismatch {
            baseline: baseline.algorithms().clone(),
            current: current.algorithms().clone(),
        });
    }

    let mut changes = Vec::new();
    let mut emit = |change: Change| changes.push(ChangeRecord::new(change, detected_at));

    let mut old_iter = baseline.iter().peekable();
    let mut new_iter = current.iter().peekable();
    loop {
        let step = match (old_iter.peek(), new_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(old), Some(new)) => old.path.cmp(&new.path),
        };
        match step {
            Ordering::Less => {
                if let Some(old) = old_iter.next() {
                    emit(Change::Removed { old: old.clone() });
                }
            }
            Ordering::Greater => {
                if let Some(new) = new_iter.next() {
                    emit(Change::Added { new: new.clone() });
                }
            }
            Ordering::Equal => {
                if let (Some(old), Some(new)) = (old_iter.next(), new_iter.next()) {
                    if !old.same_content(new) {
                        emit(modified(old, new));
                    }
                }
            }
        }
    }
    Ok(changes)
}

fn modified(old: &FileRecord, new: &FileRecord) -> Change {
    Change::Modified {
        old: old.clone(),
        new: new.clone(),
    }
}
