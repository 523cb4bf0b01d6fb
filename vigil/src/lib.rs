//! vigil: baseline/diff engine for file-integrity monitoring.
//!
//! A baseline is a fingerprinted snapshot of a directory tree. A check re-scans
//! the same tree and reconciles it against the latest baseline, producing an
//! ordered change report and appending it to an immutable history.
//
// // vigil：文件完整性监控的基线/差异引擎。

pub mod common;
pub mod file;
pub mod monitor;
pub mod reconcile;
pub mod scanner;
pub mod storage;
pub mod utils;
