use std::path::Path;
use tracing::{info, warn};
use crate::file::FileSet;
use crate::reconcile::{ChangeReport, reconcile};
use crate::scanner::{ScanError, ScanResult};
use crate::storage::BaselineStore;
use crate::utils::time::now;
use super::{Monitor, MonitorError, root_key};

/// 依据最新基线检查根目录
pub(crate) fn check_integrity<S: BaselineStore>(
    monitor: &mut Monitor<S>,
    root: &Path,
) -> Result<ChangeReport, MonitorError> {
    let root_path = root_key(root)?;

    // 1. 查找基线；没有基线时不写入任何内容
    let baseline = monitor
        .store
        .get_latest_baseline(&root_path)?
        .ok_or_else(|| MonitorError::NoBaseline(root_path.clone()))?;
    info!(root = %root_path, baseline = baseline.id, name = %baseline.name, "Checking integrity");

    let expected = monitor.store.load_file_set(baseline.id)?;

    // 2. 使用基线自己的算法集合重新扫描
    if baseline.algorithms != monitor.algorithms {
        info!(
            baseline = %baseline.algorithms,
            configured = %monitor.algorithms,
            "Using the baseline's algorithms for this check"
        );
    }
    let scanned_at = now();
    let scan = match monitor.scanner.scan(Path::new(&root_path), &baseline.algorithms) {
        Ok(scan) => scan,
        // 有基线的根目录被删除：当前文件集为空，所有基线文件都记为 REMOVED
        Err(ScanError::RootNotFound(root)) => {
            warn!(root = %root.display(), "Root directory is gone, reporting every baseline file as removed");
            ScanResult {
                root,
                files: FileSet::new(baseline.algorithms.clone()),
                skipped: Vec::new(),
                excluded: 0,
            }
        }
        Err(err) => return Err(err.into()),
    };

    // 3. 比较并标记关键路径
    let mut changes = reconcile(&expected, &scan.files, scanned_at)?;
    for change in &mut changes {
        change.critical = monitor.is_critical(change.path());
    }

    let report = ChangeReport {
        root_path,
        baseline_id: baseline.id,
        baseline_name: baseline.name,
        scanned_at,
        changes,
        skipped: scan.skipped,
    };

    // 4. 只有存在变更时才写入历史
    if report.has_changes() {
        monitor.store.append_change_history(&report)?;
    }

    for record in report.critical_changes() {
        warn!(path = %record.path(), change = %record.kind(), "Critical path changed");
    }
    let summary = report.summary();
    info!(
        added = summary.added,
        modified = summary.modified,
        removed = summary.removed,
        skipped = report.skipped.len(),
        "Integrity check finished"
    );
    Ok(report)
}
