use std::path::Path;
use tracing::info;
use crate::common::constants::AUTO_BASELINE_PREFIX;
use crate::storage::{Baseline, BaselineStore};
use crate::utils::time::{name_stamp, now};
use super::{Monitor, MonitorError, root_key};

/// 扫描根目录并保存为新的基线
pub(crate) fn create_baseline<S: BaselineStore>(
    monitor: &mut Monitor<S>,
    root: &Path,
    name: Option<&str>,
) -> Result<Baseline, MonitorError> {
    let root_path = root_key(root)?;
    let name = match name {
        Some(n) if !n.trim().is_empty() => n.to_string(),
        _ => format!("{AUTO_BASELINE_PREFIX}{}", name_stamp(&now())),
    };

    info!(root = %root_path, name = %name, "Creating baseline");
    let scan = monitor.scanner.scan(Path::new(&root_path), &monitor.algorithms)?;
    let baseline = monitor.store.create_baseline(&name, &root_path, &scan.files)?;

    info!(
        id = baseline.id,
        files = baseline.file_count,
        total_size = baseline.total_size,
        skipped = scan.skipped.len(),
        "Baseline created"
    );
    Ok(baseline)
}
