use std::path::Path;
use vigil::monitor::Monitor;
use vigil::storage::BaselineStore;
use crate::errors::CliError;

/// Handler for `--baseline`.
pub fn handle_baseline<S: BaselineStore>(
    monitor: &mut Monitor<S>,
    root: &Path,
    name: Option<&str>,
) -> Result<(), CliError> {
    let baseline = monitor.create_baseline(root, name)?;
    println!(
        "Baseline '{}' created (id {}) for {}: {} files, {} [{}]",
        baseline.name,
        baseline.id,
        baseline.root_path,
        baseline.file_count,
        bytesize::to_string(baseline.total_size, true),
        baseline.algorithms,
    );
    Ok(())
}
