use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use vigil::monitor::Monitor;
use vigil::reconcile::ChangeReport;
use vigil::storage::BaselineStore;
use vigil::utils::time::{name_stamp, now};
use crate::errors::CliError;
use crate::ui::{OutputFormat, render_report};

/// Options of one `--check` run.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub format: OutputFormat,
    /// Directory for `--save-report`, `None` when no report file is wanted.
    pub save_to: Option<PathBuf>,
}

/// Handler for `--check`. Returns the report so the caller can pick the exit code.
pub fn handle_check<S: BaselineStore>(
    monitor: &mut Monitor<S>,
    root: &Path,
    options: &CheckOptions,
) -> Result<ChangeReport, CliError> {
    let report = monitor.check_integrity(root)?;
    let rendered = render_report(&report, options.format)?;
    print!("{rendered}");

    if let Some(dir) = &options.save_to {
        let path = save_report(dir, &rendered, options.format)?;
        info!(path = %path.display(), "Report saved");
    }
    Ok(report)
}

/// 写入 `<dir>/vigil_report_<时间戳>.<扩展名>`
fn save_report(dir: &Path, rendered: &str, format: OutputFormat) -> Result<PathBuf, CliError> {
    let path = dir.join(format!("vigil_report_{}.{}", name_stamp(&now()), format.extension()));
    let write_error = |source| CliError::ReportWrite {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(dir).map_err(write_error)?;
    fs::write(&path, rendered).map_err(write_error)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_report_creates_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("reports/nested");
        let path = save_report(&target, "{}", OutputFormat::Json).unwrap();
        assert!(path.starts_with(&target));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("vigil_report_"));
        assert!(name.ends_with(".json"));
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn test_unwritable_report_dir() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let err = save_report(&blocker, "x", OutputFormat::Console).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}
