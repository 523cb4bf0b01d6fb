use std::path::Path;
use vigil::monitor::Monitor;
use vigil::storage::BaselineStore;
use vigil::utils::time::parse_rfc3339_string;
use crate::errors::CliError;
use crate::ui::console;

/// Handler for `--history`.
pub fn handle_history<S: BaselineStore>(
    monitor: &Monitor<S>,
    root: &Path,
    since: Option<&str>,
) -> Result<(), CliError> {
    let since = since
        .map(|value| {
            parse_rfc3339_string(value).map_err(|source| CliError::InvalidSince {
                value: value.to_string(),
                source,
            })
        })
        .transpose()?;
    let history = monitor.change_history(root, since)?;
    print!("{}", console::render_history(&root.display().to_string(), &history));
    Ok(())
}

/// Handler for `--list-baselines`.
pub fn handle_list_baselines<S: BaselineStore>(
    monitor: &Monitor<S>,
    root: Option<&Path>,
) -> Result<(), CliError> {
    let baselines = monitor.list_baselines(root)?;
    print!("{}", console::render_baselines(&baselines));
    Ok(())
}
