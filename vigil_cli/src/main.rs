mod cli;
mod errors;
mod handlers;
mod logging;
mod ui;

use std::process::ExitCode;
use std::str::FromStr;
use clap::Parser;
use vigil::monitor::{Monitor, MonitorConfig};
use crate::cli::{Cli, Mode};
use crate::errors::CliError;
use crate::handlers::check::CheckOptions;
use crate::ui::OutputFormat;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn load_config(cli: &Cli) -> Result<MonitorConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::from_file(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = load_config(&cli)?;
    logging::init(&config.log.level, config.log.file.as_deref())?;

    // 在打开数据库之前校验报告格式
    let format = match cli.output {
        Some(format) => format,
        None => OutputFormat::from_str(&config.report.output_format)?,
    };

    let mut monitor = Monitor::open_local(&config)?;
    match cli.mode() {
        Mode::Baseline { root, name } => {
            handlers::baseline::handle_baseline(&mut monitor, &root, name.as_deref())?;
        }
        Mode::Check { root } => {
            let options = CheckOptions {
                format,
                save_to: cli.save_report.then(|| config.report.report_dir.clone()),
            };
            let report = handlers::check::handle_check(&mut monitor, &root, &options)?;
            if cli.fail_on_changes && report.has_changes() {
                return Ok(ExitCode::from(1));
            }
        }
        Mode::History { root } => {
            handlers::history::handle_history(&monitor, &root, cli.since.as_deref())?;
        }
        Mode::ListBaselines { root } => {
            handlers::history::handle_list_baselines(&monitor, root.as_deref())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
