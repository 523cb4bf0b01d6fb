//! Rendering of reports, history and baseline lists.

pub mod console;
pub mod html;

use std::str::FromStr;
use clap::ValueEnum;
use vigil::reconcile::ChangeReport;
use crate::errors::CliError;

/// How a change report is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Console,
    Json,
    Html,
}

impl OutputFormat {
    /// File extension used by `--save-report`.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Console => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" | "text" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(CliError::InvalidOutputFormat(s.to_string())),
        }
    }
}

/// Renders `report` as a complete document in `format`.
pub fn render_report(report: &ChangeReport, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Console => Ok(console::render_report(report)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(report)?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Html => Ok(html::render_report(report)),
    }
}
