use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::common::constants::{DEFAULT_DATABASE_FILE, DEFAULT_MAX_FILE_SIZE, DEFAULT_WORKERS};
use crate::common::hash::{AlgorithmParseError, AlgorithmSet, HashAlgorithm};
use crate::file::normalize_root;
use crate::scanner::{ScanOptions, Scanner, ScannerSetupError};
use crate::utils::size::ByteSize;

/// Defines errors in monitor configuration.
//
// // 定义监控配置中的错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    //
    // // 无法读取配置文件。
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or has wrongly typed values.
    //
    // // 配置文件不是有效的 TOML，或值的类型错误。
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The algorithm list is empty or names an unsupported algorithm.
    #[error("Invalid algorithm configuration: {0}")]
    Algorithm(#[from] AlgorithmParseError),

    /// Exclusion rules or worker settings are invalid.
    #[error("Invalid scanner configuration: {0}")]
    Scanner(#[from] ScannerSetupError),

    /// A critical path could not be made absolute.
    #[error("Invalid critical path '{}': {source}", path.display())]
    CriticalPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Logging settings, consumed by the command line front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directive, e.g. `info` or `vigil=debug`.
    pub level: String,
    /// Additional log file. Logs always go to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Report settings, consumed by the command line front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// `console`, `json` or `html`.
    pub output_format: String,
    /// Where `--save-report` writes report files.
    pub report_dir: PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_format: "console".to_string(),
            report_dir: PathBuf::from("."),
        }
    }
}

/// Everything a `Monitor` needs to know, loaded from a TOML file or built in code.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// ```toml
/// database = "/var/lib/vigil/baseline.db"
/// algorithms = ["sha256"]
/// exclude_patterns = ["*.tmp", "*.log"]
/// exclude_dirs = [".git"]
/// exclude_paths = ["/proc", "/sys"]
/// max_file_size = "100MB"
/// critical_paths = ["/etc/passwd", "/etc/shadow"]
/// workers = 4
///
/// [log]
/// level = "info"
///
/// [report]
/// output_format = "console"
/// report_dir = "./reports"
/// ```
//
// // 监控所需的全部配置。所有字段都有默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub database: PathBuf,
    pub algorithms: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub exclude_paths: Vec<PathBuf>,
    pub max_file_size: ByteSize,
    pub critical_paths: Vec<PathBuf>,
    pub workers: usize,
    pub log: LogSettings,
    pub report: ReportSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE_FILE),
            algorithms: HashAlgorithm::ALL.iter().map(|a| a.as_str().to_string()).collect(),
            exclude_patterns: ["*.tmp", "*.log", "*.cache", "*.swp", ".DS_Store", "Thumbs.db"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            exclude_dirs: Vec::new(),
            exclude_paths: Vec::new(),
            max_file_size: ByteSize::b(DEFAULT_MAX_FILE_SIZE),
            critical_paths: Vec::new(),
            workers: DEFAULT_WORKERS,
            log: LogSettings::default(),
            report: ReportSettings::default(),
        }
    }
}

/// A configuration whose values have all been checked and compiled.
#[derive(Debug)]
pub struct ValidatedConfig {
    pub algorithms: AlgorithmSet,
    pub scanner: Scanner,
    /// Normalized absolute critical paths.
    pub critical_paths: Vec<PathBuf>,
}

impl MonitorConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            exclude_patterns: self.exclude_patterns.clone(),
            exclude_dirs: self.exclude_dirs.clone(),
            exclude_paths: self.exclude_paths.clone(),
            max_file_size: self.max_file_size.bytes(),
            workers: self.workers,
        }
    }

    /// Checks every value and builds the scanner.
    ///
    /// # Errors
    /// Any invalid algorithm name, an empty algorithm list, an invalid glob,
    /// zero workers or an unresolvable path yields a `ConfigError`.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let algorithms = AlgorithmSet::parse(&self.algorithms)?;
        let scanner = Scanner::new(&self.scan_options())?;
        let critical_paths = self
            .critical_paths
            .iter()
            .map(|p| {
                normalize_root(p).map_err(|source| ConfigError::CriticalPath {
                    path: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ValidatedConfig {
            algorithms,
            scanner,
            critical_paths,
        })
    }
}
