//!
//! # Test Common Utilities
//!
//! Shared setup for the `vigil` command line integration tests: an isolated
//! temporary directory with a watched tree, a database path and a config file.
//!
//
// // # 测试通用工具
// //
// // 为 `vigil` 命令行集成测试提供隔离的临时目录、被监控目录、数据库路径与配置文件。
// //
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// Represents the context for a single test.
///
/// The temporary directory is removed when the context goes out of scope.
pub struct TestContext {
    /// Held for its Drop behavior.
    pub _temp_dir: TempDir,
    /// The directory tree under test.
    pub root: PathBuf,
    /// The SQLite database used by every command of this context.
    pub database: PathBuf,
    /// The TOML configuration passed with `--config`.
    pub config: PathBuf,
    /// Where `--save-report` writes.
    pub report_dir: PathBuf,
}

impl TestContext {
    /// Creates a context with an empty watched directory and a default-like configuration.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config("")
    }

    /// Creates a context whose configuration file starts with `extra` TOML lines.
    pub fn with_config(extra: &str) -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path().join("watched");
        fs::create_dir_all(&root)?;
        let database = temp_dir.path().join("state/vigil.db");
        let report_dir = temp_dir.path().join("reports");
        let config = temp_dir.path().join("vigil.toml");
        let report_dir_toml = report_dir.to_string_lossy().replace('\\', "/");
        fs::write(
            &config,
            format!("{extra}\n\n[report]\nreport_dir = \"{report_dir_toml}\"\n"),
        )?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
            database,
            config,
            report_dir,
        })
    }

    /// A `vigil` command wired to this context's config and database.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_vigil"));
        cmd.arg("--config")
            .arg(&self.config)
            .arg("--database")
            .arg(&self.database)
            .arg("--log-level")
            .arg("warn")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Writes a file below the watched root, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Runs `--baseline` on the watched root and asserts success.
    pub fn baseline(&self, name: &str) {
        self.cmd()
            .arg("--baseline")
            .arg(&self.root)
            .arg("--name")
            .arg(name)
            .assert()
            .success();
    }
}

/// Lists the files of a directory, or nothing when it does not exist.
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(_) => Vec::new(),
    }
}
