#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vigil::file::normalize_root;
use vigil::monitor::{Monitor, MonitorConfig};
use vigil::storage::{MemoryStore, SqliteStore};

pub const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
pub const HELLO_BANG_SHA256: &str = "ce06092fb948d9ffac7d1a376e404b26b7575bcc11ee05a4615fef4fec3a308b";

/// 辅助函数：没有默认排除规则的配置，避免临时目录名称被误排除。
pub fn plain_config() -> MonitorConfig {
    MonitorConfig {
        exclude_patterns: Vec::new(),
        ..MonitorConfig::default()
    }
}

/// 辅助函数：创建一个被监控的目录 (`<tmp>/watched`)。
pub fn setup_watched_dir(dir: &TempDir) -> PathBuf {
    let root = dir.path().join("watched");
    fs::create_dir_all(&root).unwrap();
    root
}

/// 辅助函数：在目录中写入文件，自动创建父目录。
pub fn write_file(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// 辅助函数：基于内存存储的监控器。
pub fn memory_monitor(config: &MonitorConfig) -> Monitor<MemoryStore> {
    Monitor::new(config, MemoryStore::new()).unwrap()
}

/// 辅助函数：基于临时目录中 SQLite 文件的监控器。
pub fn sqlite_monitor(dir: &TempDir, config: &MonitorConfig) -> Monitor<SqliteStore> {
    let config = MonitorConfig {
        database: dir.path().join("vigil.db"),
        ..config.clone()
    };
    Monitor::open_local(&config).unwrap()
}

/// The key a file is stored under.
pub fn record_key(path: &Path) -> String {
    normalize_root(path).unwrap().to_string_lossy().into_owned()
}
