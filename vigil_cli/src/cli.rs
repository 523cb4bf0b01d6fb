use std::path::PathBuf;
use clap::{ArgGroup, Parser};
use crate::ui::OutputFormat;

/// File integrity monitor: record baselines of directory trees and check them for changes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["baseline", "check", "history", "list_baselines"]),
))]
pub struct Cli {
    /// 为目录创建新的基线
    #[arg(long, value_name = "PATH")]
    pub baseline: Option<PathBuf>,

    /// 依据最新基线检查目录
    #[arg(long, value_name = "PATH")]
    pub check: Option<PathBuf>,

    /// 显示目录的变更历史
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// 列出已保存的基线 (可选：仅限某个目录)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub list_baselines: Option<Option<PathBuf>>,

    /// 新基线的名称 (默认 auto_baseline_<时间戳>)
    #[arg(short = 'n', long, requires = "baseline")]
    pub name: Option<String>,

    /// 报告格式 (默认取自配置文件)
    #[arg(short = 'o', long, value_enum, requires = "check")]
    pub output: Option<OutputFormat>,

    /// 将报告另存到配置的报告目录
    #[arg(long, requires = "check")]
    pub save_report: bool,

    /// 检测到变更时以退出码 1 结束
    #[arg(long, requires = "check")]
    pub fail_on_changes: bool,

    /// 仅显示此时间 (RFC 3339) 之后的历史
    #[arg(long, value_name = "RFC3339", requires = "history")]
    pub since: Option<String>,

    /// TOML 配置文件
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 覆盖配置中的数据库路径
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// 覆盖日志级别 (RUST_LOG 优先)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// The single operation selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Baseline { root: PathBuf, name: Option<String> },
    Check { root: PathBuf },
    History { root: PathBuf },
    ListBaselines { root: Option<PathBuf> },
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if let Some(root) = &self.baseline {
            Mode::Baseline { root: root.clone(), name: self.name.clone() }
        } else if let Some(root) = &self.check {
            Mode::Check { root: root.clone() }
        } else if let Some(root) = &self.history {
            Mode::History { root: root.clone() }
        } else {
            Mode::ListBaselines { root: self.list_baselines.clone().flatten() }
        }
    }
}
