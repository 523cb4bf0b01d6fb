//! Plain text output.

use vigil::file::FileRecord;
use vigil::reconcile::{Change, ChangeKind, ChangeRecord, ChangeReport};
use vigil::scanner::SkipReason;
use vigil::storage::Baseline;

const RULE: &str = "============================================================";
const SUBRULE: &str = "----------------------------------------";

/// 取规范顺序中的第一个摘要作为展示用摘要
fn primary_digest(record: &FileRecord) -> String {
    record
        .digests
        .iter()
        .next()
        .map(|(algorithm, digest)| format!("{algorithm}:{}", &digest[..digest.len().min(16)]))
        .unwrap_or_else(|| "-".to_string())
}

fn critical_marker(record: &ChangeRecord) -> &'static str {
    if record.critical { " [CRITICAL]" } else { "" }
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::TooLarge { size, limit } => {
            format!(
                "too large ({} > {})",
                bytesize::to_string(*size, true),
                bytesize::to_string(*limit, true)
            )
        }
        SkipReason::Unreadable { error } => format!("unreadable ({error})"),
        SkipReason::Symlink => "symbolic link".to_string(),
        SkipReason::Special => "special file".to_string(),
        SkipReason::NonUtf8Path => "path is not valid UTF-8".to_string(),
    }
}

fn push_change_details(lines: &mut Vec<String>, change: &Change) {
    if let Change::Modified { old, new } = change {
        if old.digests != new.digests {
            lines.push(format!("    Old hash: {}...", primary_digest(old)));
            lines.push(format!("    New hash: {}...", primary_digest(new)));
        }
        if old.size_bytes != new.size_bytes {
            lines.push(format!("    Size: {} -> {} bytes", old.size_bytes, new.size_bytes));
        }
        if old.permissions != new.permissions {
            lines.push(format!("    Permissions: {:o} -> {:o}", old.permissions, new.permissions));
        }
    }
}

/// Text report grouped by change kind.
pub fn render_report(report: &ChangeReport) -> String {
    let mut lines = vec![
        RULE.to_string(),
        "VIGIL FILE INTEGRITY MONITOR - CHANGE REPORT".to_string(),
        RULE.to_string(),
        format!("Root:      {}", report.root_path),
        format!("Baseline:  {} (id {})", report.baseline_name, report.baseline_id),
        format!("Scanned:   {}", report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")),
        String::new(),
    ];

    if report.has_changes() {
        let summary = report.summary();
        lines.push(format!("Total changes detected: {}", summary.total()));
        if summary.critical > 0 {
            lines.push(format!("Critical changes: {}", summary.critical));
        }
        lines.push(String::new());

        for kind in [ChangeKind::Added, ChangeKind::Modified, ChangeKind::Removed] {
            let group: Vec<&ChangeRecord> = report.changes.iter().filter(|c| c.kind() == kind).collect();
            if group.is_empty() {
                continue;
            }
            lines.push(format!("[{kind}] ({} files)", group.len()));
            lines.push(SUBRULE.to_string());
            for record in group {
                lines.push(format!("  {}{}", record.path(), critical_marker(record)));
                push_change_details(&mut lines, &record.change);
            }
            lines.push(String::new());
        }
    } else {
        lines.push("No changes detected. System integrity maintained.".to_string());
        lines.push(String::new());
    }

    if !report.skipped.is_empty() {
        lines.push(format!("[SKIPPED] ({} files)", report.skipped.len()));
        lines.push(SUBRULE.to_string());
        for skipped in &report.skipped {
            lines.push(format!("  {} - {}", skipped.path, describe_skip(&skipped.reason)));
        }
        lines.push(String::new());
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// One line per historical change, oldest first.
pub fn render_history(root: &str, history: &[ChangeRecord]) -> String {
    if history.is_empty() {
        return format!("No recorded changes for {root}.\n");
    }
    let mut text = String::new();
    for record in history {
        text.push_str(&format!(
            "{}  {:<8}  {}{}\n",
            record.detected_at.format("%Y-%m-%d %H:%M:%S"),
            record.kind(),
            record.path(),
            critical_marker(record),
        ));
    }
    text
}

/// Table of baselines, newest first.
pub fn render_baselines(baselines: &[Baseline]) -> String {
    if baselines.is_empty() {
        return "No baselines found.\n".to_string();
    }
    let mut text = format!(
        "{:<6} {:<32} {:<20} {:>8} {:>10}  {}\n",
        "ID", "NAME", "CREATED", "FILES", "SIZE", "ROOT"
    );
    for baseline in baselines {
        text.push_str(&format!(
            "{:<6} {:<32} {:<20} {:>8} {:>10}  {}\n",
            baseline.id,
            baseline.name,
            baseline.created_at.format("%Y-%m-%d %H:%M:%S"),
            baseline.file_count,
            bytesize::to_string(baseline.total_size, true),
            baseline.root_path,
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use vigil::common::hash::HashAlgorithm;
    use vigil::file::RecordPath;

    fn record(path: &str, digest: char, size: u64) -> FileRecord {
        FileRecord {
            path: RecordPath::from(path),
            digests: [(HashAlgorithm::Sha256, digest.to_string().repeat(64))].into_iter().collect(),
            size_bytes: size,
            modified_time: DateTime::<Utc>::UNIX_EPOCH,
            permissions: 0o644,
            inode: None,
        }
    }

    fn report(changes: Vec<ChangeRecord>) -> ChangeReport {
        ChangeReport {
            root_path: "/srv".to_string(),
            baseline_id: 7,
            baseline_name: "nightly".to_string(),
            scanned_at: DateTime::<Utc>::UNIX_EPOCH,
            changes,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_empty_report() {
        let text = render_report(&report(Vec::new()));
        assert!(text.contains("No changes detected"));
        assert!(text.contains("nightly (id 7)"));
    }

    #[test]
    fn test_groups_and_details() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        let mut critical = ChangeRecord::new(Change::Removed { old: record("/srv/b", 'b', 1) }, at);
        critical.critical = true;
        let text = render_report(&report(vec![
            ChangeRecord::new(Change::Modified { old: record("/srv/a", 'a', 5), new: record("/srv/a", 'c', 6) }, at),
            critical,
        ]));
        assert!(text.contains("Total changes detected: 2"));
        assert!(text.contains("[MODIFIED] (1 files)"));
        assert!(text.contains("Old hash: sha256:aaaaaaaaaaaaaaaa..."));
        assert!(text.contains("Size: 5 -> 6 bytes"));
        assert!(text.contains("/srv/b [CRITICAL]"));
        assert!(!text.contains("[ADDED]"));
    }
}
