use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tempfile::tempdir;
use vigil::common::hash::{AlgorithmSet, HashAlgorithm};
use vigil::monitor::{Monitor, MonitorConfig, MonitorError};
use vigil::reconcile::{Change, ChangeKind};
use vigil::scanner::SkipReason;
use vigil::storage::{BaselineStore, SqliteStore};

mod common;
use common::*;

/// 测试：基本场景 a/b/c。
/// 验证点：
/// 1. 报告恰好包含 MODIFIED a.txt、REMOVED b.txt、ADDED c.txt，且按路径排序。
/// 2. 修改记录携带 "hello" 与 "hello!" 的 sha256。
/// 3. 变更历史被持久化。
#[test]
fn test_modified_removed_added_scenario() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "a.txt", b"hello");
    write_file(&root, "b.txt", b"bye");
    let mut monitor = sqlite_monitor(&dir, &plain_config());

    let baseline = monitor.create_baseline(&root, Some("initial")).unwrap();
    assert_eq!(baseline.name, "initial");
    assert_eq!(baseline.file_count, 2);
    assert_eq!(baseline.total_size, 8);

    write_file(&root, "a.txt", b"hello!");
    fs::remove_file(root.join("b.txt")).unwrap();
    write_file(&root, "c.txt", b"new");

    let report = monitor.check_integrity(&root).unwrap();
    assert_eq!(report.baseline_id, baseline.id);
    assert_eq!(report.root_path, record_key(&root));
    let kinds: Vec<(ChangeKind, Option<&str>)> = report
        .changes
        .iter()
        .map(|c| (c.kind(), c.path().file_name()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (ChangeKind::Modified, Some("a.txt")),
            (ChangeKind::Removed, Some("b.txt")),
            (ChangeKind::Added, Some("c.txt")),
        ]
    );

    match &report.changes[0].change {
        Change::Modified { old, new } => {
            assert_eq!(old.digest(HashAlgorithm::Sha256), Some(HELLO_SHA256));
            assert_eq!(new.digest(HashAlgorithm::Sha256), Some(HELLO_BANG_SHA256));
            assert_eq!(old.size_bytes, 5);
            assert_eq!(new.size_bytes, 6);
        }
        other => panic!("Expected a modification, got {other:?}"),
    }

    let history = monitor.change_history(&root, None).unwrap();
    assert_eq!(history, report.changes);
}

/// 测试：未变化的目录不产生变更，也不写入历史。
#[test]
fn test_unchanged_tree_reports_nothing() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "etc/app.conf", b"port = 80");
    write_file(&root, "bin/tool", b"\x7fELF");
    let mut monitor = memory_monitor(&plain_config());

    monitor.create_baseline(&root, None).unwrap();
    let report = monitor.check_integrity(&root).unwrap();
    assert!(!report.has_changes());
    assert!(report.skipped.is_empty());
    assert_eq!(monitor.store().history_len(), 0);
}

/// 测试：超过大小限制的文件既不在基线中，也不出现在任何变更中。
#[test]
fn test_oversized_file_is_ignored_everywhere() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "small.txt", b"ok");
    write_file(&root, "huge.bin", &[7u8; 4096]);
    let config = MonitorConfig {
        max_file_size: vigil::utils::size::ByteSize::b(1024),
        ..plain_config()
    };
    let mut monitor = memory_monitor(&config);

    let baseline = monitor.create_baseline(&root, None).unwrap();
    assert_eq!(baseline.file_count, 1);

    write_file(&root, "huge.bin", &[8u8; 8192]);
    let report = monitor.check_integrity(&root).unwrap();
    assert!(!report.has_changes());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path.file_name(), Some("huge.bin"));
    assert!(matches!(report.skipped[0].reason, SkipReason::TooLarge { limit: 1024, .. }));
}

/// 测试：没有基线时检查失败，并且不写入任何历史。
#[test]
fn test_check_without_baseline_writes_nothing() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "a.txt", b"hello");
    let mut monitor = memory_monitor(&plain_config());

    let err = monitor.check_integrity(&root).unwrap_err();
    assert!(matches!(err, MonitorError::NoBaseline(ref r) if *r == record_key(&root)));
    assert_eq!(monitor.store().history_len(), 0);
    assert!(monitor.list_baselines(None).unwrap().is_empty());
}

/// 测试：根目录不存在时返回 RootNotFound。
#[test]
fn test_missing_root() {
    let dir = tempdir().unwrap();
    let mut monitor = memory_monitor(&plain_config());
    let err = monitor.create_baseline(&dir.path().join("absent"), None).unwrap_err();
    assert!(matches!(err, MonitorError::RootNotFound(_)));
}

/// 测试：已有基线的根目录被删除后，检查把所有基线文件报告为 REMOVED。
/// 验证点：
/// 1. 检查成功完成，而不是返回 RootNotFound。
/// 2. 每个基线文件都有一条 REMOVED 记录，并写入历史。
#[test]
fn test_deleted_root_reports_every_file_removed() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "a.txt", b"hello");
    write_file(&root, "sub/b.txt", b"bye");
    let mut monitor = memory_monitor(&plain_config());
    monitor.create_baseline(&root, Some("before")).unwrap();

    fs::remove_dir_all(&root).unwrap();
    let report = monitor.check_integrity(&root).unwrap();

    assert_eq!(report.changes.len(), 2);
    assert!(report.changes.iter().all(|c| c.kind() == ChangeKind::Removed));
    assert_eq!(report.changes[0].path().as_str(), record_key(&root.join("a.txt")));
    assert_eq!(monitor.change_history(&root, None).unwrap(), report.changes);

    // 创建基线仍然要求根目录存在
    let err = monitor.create_baseline(&root, None).unwrap_err();
    assert!(matches!(err, MonitorError::RootNotFound(_)));
}

/// 测试：内容改变但大小与修改时间都不变的文件依然被报告为 MODIFIED。
#[test]
fn test_same_size_same_mtime_rewrite_is_modified() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    let path = write_file(&root, "a.txt", b"hello");
    let mtime = fs::metadata(&path).unwrap().modified().unwrap();
    let mut monitor = memory_monitor(&plain_config());
    monitor.create_baseline(&root, None).unwrap();

    fs::write(&path, b"jello").unwrap();
    fs::File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), mtime);

    let report = monitor.check_integrity(&root).unwrap();
    assert_eq!(report.changes.len(), 1);
    match &report.changes[0].change {
        Change::Modified { old, new } => {
            assert_eq!(old.size_bytes, new.size_bytes);
            assert_eq!(old.modified_time, new.modified_time);
            assert_eq!(old.digest(HashAlgorithm::Sha256), Some(HELLO_SHA256));
            assert_ne!(old.digests, new.digests);
        }
        other => panic!("Expected a modification, got {other:?}"),
    }
}

/// 测试：检查时无法读取的文件被报告为 REMOVED，检查照常完成。
#[cfg(unix)]
#[test]
fn test_unreadable_file_during_check_is_removed() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "open.txt", b"open");
    let secret = write_file(&root, "secret.txt", b"secret");
    let mut monitor = memory_monitor(&plain_config());
    monitor.create_baseline(&root, None).unwrap();

    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&secret).is_ok() {
        // 以 root 身份运行时权限位不生效
        return;
    }

    let report = monitor.check_integrity(&root).unwrap();
    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].kind(), ChangeKind::Removed);
    assert_eq!(report.changes[0].path().file_name(), Some("secret.txt"));
    assert!(matches!(report.skipped[0].reason, SkipReason::Unreadable { .. }));
}

/// 测试：权限变化被识别为修改，仅修改时间变化则不会。
#[cfg(unix)]
#[test]
fn test_permission_change_without_content_change() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    let script = write_file(&root, "run.sh", b"#!/bin/sh\n");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();
    let mut monitor = memory_monitor(&plain_config());
    monitor.create_baseline(&root, None).unwrap();

    // 重写相同内容只会改变修改时间
    write_file(&root, "run.sh", b"#!/bin/sh\n");
    assert!(!monitor.check_integrity(&root).unwrap().has_changes());

    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    let report = monitor.check_integrity(&root).unwrap();
    assert_eq!(report.changes.len(), 1);
    match &report.changes[0].change {
        Change::Modified { old, new } => {
            assert_eq!(old.permissions, 0o644);
            assert_eq!(new.permissions, 0o755);
            assert_eq!(old.digests, new.digests);
        }
        other => panic!("Expected a modification, got {other:?}"),
    }
}

/// 测试：关键路径下的变更被标记。
#[test]
fn test_critical_paths_are_flagged() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "etc/passwd", b"root:x:0:0");
    write_file(&root, "var/cache.db", b"v1");
    let config = MonitorConfig {
        critical_paths: vec![root.join("etc")],
        ..plain_config()
    };
    let mut monitor = memory_monitor(&config);
    monitor.create_baseline(&root, None).unwrap();

    write_file(&root, "etc/passwd", b"root:x:0:0\nmallory:x:0:0");
    write_file(&root, "var/cache.db", b"v2");
    let report = monitor.check_integrity(&root).unwrap();

    let flags: Vec<(Option<&str>, bool)> = report
        .changes
        .iter()
        .map(|c| (c.path().file_name(), c.critical))
        .collect();
    assert_eq!(flags, vec![(Some("passwd"), true), (Some("cache.db"), false)]);
    assert_eq!(report.summary().critical, 1);
}

/// 测试：检查使用基线自己的算法集合，而不是当前配置的算法集合。
/// 验证点：
/// 1. 配置改变后依旧可以检查旧基线。
/// 2. 重新打开数据库后基线仍可用。
#[test]
fn test_check_uses_the_baseline_algorithms() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "a.txt", b"hello");

    let md5_only = MonitorConfig {
        algorithms: vec!["md5".to_string()],
        ..plain_config()
    };
    let baseline = sqlite_monitor(&dir, &md5_only).create_baseline(&root, None).unwrap();
    assert_eq!(baseline.algorithms, AlgorithmSet::from_str("md5").unwrap());

    let mut monitor = sqlite_monitor(&dir, &plain_config());
    assert_eq!(monitor.algorithms(), &AlgorithmSet::default());
    write_file(&root, "a.txt", b"hello!");
    let report = monitor.check_integrity(&root).unwrap();
    assert_eq!(report.changes.len(), 1);
    let new = report.changes[0].change.new_record().unwrap();
    assert_eq!(new.digests.len(), 1);
    assert!(new.digest(HashAlgorithm::Md5).is_some());
}

/// 测试：同一目录的不同写法对应同一个基线，最新基线优先。
#[test]
fn test_root_spelling_and_latest_baseline() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "a.txt", b"one");
    let mut monitor = memory_monitor(&plain_config());

    let winding: PathBuf = root.join("..").join("watched").join(".");
    monitor.create_baseline(&winding, Some("first")).unwrap();
    write_file(&root, "b.txt", b"two");
    let second = monitor.create_baseline(&root, Some("second")).unwrap();

    let report = monitor.check_integrity(&root).unwrap();
    assert_eq!(report.baseline_id, second.id);
    assert_eq!(report.baseline_name, "second");
    assert!(!report.has_changes());

    let names: Vec<String> = monitor
        .list_baselines(Some(winding.as_path()))
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["second", "first"]);
}

/// 测试：生成的基线名称使用 auto_baseline_ 前缀。
#[test]
fn test_generated_baseline_name() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    let mut monitor = memory_monitor(&plain_config());
    let baseline = monitor.create_baseline(&root, None).unwrap();
    let stamp = baseline.name.strip_prefix("auto_baseline_").unwrap();
    assert_eq!(stamp.len(), "20250101_000000".len());
    assert_eq!(baseline.file_count, 0);
}

/// 测试：变更历史按时间排序，并支持 since 过滤。
#[test]
fn test_history_accumulates_across_checks() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "a.txt", b"1");
    let mut monitor = sqlite_monitor(&dir, &plain_config());
    monitor.create_baseline(&root, None).unwrap();

    write_file(&root, "a.txt", b"2");
    let first = monitor.check_integrity(&root).unwrap();
    write_file(&root, "z.txt", b"3");
    let second = monitor.check_integrity(&root).unwrap();
    assert_eq!(second.changes.len(), 2);

    let history = monitor.change_history(&root, None).unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].detected_at <= w[1].detected_at));

    let recent = monitor.change_history(&root, Some(second.scanned_at)).unwrap();
    assert_eq!(recent, second.changes);
    assert!(first.scanned_at < second.scanned_at);
}

/// 测试：基线一经创建，后续检查不会改变它。
#[test]
fn test_baseline_is_not_mutated_by_checks() {
    let dir = tempdir().unwrap();
    let root = setup_watched_dir(&dir);
    write_file(&root, "a.txt", b"hello");
    let store = SqliteStore::open(&dir.path().join("vigil.db")).unwrap();
    let mut monitor = Monitor::new(&plain_config(), store).unwrap();
    let baseline = monitor.create_baseline(&root, None).unwrap();
    let before = monitor.store().load_file_set(baseline.id).unwrap();

    write_file(&root, "a.txt", b"changed");
    monitor.check_integrity(&root).unwrap();
    monitor.check_integrity(&root).unwrap();

    assert_eq!(monitor.store().load_file_set(baseline.id).unwrap(), before);
    assert_eq!(monitor.list_baselines(None).unwrap().len(), 1);
}
