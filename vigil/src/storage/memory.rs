use chrono::{DateTime, Utc};
use crate::file::FileSet;
use crate::reconcile::{ChangeRecord, ChangeReport};
use crate::utils::time::now;
use super::{Baseline, BaselineStore, StoreError};

/// A non-durable store that keeps everything in process memory.
///
/// Behaves like `SqliteStore` for ordering and id assignment. Mostly useful for
/// tests and dry runs.
//
// // 将所有数据保存在进程内存中的非持久化存储。
#[derive(Debug, Default)]
pub struct MemoryStore {
    baselines: Vec<(Baseline, FileSet)>,
    history: Vec<(i64, ChangeRecord)>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history entries across all roots.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn root_of(&self, baseline_id: i64) -> Option<&str> {
        self.baselines
            .iter()
            .find(|(b, _)| b.id == baseline_id)
            .map(|(b, _)| b.root_path.as_str())
    }
}

/// 与 SQL 中的 `ORDER BY created_at DESC, id DESC` 一致
fn newest_first(a: &Baseline, b: &Baseline) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

impl BaselineStore for MemoryStore {
    fn create_baseline(&mut self, name: &str, root_path: &str, files: &FileSet) -> Result<Baseline, StoreError> {
        self.last_id += 1;
        let baseline = Baseline {
            id: self.last_id,
            name: name.to_string(),
            root_path: root_path.to_string(),
            created_at: now(),
            file_count: files.len() as u64,
            total_size: files.total_size(),
            algorithms: files.algorithms().clone(),
        };
        self.baselines.push((baseline.clone(), files.clone()));
        Ok(baseline)
    }

    fn get_latest_baseline(&self, root_path: &str) -> Result<Option<Baseline>, StoreError> {
        Ok(self
            .baselines
            .iter()
            .map(|(b, _)| b)
            .filter(|b| b.root_path == root_path)
            .min_by(|a, b| newest_first(a, b))
            .cloned())
    }

    fn load_file_set(&self, baseline_id: i64) -> Result<FileSet, StoreError> {
        self.baselines
            .iter()
            .find(|(b, _)| b.id == baseline_id)
            .map(|(_, files)| files.clone())
            .ok_or(StoreError::BaselineNotFound(baseline_id))
    }

    fn append_change_history(&mut self, report: &ChangeReport) -> Result<(), StoreError> {
        if self.root_of(report.baseline_id).is_none() {
            return Err(StoreError::BaselineNotFound(report.baseline_id));
        }
        self.history
            .extend(report.changes.iter().map(|c| (report.baseline_id, c.clone())));
        Ok(())
    }

    fn get_change_history(&self, root_path: &str, since: Option<DateTime<Utc>>) -> Result<Vec<ChangeRecord>, StoreError> {
        let mut records: Vec<ChangeRecord> = self
            .history
            .iter()
            .filter(|(id, _)| self.root_of(*id) == Some(root_path))
            .filter(|(_, c)| since.is_none_or(|s| c.detected_at >= s))
            .map(|(_, c)| c.clone())
            .collect();
        // 稳定排序，相同时间保持插入顺序
        records.sort_by_key(|c| c.detected_at);
        Ok(records)
    }

    fn list_baselines(&self, root_path: Option<&str>) -> Result<Vec<Baseline>, StoreError> {
        let mut baselines: Vec<Baseline> = self
            .baselines
            .iter()
            .map(|(b, _)| b)
            .filter(|b| root_path.is_none_or(|r| b.root_path == r))
            .cloned()
            .collect();
        baselines.sort_by(newest_first);
        Ok(baselines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::hash::AlgorithmSet;
    use crate::reconcile::Change;
    use crate::file::{FileRecord, RecordPath};

    fn empty() -> FileSet {
        FileSet::new(AlgorithmSet::default())
    }

    #[test]
    fn test_ids_increase_and_latest_wins() {
        let mut store = MemoryStore::new();
        let a = store.create_baseline("a", "/r", &empty()).unwrap();
        let b = store.create_baseline("b", "/r", &empty()).unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.get_latest_baseline("/r").unwrap().map(|x| x.id), Some(b.id));
        assert_eq!(store.list_baselines(None).unwrap()[0].id, b.id);
        assert!(matches!(store.load_file_set(42), Err(StoreError::BaselineNotFound(42))));
    }

    #[test]
    fn test_history_append_and_read() {
        let mut store = MemoryStore::new();
        let baseline = store.create_baseline("a", "/r", &empty()).unwrap();
        let old = FileRecord {
            path: RecordPath::from("/r/x"),
            digests: AlgorithmSet::default().iter().map(|a| (a, "0".repeat(a.hex_len()))).collect(),
            size_bytes: 0,
            modified_time: now(),
            permissions: 0,
            inode: None,
        };
        let report = ChangeReport {
            root_path: "/r".to_string(),
            baseline_id: baseline.id,
            baseline_name: baseline.name,
            scanned_at: now(),
            changes: vec![ChangeRecord::new(Change::Removed { old }, now())],
            skipped: Vec::new(),
        };
        store.append_change_history(&report).unwrap();
        assert_eq!(store.history_len(), 1);
        assert_eq!(store.get_change_history("/r", None).unwrap(), report.changes);
        assert!(store.get_change_history("/other", None).unwrap().is_empty());
    }
}
