/// Tables, indexes and immutability triggers of the baseline store.
///
/// Timestamps are fixed-width RFC 3339 strings, so `ORDER BY` on them is
/// chronological. Digest columns are nullable; which ones are populated is given
/// by `baselines.algorithms`.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS store_metadata (
    meta_key            TEXT PRIMARY KEY NOT NULL,
    meta_value          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS baselines (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT NOT NULL,
    root_path           TEXT NOT NULL,
    created_at          TEXT NOT NULL,
    file_count          INTEGER NOT NULL,
    total_size          INTEGER NOT NULL,
    algorithms          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_baselines_root ON baselines(root_path, created_at);

CREATE TABLE IF NOT EXISTS baseline_files (
    baseline_id         INTEGER NOT NULL,
    path                TEXT NOT NULL,
    size                INTEGER NOT NULL,
    modified_time       TEXT NOT NULL,
    permissions         INTEGER NOT NULL,
    inode               INTEGER,
    sha256              CHAR(64),
    sha1                CHAR(40),
    md5                 CHAR(32),
    PRIMARY KEY (baseline_id, path),
    FOREIGN KEY (baseline_id) REFERENCES baselines(id)
);

CREATE TABLE IF NOT EXISTS change_history (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    baseline_id         INTEGER NOT NULL,
    change_type         TEXT NOT NULL CHECK (change_type IN ('ADDED', 'MODIFIED', 'REMOVED')),
    path                TEXT NOT NULL,
    old_record          TEXT,
    new_record          TEXT,
    detected_at         TEXT NOT NULL,
    scanned_at          TEXT NOT NULL,
    critical            INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (baseline_id) REFERENCES baselines(id)
);
CREATE INDEX IF NOT EXISTS idx_history_detected ON change_history(baseline_id, detected_at);

CREATE TRIGGER IF NOT EXISTS baselines_no_update BEFORE UPDATE ON baselines
BEGIN SELECT RAISE(ABORT, 'baselines are immutable'); END;
CREATE TRIGGER IF NOT EXISTS baselines_no_delete BEFORE DELETE ON baselines
BEGIN SELECT RAISE(ABORT, 'baselines are immutable'); END;

CREATE TRIGGER IF NOT EXISTS baseline_files_no_update BEFORE UPDATE ON baseline_files
BEGIN SELECT RAISE(ABORT, 'baseline files are immutable'); END;
CREATE TRIGGER IF NOT EXISTS baseline_files_no_delete BEFORE DELETE ON baseline_files
BEGIN SELECT RAISE(ABORT, 'baseline files are immutable'); END;

CREATE TRIGGER IF NOT EXISTS change_history_no_update BEFORE UPDATE ON change_history
BEGIN SELECT RAISE(ABORT, 'change history is append-only'); END;
CREATE TRIGGER IF NOT EXISTS change_history_no_delete BEFORE DELETE ON change_history
BEGIN SELECT RAISE(ABORT, 'change history is append-only'); END;
";
