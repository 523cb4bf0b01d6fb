/// The current version of the baseline store schema.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// --- 存储元数据 ---
/// Metadata key for the schema version of the store.
pub const META_SCHEMA_VERSION: &str = "_vigil_schema_version";

/// Metadata key for the store creation timestamp (RFC 3339 format).
pub const META_STORE_CREATE_TIME: &str = "_vigil_create_time";

// --- 扫描常量 ---
/// Size of a single read while fingerprinting a file.
pub const FINGERPRINT_CHUNK_LEN: usize = 64 * 1024;

/// Number of fingerprint workers when the configuration does not say otherwise.
pub const DEFAULT_WORKERS: usize = 4;

/// Default upper bound for fingerprinted files (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Prefix of generated baseline names, followed by `%Y%m%d_%H%M%S`.
pub const AUTO_BASELINE_PREFIX: &str = "auto_baseline_";

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE_FILE: &str = "vigil_baseline.db";
