use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Component, Path, PathBuf};
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, Value, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Turns `path` into an absolute, lexically normalized path.
///
/// `.` segments are dropped and `..` segments remove their parent. Symbolic
/// links are not resolved, so the same spelling of a root always yields the
/// same key, whether or not the directory still exists.
//
// // 将路径转换为绝对的、按词法规范化的路径。不解析符号链接。
pub fn normalize_root(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    Ok(normalize_lexically(&absolute))
}

/// 规范化的核心逻辑，不访问文件系统。
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // 根目录之上没有父目录，".." 在根处被忽略
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// The identity of a tracked file: its absolute, normalized path.
///
/// Ordering is plain lexicographic ordering of the path string, which is the
/// order every change report is sorted by.
//
// // 被跟踪文件的身份：绝对的、规范化的路径。排序即路径字符串的字典序。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordPath {
    inner: String,
}

impl RecordPath {
    /// Wraps an already normalized absolute path string.
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self { inner: path.into() }
    }

    /// 以 &str 的形式返回路径字符串。
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.inner)
    }

    /// The final component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.as_path().file_name().and_then(|n| n.to_str())
    }

    /// Component-wise prefix test: `/etc/passwd` is under `/etc`, `/etcetera` is not.
    pub fn is_under(&self, prefix: &Path) -> bool {
        self.as_path().starts_with(prefix)
    }
}

/// 允许 `RecordPath::from(Path::new("..."))`
///
/// Non UTF-8 components are replaced lossily, so the scanner never builds a key
/// from such a path.
impl From<&Path> for RecordPath {
    fn from(p: &Path) -> Self {
        RecordPath::new(p.to_string_lossy().into_owned())
    }
}

impl From<&str> for RecordPath {
    fn from(s: &str) -> Self {
        RecordPath::new(s)
    }
}

impl Display for RecordPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

/// 存储到数据库时，编码为 TEXT
impl ToSql for RecordPath {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(Value::Text(self.inner.clone())))
    }
}

impl FromSql for RecordPath {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(RecordPath::new)
    }
}

impl Serialize for RecordPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> Deserialize<'de> for RecordPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(RecordPath::new)
    }
}
