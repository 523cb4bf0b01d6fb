use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use rusqlite::{ToSql, types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef}};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A digest algorithm supported by the fingerprinter.
///
/// The declaration order is the canonical order used when an algorithm set is
/// printed or persisted.
//
// // 指纹计算支持的摘要算法。声明顺序即规范顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha1,
    Md5,
}

/// Errors produced while parsing algorithm names.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AlgorithmParseError {
    #[error("Unsupported hash algorithm '{0}' (supported: sha256, sha1, md5)")]
    Unknown(String),
    #[error("At least one hash algorithm must be selected")]
    Empty,
}

impl HashAlgorithm {
    /// All supported algorithms, in canonical order.
    pub const ALL: [HashAlgorithm; 3] = [HashAlgorithm::Sha256, HashAlgorithm::Sha1, HashAlgorithm::Md5];

    /// The lowercase identifier used in configuration, storage and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Md5 => "md5",
        }
    }

    /// Length of the lowercase hex digest.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Md5 => 32,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = AlgorithmParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "md5" => Ok(HashAlgorithm::Md5),
            other => Err(AlgorithmParseError::Unknown(other.to_string())),
        }
    }
}

impl Serialize for HashAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HashAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        HashAlgorithm::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Mapping from algorithm to lowercase hex digest.
pub type DigestMap = BTreeMap<HashAlgorithm, String>;

/// A non-empty set of digest algorithms.
///
/// Every record of a file set is fingerprinted with exactly this set, and two
/// file sets can only be reconciled when their sets are equal.
//
// // 非空的摘要算法集合。同一文件集中的每条记录都使用该集合计算指纹。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlgorithmSet(BTreeSet<HashAlgorithm>);

impl AlgorithmSet {
    /// Builds a set from already parsed algorithms. Fails on an empty input.
    pub fn new<I: IntoIterator<Item = HashAlgorithm>>(algorithms: I) -> Result<Self, AlgorithmParseError> {
        let set: BTreeSet<HashAlgorithm> = algorithms.into_iter().collect();
        if set.is_empty() {
            return Err(AlgorithmParseError::Empty);
        }
        Ok(Self(set))
    }

    /// Parses algorithm names such as `["sha256", "md5"]`.
    pub fn parse<I, S>(names: I) -> Result<Self, AlgorithmParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let algorithms = names
            .into_iter()
            .map(|name| HashAlgorithm::from_str(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(algorithms)
    }

    pub fn iter(&self) -> impl Iterator<Item = HashAlgorithm> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, algorithm: HashAlgorithm) -> bool {
        self.0.contains(&algorithm)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `digests` holds exactly one entry per algorithm of this set.
    pub fn covers_exactly(&self, digests: &DigestMap) -> bool {
        digests.len() == self.0.len() && digests.keys().all(|a| self.0.contains(a))
    }
}

impl Default for AlgorithmSet {
    fn default() -> Self {
        Self(HashAlgorithm::ALL.into_iter().collect())
    }
}

/// 允许 `println!("{}", set)`，输出 "sha256,sha1,md5"
impl fmt::Display for AlgorithmSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|a| a.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for AlgorithmSet {
    type Err = AlgorithmParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.split(',').map(str::trim).filter(|p| !p.is_empty()))
    }
}

impl Serialize for AlgorithmSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for AlgorithmSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let algorithms = Vec::<HashAlgorithm>::deserialize(deserializer)?;
        AlgorithmSet::new(algorithms).map_err(serde::de::Error::custom)
    }
}

/// 存储到数据库时，编码为逗号分隔的 TEXT
impl ToSql for AlgorithmSet {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(Value::Text(self.to_string())))
    }
}

impl FromSql for AlgorithmSet {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().and_then(|s| {
            AlgorithmSet::from_str(s).map_err(|e| FromSqlError::Other(Box::new(e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm_names() {
        assert_eq!(HashAlgorithm::from_str("SHA256").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::from_str(" md5 ").unwrap(), HashAlgorithm::Md5);
        assert_eq!(
            HashAlgorithm::from_str("crc32").unwrap_err(),
            AlgorithmParseError::Unknown("crc32".to_string())
        );
    }

    #[test]
    fn test_algorithm_set_canonical_order() {
        let set = AlgorithmSet::from_str("md5, sha256,sha1,md5").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_string(), "sha256,sha1,md5");
        assert_eq!(AlgorithmSet::default(), set);
    }

    #[test]
    fn test_empty_algorithm_set_is_rejected() {
        assert_eq!(AlgorithmSet::from_str(" , ").unwrap_err(), AlgorithmParseError::Empty);
        let names: Vec<String> = Vec::new();
        assert_eq!(AlgorithmSet::parse(names).unwrap_err(), AlgorithmParseError::Empty);
    }

    #[test]
    fn test_covers_exactly() {
        let set = AlgorithmSet::from_str("sha256,md5").unwrap();
        let mut digests = DigestMap::new();
        digests.insert(HashAlgorithm::Sha256, "a".repeat(64));
        assert!(!set.covers_exactly(&digests));
        digests.insert(HashAlgorithm::Md5, "b".repeat(32));
        assert!(set.covers_exactly(&digests));
        digests.insert(HashAlgorithm::Sha1, "c".repeat(40));
        assert!(!set.covers_exactly(&digests));
    }

    #[test]
    fn test_serde_json_uses_lowercase_names() {
        let set = AlgorithmSet::from_str("sha1,sha256").unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["sha256","sha1"]"#);
        let back: AlgorithmSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);

        let mut digests = DigestMap::new();
        digests.insert(HashAlgorithm::Md5, "00".repeat(16));
        let json = serde_json::to_string(&digests).unwrap();
        assert!(json.starts_with(r#"{"md5":"#));
    }

    #[test]
    fn test_rusqlite_roundtrip() {
        let set = AlgorithmSet::from_str("md5,sha1").unwrap();
        let text = match set.to_sql().unwrap() {
            ToSqlOutput::Owned(Value::Text(t)) => t,
            _ => panic!("Should serialize to Text"),
        };
        assert_eq!(text, "sha1,md5");
        let recovered = AlgorithmSet::column_result(ValueRef::Text(text.as_bytes())).unwrap();
        assert_eq!(recovered, set);
    }
}
