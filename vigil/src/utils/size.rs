use std::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced while parsing a human size string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SizeParseError {
    #[error("Invalid size '{input}': {reason}")]
    Invalid { input: String, reason: String },
}

/// 将 "KB/MB/GB/TB" 改写为二进制单位 "KiB/MiB/GiB/TiB"
fn binary_units(input: &str) -> String {
    let trimmed = input.trim();
    let split = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let unit = unit.to_ascii_uppercase();
    match unit.as_str() {
        "KB" | "MB" | "GB" | "TB" => format!("{}{}iB", number.trim_end(), &unit[..1]),
        _ => trimmed.to_string(),
    }
}

/// Parses sizes like `"100MB"`, `"1.5 GB"`, `"512kb"` or `"4096"` into bytes.
///
/// `KB`, `MB` and `GB` are binary units (1 KB = 1024 bytes). A bare number is a
/// byte count.
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    binary_units(input)
        .parse::<bytesize::ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|reason| SizeParseError::Invalid {
            input: input.to_string(),
            reason,
        })
}

/// A byte count that deserializes from either an integer or a size string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub bytesize::ByteSize);

impl ByteSize {
    pub const fn b(bytes: u64) -> Self {
        Self(bytesize::ByteSize::b(bytes))
    }

    pub fn bytes(&self) -> u64 {
        self.0.as_u64()
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytesize::to_string(self.bytes(), true))
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bytes())
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bytes(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bytes(n) => Ok(ByteSize::b(n)),
            Raw::Text(s) => parse_size(&s).map(ByteSize::b).map_err(serde::de::Error::custom),
        }
    }
}
