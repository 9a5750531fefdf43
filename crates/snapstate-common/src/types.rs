use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of one schema migration and of the snapshot shape it produces.
///
/// Versions are `YYYYMMDDhhmm` timestamps and order numerically. On disk they
/// are written as a JSON string of digits; a bare JSON number is accepted on
/// read so hand-edited snapshots still restore.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SchemaVersion(u64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid schema version {raw:?}: expected a non-negative integer")]
pub struct VersionParseError {
    pub raw: String,
}

impl SchemaVersion {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parse a version as it appears in `meta.version`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, VersionParseError> {
        match value {
            serde_json::Value::String(s) => s.parse(),
            serde_json::Value::Number(n) => n.as_u64().map(Self).ok_or_else(|| VersionParseError {
                raw: n.to_string(),
            }),
            other => Err(VersionParseError {
                raw: other.to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.to_string())
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SchemaVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionParseError { raw: s.to_string() });
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| VersionParseError { raw: s.to_string() })
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
