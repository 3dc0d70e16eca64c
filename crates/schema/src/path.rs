//! Field paths
//!
//! A [`FieldPath`] addresses one node of the schema tree as a dotted list of
//! property keys (`address.city`). The empty path is the root. Keys can never
//! contain a dot, so a path is never ambiguous.

use formforge_core::{BuilderError, BuilderResult};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::LazyLock;

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("key pattern is valid"));

/// Check whether a string is a legal property key
pub fn is_valid_key(key: &str) -> bool {
    KEY_PATTERN.is_match(key)
}

/// Resolvable address of a node in the schema tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// The root path
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path; the empty string is the root
    pub fn parse(raw: &str) -> BuilderResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in raw.split('.') {
            if !is_valid_key(segment) {
                return Err(BuilderError::InvalidKey(segment.to_string()));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Build a path from individual keys
    pub fn from_keys<I, S>(keys: I) -> BuilderResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments = Vec::new();
        for key in keys {
            let key = key.into();
            if !is_valid_key(&key) {
                return Err(BuilderError::InvalidKey(key));
            }
            segments.push(key);
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last key of the path (`None` for the root)
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path of the containing node (`None` for the root)
    pub fn parent(&self) -> Option<FieldPath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Path of a direct child
    pub fn child(&self, key: impl Into<String>) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    /// True when `self` equals `ancestor` or lies beneath it
    pub fn is_within(&self, ancestor: &FieldPath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    /// Dotted form, empty for the root
    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.to_dotted())
        }
    }
}

impl std::str::FromStr for FieldPath {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_dotted())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_display() {
        let path = FieldPath::parse("address.city").unwrap();
        assert_eq!(path.depth(), 2);
        assert_eq!(path.key(), Some("city"));
        assert_eq!(path.to_string(), "address.city");
        assert_eq!(FieldPath::root().to_string(), "<root>");
        assert!(FieldPath::parse("").unwrap().is_root());
    }

    #[test]
    fn test_parse_rejects_bad_segments() {
        assert!(FieldPath::parse("address..city").is_err());
        assert!(FieldPath::parse("1st").is_err());
        assert!(FieldPath::parse("has space").is_err());
    }

    #[test]
    fn test_parent_and_child() {
        let path = FieldPath::parse("a.b.c").unwrap();
        assert_eq!(path.parent().unwrap().to_dotted(), "a.b");
        assert_eq!(FieldPath::root().child("x").to_dotted(), "x");
        assert!(FieldPath::root().parent().is_none());
    }

    #[test]
    fn test_is_within() {
        let group = FieldPath::parse("group").unwrap();
        let inner = FieldPath::parse("group.name").unwrap();
        let other = FieldPath::parse("groupie").unwrap();
        assert!(inner.is_within(&group));
        assert!(group.is_within(&group));
        assert!(!other.is_within(&group));
        assert!(inner.is_within(&FieldPath::root()));
    }

    #[test]
    fn test_serde_as_string() {
        let path = FieldPath::parse("status").unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"status\"");
        let back: FieldPath = serde_json::from_str("\"group.status\"").unwrap();
        assert_eq!(back.segments(), &["group", "status"]);
        assert!(serde_json::from_str::<FieldPath>("\"bad key\"").is_err());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("user_id"));
        assert!(is_valid_key("_private"));
        assert!(is_valid_key("text-2"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("123user"));
        assert!(!is_valid_key("a.b"));
    }
}
