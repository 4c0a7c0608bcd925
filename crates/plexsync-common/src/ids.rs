//! Typed ID wrappers for type safety across plexsync.
//!
//! Plex hands out identifiers as strings (numeric in practice). These newtypes
//! keep a destination rating key from being passed where a section key or a
//! provider GUID is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-local identifier of a library item, playlist, or collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingKey(String);

impl RatingKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RatingKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RatingKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for RatingKey {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-local identifier of a library section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionKey(String);

impl SectionKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Globally unique identifier of a server instance (`machineIdentifier`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(String);

impl MachineId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// External provider identifier (e.g. `imdb://tt0111161`), case-folded.
///
/// Two servers that matched the same title against the same metadata agent
/// expose the same GUIDs, which makes this the cross-server join key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderGuid(String);

impl ProviderGuid {
    /// Trim and lowercase a raw identifier.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Parse a raw identifier, rejecting blank input.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let guid = Self::new(raw);
        if guid.0.is_empty() {
            return Err(crate::Error::invalid_input("empty provider GUID"));
        }
        Ok(guid)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_is_case_folded_and_trimmed() {
        let guid = ProviderGuid::new("  TMDB://603 ");
        assert_eq!(guid.as_str(), "tmdb://603");
        assert_eq!(guid, ProviderGuid::new("tmdb://603"));
    }

    #[test]
    fn test_guid_parse_rejects_blank() {
        assert!(ProviderGuid::parse("   ").is_err());
        assert!(ProviderGuid::parse("tvdb://81189").is_ok());
    }

    #[test]
    fn test_rating_key_serde_transparent() {
        let key = RatingKey::from(42u64);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"42\"");
        let back: RatingKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_display() {
        assert_eq!(RatingKey::from("17").to_string(), "17");
        assert_eq!(SectionKey::from("3").to_string(), "3");
        assert_eq!(MachineId::new("abc").to_string(), "abc");
    }
}
