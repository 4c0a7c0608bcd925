//! Core type definitions for sections, items, and artwork.
//!
//! All enums are serialized in lowercase, matching the `type` strings the
//! Plex API puts on sections and metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of library section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Movie library.
    Movie,
    /// TV library (shows, seasons, episodes).
    Show,
    /// Music library.
    Artist,
    /// Photo library.
    Photo,
    /// Anything the server reports that we do not handle.
    #[serde(other)]
    Other,
}

impl SectionKind {
    /// Whether this section holds video that can be indexed and migrated.
    pub fn is_video(self) -> bool {
        matches!(self, Self::Movie | Self::Show)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Show => write!(f, "show"),
            Self::Artist => write!(f, "artist"),
            Self::Photo => write!(f, "photo"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Kind of library item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A single movie.
    Movie,
    /// A TV series.
    Show,
    /// A season within a series.
    Season,
    /// A single episode within a season.
    Episode,
    /// Any other metadata type (clips, tracks, photos...).
    #[serde(other)]
    Other,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Show => write!(f, "show"),
            Self::Season => write!(f, "season"),
            Self::Episode => write!(f, "episode"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Artwork slot on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// Poster (`thumb`).
    Poster,
    /// Background (`art`).
    Background,
}

impl ImageKind {
    /// Path segment under `/library/metadata/{key}/` used to upload this slot.
    pub fn upload_segment(self) -> &'static str {
        match self {
            Self::Poster => "posters",
            Self::Background => "arts",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poster => write!(f, "poster"),
            Self::Background => write!(f, "background"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_kind_serde() {
        let kind: SectionKind = serde_json::from_str("\"show\"").unwrap();
        assert_eq!(kind, SectionKind::Show);
        let kind: SectionKind = serde_json::from_str("\"podcast\"").unwrap();
        assert_eq!(kind, SectionKind::Other);
    }

    #[test]
    fn test_is_video() {
        assert!(SectionKind::Movie.is_video());
        assert!(SectionKind::Show.is_video());
        assert!(!SectionKind::Artist.is_video());
        assert!(!SectionKind::Other.is_video());
    }

    #[test]
    fn test_image_kind_segment() {
        assert_eq!(ImageKind::Poster.upload_segment(), "posters");
        assert_eq!(ImageKind::Background.upload_segment(), "arts");
        assert_eq!(ImageKind::Background.to_string(), "background");
    }
}
