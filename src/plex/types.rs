//! Domain handles for things that live on a Plex server.
//!
//! These are read-only snapshots. Nothing here is mutated locally; edits go
//! back through [`MediaServer`](super::MediaServer).

use plexsync_common::{ItemKind, ProviderGuid, RatingKey, SectionKey, SectionKind};
use std::collections::BTreeMap;

/// A library section (one "library" in the Plex UI).
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub key: SectionKey,
    pub title: String,
    pub kind: SectionKind,
}

/// One file of a media version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPart {
    pub file: Option<String>,
    /// Heights of video streams, when the server included stream detail.
    pub video_heights: Vec<u32>,
}

/// One media version (a movie can have several files at different qualities).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaVersion {
    pub height: Option<u32>,
    pub video_resolution: Option<String>,
    pub parts: Vec<MediaPart>,
}

impl MediaVersion {
    /// Best-effort height: explicit height, then the resolution label, then
    /// the tallest video stream.
    pub fn effective_height(&self) -> Option<u32> {
        self.height
            .filter(|h| *h > 0)
            .or_else(|| {
                self.video_resolution
                    .as_deref()
                    .and_then(plexsync_common::resolution::height_from_label)
            })
            .or_else(|| {
                self.parts
                    .iter()
                    .flat_map(|p| p.video_heights.iter().copied())
                    .filter(|h| *h > 0)
                    .max()
            })
    }
}

/// Position of an episode within its show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeInfo {
    pub show_title: Option<String>,
    /// `parentIndex` as reported on the episode itself.
    pub season_number: Option<u32>,
    /// Rating key of the parent season, used when `season_number` is absent.
    pub season_key: Option<RatingKey>,
    pub episode_number: Option<u32>,
}

/// A movie, show, season, or episode on one server.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteItem {
    pub rating_key: RatingKey,
    /// API path of the item (`/library/metadata/{ratingKey}`).
    pub key: String,
    pub title: String,
    pub kind: ItemKind,
    pub year: Option<i32>,
    /// Raw provider identifiers in server order.
    pub guids: Vec<String>,
    pub media: Vec<MediaVersion>,
    pub episode: Option<EpisodeInfo>,
    /// Own index (season number for seasons, episode number for episodes).
    pub index: Option<u32>,
    pub thumb: Option<String>,
    pub art: Option<String>,
    /// Titles of the collections the item belongs to.
    pub collections: Vec<String>,
    /// Scalar attributes by their API name (`summary`, `tagline`...).
    pub fields: BTreeMap<String, String>,
}

impl RemoteItem {
    /// Minimal item, mostly useful for fakes and tests.
    pub fn new(rating_key: impl Into<RatingKey>, title: impl Into<String>, kind: ItemKind) -> Self {
        let rating_key = rating_key.into();
        Self {
            key: format!("/library/metadata/{}", rating_key),
            rating_key,
            title: title.into(),
            kind,
            year: None,
            guids: Vec::new(),
            media: Vec::new(),
            episode: None,
            index: None,
            thumb: None,
            art: None,
            collections: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper to attach GUIDs.
    pub fn with_guids<I, S>(mut self, guids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guids = guids.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style helper to set a scalar field.
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    /// Case-folded, non-blank provider identifiers in server order.
    pub fn provider_guids(&self) -> Vec<ProviderGuid> {
        self.guids
            .iter()
            .filter_map(|g| ProviderGuid::parse(g).ok())
            .collect()
    }

    /// Whether the item is tagged with the collection, ignoring case.
    pub fn in_collection(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Scalar field lookup by API name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Maximum height across all media versions.
    pub fn max_height(&self) -> Option<u32> {
        self.media.iter().filter_map(MediaVersion::effective_height).max()
    }

    /// Files of every part of every version, in server order.
    pub fn file_paths(&self) -> Vec<String> {
        self.media
            .iter()
            .flat_map(|m| m.parts.iter())
            .filter_map(|p| p.file.clone())
            .filter(|f| !f.is_empty())
            .collect()
    }

    /// Human-readable label: `Show S01E02 - Title` for episodes.
    pub fn display_name(&self) -> String {
        match (&self.kind, &self.episode) {
            (ItemKind::Episode, Some(ep)) => {
                let show = ep.show_title.as_deref().unwrap_or("Unknown Show");
                match (ep.season_number, ep.episode_number) {
                    (Some(s), Some(e)) => format!("{} S{:02}E{:02} - {}", show, s, e, self.title),
                    _ => format!("{} - {}", show, self.title),
                }
            }
            _ => self.title.clone(),
        }
    }
}

/// A playlist on one server.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub rating_key: RatingKey,
    pub title: String,
    pub smart: bool,
    /// `video`, `audio`, or `photo`.
    pub playlist_type: Option<String>,
}

impl Playlist {
    /// Whether the playlist holds video (untyped playlists are assumed to).
    pub fn is_video(&self) -> bool {
        match self.playlist_type.as_deref() {
            None | Some("") => true,
            Some(t) => matches!(t.to_lowercase().as_str(), "video" | "movie" | "show"),
        }
    }
}

/// A collection inside one section.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub rating_key: RatingKey,
    pub title: String,
    pub section: SectionKey,
}
