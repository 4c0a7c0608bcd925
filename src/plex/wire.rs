//! JSON payloads of the Plex Media Server API.
//!
//! The server is loose with scalar types (a rating key may arrive as `"12"` or
//! `12`, booleans as `true`, `1`, or `"1"`), so scalars go through the lenient
//! helpers in [`de`].

use super::types::{Collection, EpisodeInfo, MediaPart, MediaVersion, Playlist, RemoteItem, Section};
use plexsync_common::{ItemKind, RatingKey, SectionKey, SectionKind};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "MediaContainer")]
    pub container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MediaContainer {
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub total_size: Option<u64>,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub machine_identifier: Option<String>,
    #[serde(default, rename = "Directory")]
    pub directories: Vec<Directory>,
    #[serde(default, rename = "Metadata")]
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Directory {
    #[serde(deserialize_with = "de::string")]
    pub key: String,
    #[serde(default)]
    pub title: String,
    /// Absent on non-section directories such as the root listing.
    #[serde(default, rename = "type")]
    pub kind: Option<SectionKind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Metadata {
    #[serde(deserialize_with = "de::string")]
    pub rating_key: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub index: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub parent_index: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub parent_rating_key: Option<String>,
    #[serde(default)]
    pub grandparent_title: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub art: Option<String>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub smart: Option<bool>,
    #[serde(default)]
    pub playlist_type: Option<String>,
    #[serde(default, rename = "librarySectionID", deserialize_with = "de::opt_string")]
    pub library_section_id: Option<String>,
    #[serde(default, rename = "Guid")]
    pub guids: Vec<GuidTag>,
    #[serde(default, rename = "Media")]
    pub media: Vec<Media>,
    #[serde(default, rename = "Collection")]
    pub collections: Vec<Tag>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GuidTag {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Tag {
    pub tag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Media {
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub height: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub video_resolution: Option<String>,
    #[serde(default, rename = "Part")]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Part {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, rename = "Stream")]
    pub streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Stream {
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub stream_type: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub height: Option<u64>,
}

/// Plex stream type for video.
const VIDEO_STREAM: u64 = 1;

fn to_u32(v: Option<u64>) -> Option<u32> {
    v.and_then(|n| u32::try_from(n).ok())
}

impl From<Directory> for Section {
    fn from(d: Directory) -> Self {
        Section {
            key: SectionKey::new(d.key),
            title: d.title,
            kind: d.kind.unwrap_or(SectionKind::Other),
        }
    }
}

impl From<Media> for MediaVersion {
    fn from(m: Media) -> Self {
        MediaVersion {
            height: to_u32(m.height),
            video_resolution: m.video_resolution,
            parts: m
                .parts
                .into_iter()
                .map(|p| MediaPart {
                    file: p.file,
                    video_heights: p
                        .streams
                        .iter()
                        .filter(|s| s.stream_type == Some(VIDEO_STREAM))
                        .filter_map(|s| to_u32(s.height))
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<Metadata> for RemoteItem {
    fn from(m: Metadata) -> Self {
        let kind = m
            .kind
            .as_deref()
            .and_then(|k| serde_json::from_value(Value::String(k.to_string())).ok())
            .unwrap_or(ItemKind::Other);

        let episode = (kind == ItemKind::Episode).then(|| EpisodeInfo {
            show_title: m.grandparent_title.clone(),
            season_number: to_u32(m.parent_index),
            season_key: m.parent_rating_key.clone().map(RatingKey::from),
            episode_number: to_u32(m.index),
        });

        let mut fields: BTreeMap<String, String> = m
            .extra
            .into_iter()
            .filter_map(|(name, value)| scalar_to_string(&value).map(|v| (name, v)))
            .collect();
        if let Some(title) = &m.title {
            fields.insert("title".to_string(), title.clone());
        }
        if let Some(year) = m.year {
            fields.insert("year".to_string(), year.to_string());
        }

        let rating_key = RatingKey::from(m.rating_key);
        RemoteItem {
            key: m
                .key
                .unwrap_or_else(|| format!("/library/metadata/{}", rating_key)),
            rating_key,
            title: m.title.unwrap_or_default(),
            kind,
            year: m.year.and_then(|y| i32::try_from(y).ok()),
            guids: m.guids.into_iter().map(|g| g.id).collect(),
            media: m.media.into_iter().map(MediaVersion::from).collect(),
            episode,
            index: to_u32(m.index),
            thumb: m.thumb,
            art: m.art,
            collections: m.collections.into_iter().map(|c| c.tag).collect(),
            fields,
        }
    }
}

impl From<Metadata> for Playlist {
    fn from(m: Metadata) -> Self {
        Playlist {
            rating_key: RatingKey::from(m.rating_key),
            title: m.title.unwrap_or_default(),
            smart: m.smart.unwrap_or(false),
            playlist_type: m.playlist_type,
        }
    }
}

impl Metadata {
    pub(crate) fn into_collection(self, fallback_section: &SectionKey) -> Collection {
        Collection {
            rating_key: RatingKey::from(self.rating_key),
            title: self.title.unwrap_or_default(),
            section: self
                .library_section_id
                .map(SectionKey::new)
                .unwrap_or_else(|| fallback_section.clone()),
        }
    }
}

/// Scalars become strings; objects and arrays are not editable fields.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) mod de {
    //! Lenient scalar deserializers.

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_string(v: Value) -> Option<String> {
        match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        as_string(Value::deserialize(d)?)
            .ok_or_else(|| serde::de::Error::custom("expected a string or number"))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(as_string(Value::deserialize(d)?))
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_u64().map(|n| n != 0),
            Value::String(s) => Some(matches!(s.as_str(), "1" | "true")),
            _ => None,
        })
    }
}
