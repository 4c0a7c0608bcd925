//! Low-resolution (SD) media scanner.
//!
//! An item is SD when the tallest of its media versions is strictly below the
//! threshold. Items that report no height at all are skipped.

pub mod report;

pub use report::{format_row, unique_paths, write_paths_csv, write_rows_csv};

use crate::error::AppError;
use crate::plex::{MediaServer, PlexError, RemoteItem, Section};
use plexsync_common::resolution::{classify, Definition};
use plexsync_common::{RatingKey, SectionKind};
use std::collections::HashMap;

/// What kind of row a result is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Movie,
    Episode,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
        }
    }
}

/// One SD movie or episode.
#[derive(Debug, Clone, PartialEq)]
pub struct SdRow {
    pub library: String,
    pub kind: RowKind,
    /// Movie title, or the show title for episodes.
    pub title: String,
    pub year: Option<i32>,
    pub show_title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_title: Option<String>,
    pub max_height: u32,
    pub rating_key: RatingKey,
    pub key: String,
    pub paths: Vec<String>,
}

/// Find a library by title, ignoring case.
pub async fn find_section(server: &dyn MediaServer, name: &str) -> Result<Section, AppError> {
    let sections = server.sections().await?;
    let wanted = name.to_lowercase();

    if let Some(section) = sections.iter().find(|s| s.title.to_lowercase() == wanted) {
        return Ok(section.clone());
    }

    let available: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
    tracing::error!("Could not open library '{}'", name);
    tracing::info!("Available libraries: {}", available.join(", "));
    Err(AppError::NotFound(format!("library '{}'", name)))
}

/// Height of a SD item, `None` when the item is HD or has no height.
fn sd_height(item: &RemoteItem, threshold: u32) -> Option<u32> {
    let Some(height) = item.max_height() else {
        tracing::debug!("No height info for {}: {}", item.kind, item.display_name());
        return None;
    };
    (classify(height, threshold) == Definition::Sd).then_some(height)
}

/// Season numbers resolved through the parent season, cached per run.
struct SeasonLookup<'a> {
    server: &'a dyn MediaServer,
    cache: HashMap<RatingKey, Option<u32>>,
}

impl<'a> SeasonLookup<'a> {
    fn new(server: &'a dyn MediaServer) -> Self {
        Self {
            server,
            cache: HashMap::new(),
        }
    }

    /// `parentIndex` when present, otherwise the parent season's own index.
    async fn season_of(&mut self, episode: &RemoteItem) -> Option<u32> {
        let info = episode.episode.as_ref()?;
        if info.season_number.is_some() {
            return info.season_number;
        }
        let key = info.season_key.as_ref()?;
        if let Some(cached) = self.cache.get(key) {
            return *cached;
        }

        let number = match self.server.item(key).await {
            Ok(season) => season.index,
            Err(e) => {
                tracing::debug!("Could not load season {} for '{}': {}", key, episode.title, e);
                None
            }
        };
        self.cache.insert(key.clone(), number);
        number
    }
}

/// Every SD movie or episode of one section.
///
/// Listing the section is fatal; a show whose episodes cannot be listed is
/// logged and skipped. Sections that are neither movie nor show yield nothing.
pub async fn scan_section(
    server: &dyn MediaServer,
    section: &Section,
    threshold: u32,
) -> Result<Vec<SdRow>, PlexError> {
    let mut rows = Vec::new();

    match section.kind {
        SectionKind::Movie => {
            for movie in server.section_items(section).await? {
                let Some(height) = sd_height(&movie, threshold) else {
                    continue;
                };
                rows.push(SdRow {
                    library: section.title.clone(),
                    kind: RowKind::Movie,
                    title: movie.title.clone(),
                    year: movie.year,
                    show_title: None,
                    season: None,
                    episode: None,
                    episode_title: None,
                    max_height: height,
                    paths: movie.file_paths(),
                    rating_key: movie.rating_key,
                    key: movie.key,
                });
            }
        }
        SectionKind::Show => {
            let mut seasons = SeasonLookup::new(server);
            for show in server.section_items(section).await? {
                let episodes = match server.episodes(&show).await {
                    Ok(episodes) => episodes,
                    Err(e) => {
                        tracing::warn!("Could not list episodes for show '{}': {}", show.title, e);
                        continue;
                    }
                };
                for ep in episodes {
                    let Some(height) = sd_height(&ep, threshold) else {
                        continue;
                    };
                    let season = seasons.season_of(&ep).await;
                    rows.push(SdRow {
                        library: section.title.clone(),
                        kind: RowKind::Episode,
                        title: show.title.clone(),
                        year: show.year,
                        show_title: Some(show.title.clone()),
                        season,
                        episode: ep
                            .episode
                            .as_ref()
                            .and_then(|e| e.episode_number)
                            .or(ep.index),
                        episode_title: Some(ep.title.clone()),
                        max_height: height,
                        paths: ep.file_paths(),
                        rating_key: ep.rating_key,
                        key: ep.key,
                    });
                }
            }
        }
        other => {
            tracing::warn!("Library type {} is not supported for SD scan", other);
        }
    }

    Ok(rows)
}
