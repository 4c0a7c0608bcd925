//! Playlist migration.

use super::batch::{apply_in_batches, PlaylistSink};
use super::index::IdentifierIndex;
use super::matcher::map_items;
use super::reconcile::plan_additions;
use crate::filter::{NameFilter, Rejection, RenameTemplate};
use crate::plex::{MediaServer, Playlist, PlexError};
use plexsync_common::RatingKey;
use std::fmt;

#[derive(Debug, Clone)]
pub struct PlaylistOptions {
    pub filter: NameFilter,
    /// Copy smart playlists as static lists of their current items.
    pub materialize_smart: bool,
    pub rename: RenameTemplate,
    pub replace: bool,
    pub batch_size: usize,
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub found: usize,
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items_added: usize,
    pub items_missed: usize,
}

impl fmt::Display for PlaylistSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Playlists: {} found, {} migrated, {} skipped, {} failed; {} items added, {} missed",
            self.found,
            self.migrated,
            self.skipped,
            self.failed,
            self.items_added,
            self.items_missed
        )
    }
}

/// Result of writing one playlist.
#[derive(Debug, Default)]
struct Written {
    added: usize,
    missed: usize,
}

/// Copy every eligible source playlist to the destination.
pub async fn migrate_playlists(
    source: &dyn MediaServer,
    dest: &dyn MediaServer,
    index: &IdentifierIndex,
    opts: &PlaylistOptions,
) -> Result<PlaylistSummary, PlexError> {
    let playlists = source.playlists().await?;
    tracing::info!("Found {} playlists on source", playlists.len());

    let mut existing = dest.playlists().await?;
    let mut summary = PlaylistSummary {
        found: playlists.len(),
        ..Default::default()
    };

    for playlist in &playlists {
        let name = &playlist.title;
        match opts.filter.check(name) {
            Ok(()) => {}
            Err(Rejection::NotIncluded) => {
                tracing::debug!("Skip '{}' due to include filter", name);
                summary.skipped += 1;
                continue;
            }
            Err(Rejection::Excluded) => {
                tracing::debug!("Skip '{}' due to exclude filter", name);
                summary.skipped += 1;
                continue;
            }
        }
        if playlist.smart && !opts.materialize_smart {
            tracing::info!(
                "Skipping smart playlist '{}' (use --materialize-smart to copy as static)",
                name
            );
            summary.skipped += 1;
            continue;
        }
        if !playlist.is_video() {
            tracing::info!(
                "Skipping non-video playlist '{}' of type '{}'",
                name,
                playlist.playlist_type.as_deref().unwrap_or_default()
            );
            summary.skipped += 1;
            continue;
        }

        let items = match source.playlist_items(playlist).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Error migrating playlist '{}': {}", name, e);
                summary.failed += 1;
                continue;
            }
        };

        let mapping = map_items(&items, index);
        tracing::debug!(
            "Matched {} of {} items for '{}'",
            mapping.matched(),
            items.len(),
            name
        );
        if !mapping.missing.is_empty() {
            tracing::debug!(
                "Missing first 10: {:?}",
                mapping.missing.iter().take(10).collect::<Vec<_>>()
            );
        }
        summary.items_missed += mapping.missing.len();

        let dest_name = opts.rename.render(name);
        if mapping.keys.is_empty() {
            tracing::warn!(
                "No destination items matched for '{}'. Skipping create.",
                name
            );
            summary.skipped += 1;
            continue;
        }

        match write_playlist(dest, &mut existing, &dest_name, &mapping.keys, opts).await {
            Ok(written) => {
                if !opts.dry_run {
                    tracing::info!(
                        "Wrote '{}': {} items added. Missed {}.",
                        dest_name,
                        written.added,
                        written.missed + mapping.missing.len()
                    );
                }
                summary.migrated += 1;
                summary.items_added += written.added;
                summary.items_missed += written.missed;
            }
            Err(e) => {
                tracing::error!("Error migrating playlist '{}': {}", name, e);
                summary.failed += 1;
            }
        }
    }

    tracing::info!("Done. Migrated {} playlists.", summary.migrated);
    Ok(summary)
}

/// Create, replace, or append to the destination playlist `name`.
/// `existing` is the destination's playlist list and is kept current.
async fn write_playlist(
    dest: &dyn MediaServer,
    existing: &mut Vec<Playlist>,
    name: &str,
    keys: &[RatingKey],
    opts: &PlaylistOptions,
) -> Result<Written, PlexError> {
    let mut target = existing.iter().position(|p| p.title == name);

    if let (Some(pos), true) = (target, opts.replace) {
        if opts.dry_run {
            tracing::info!("[DRY RUN] Would delete existing playlist '{}'", name);
        } else {
            tracing::info!("Deleting existing playlist '{}'", name);
            dest.delete_playlist(&existing[pos]).await?;
            existing.remove(pos);
        }
        target = None;
    }

    let Some(pos) = target else {
        if opts.dry_run {
            tracing::info!(
                "[DRY RUN] Would create playlist '{}' with {} items",
                name,
                keys.len()
            );
            return Ok(Written {
                added: keys.len(),
                missed: 0,
            });
        }
        return create_playlist(dest, existing, name, keys, opts.batch_size).await;
    };

    let playlist = existing[pos].clone();
    let current: Vec<RatingKey> = dest
        .playlist_items(&playlist)
        .await?
        .into_iter()
        .map(|item| item.rating_key)
        .collect();
    let additions = plan_additions(&current, keys);

    if opts.dry_run {
        tracing::info!(
            "[DRY RUN] Would append {} items to existing playlist '{}'",
            additions.len(),
            name
        );
        return Ok(Written {
            added: additions.len(),
            missed: 0,
        });
    }
    if additions.is_empty() {
        tracing::info!("Playlist '{}' is already up to date", name);
        return Ok(Written::default());
    }

    let outcome = apply_in_batches(
        &PlaylistSink::new(dest, &playlist),
        &additions,
        opts.batch_size,
    )
    .await?;
    Ok(Written {
        added: outcome.applied,
        missed: outcome.missed.len(),
    })
}

/// Create with one seed item, then add the rest in batches. A seed rejected
/// as empty is skipped in favour of the next key.
async fn create_playlist(
    dest: &dyn MediaServer,
    existing: &mut Vec<Playlist>,
    name: &str,
    keys: &[RatingKey],
    batch_size: usize,
) -> Result<Written, PlexError> {
    let mut rejected = 0;

    for (i, seed) in keys.iter().enumerate() {
        match dest.create_playlist(name, seed).await {
            Ok(playlist) => {
                let rest = &keys[i + 1..];
                tracing::info!(
                    "Created playlist '{}' with 1 seed item, adding {} in batches of {}",
                    name,
                    rest.len(),
                    batch_size
                );
                existing.push(playlist.clone());
                let outcome =
                    apply_in_batches(&PlaylistSink::new(dest, &playlist), rest, batch_size)
                        .await?;
                return Ok(Written {
                    added: 1 + outcome.applied,
                    missed: rejected + outcome.missed.len(),
                });
            }
            Err(e) if e.is_empty_batch() => {
                tracing::warn!(
                    "Seed ratingKey={} rejected as empty for '{}'; trying the next item",
                    seed,
                    name
                );
                rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Err(PlexError::EmptyBatch(format!(
        "every candidate seed for playlist '{}' was rejected",
        name
    )))
}
