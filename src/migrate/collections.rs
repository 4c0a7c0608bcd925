//! Collection migration through per-item collection tags.

use super::index::IdentifierIndex;
use super::matcher::map_items;
use super::reconcile::plan_additions;
use crate::filter::{NameFilter, Rejection, RenameTemplate};
use crate::plex::{Collection, MediaServer, PlexError, Section};
use plexsync_common::RatingKey;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CollectionOptions {
    pub filter: NameFilter,
    pub rename: RenameTemplate,
    /// Clear destination membership before re-adding.
    pub replace: bool,
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub found: usize,
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items_added: usize,
    pub items_removed: usize,
    pub items_missed: usize,
}

impl fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Collections: {} found, {} migrated, {} skipped, {} failed; {} items added, {} removed, {} missed",
            self.found,
            self.migrated,
            self.skipped,
            self.failed,
            self.items_added,
            self.items_removed,
            self.items_missed
        )
    }
}

async fn video_sections(server: &dyn MediaServer) -> Result<Vec<Section>, PlexError> {
    Ok(server
        .sections()
        .await?
        .into_iter()
        .filter(|s| s.kind.is_video())
        .collect())
}

/// Current members of every destination collection called `name`.
async fn current_members(
    dest: &dyn MediaServer,
    dest_collections: &[Collection],
    name: &str,
) -> Result<Vec<RatingKey>, PlexError> {
    let mut keys = Vec::new();
    for coll in dest_collections.iter().filter(|c| c.title == name) {
        keys.extend(
            dest.collection_items(coll)
                .await?
                .into_iter()
                .map(|item| item.rating_key),
        );
    }
    Ok(keys)
}

/// Copy every eligible source collection to the destination.
pub async fn migrate_collections(
    source: &dyn MediaServer,
    dest: &dyn MediaServer,
    index: &IdentifierIndex,
    opts: &CollectionOptions,
) -> Result<CollectionSummary, PlexError> {
    let mut dest_collections = Vec::new();
    for section in video_sections(dest).await? {
        match dest.collections(&section).await {
            Ok(colls) => dest_collections.extend(colls),
            Err(e) => tracing::warn!(
                "Could not list destination collections for '{}': {}",
                section.title,
                e
            ),
        }
    }

    let mut summary = CollectionSummary::default();

    for section in video_sections(source).await? {
        let collections = match source.collections(&section).await {
            Ok(colls) => colls,
            Err(e) => {
                tracing::warn!("Could not list collections for section '{}': {}", section.title, e);
                continue;
            }
        };
        summary.found += collections.len();

        for coll in &collections {
            let name = &coll.title;
            match opts.filter.check(name) {
                Ok(()) => {}
                Err(Rejection::NotIncluded) => {
                    tracing::debug!("Skip collection '{}' due to include filter", name);
                    summary.skipped += 1;
                    continue;
                }
                Err(Rejection::Excluded) => {
                    tracing::debug!("Skip collection '{}' due to exclude filter", name);
                    summary.skipped += 1;
                    continue;
                }
            }

            match migrate_one(source, dest, index, &dest_collections, coll, opts).await {
                Ok(one) => {
                    summary.migrated += 1;
                    summary.items_added += one.added;
                    summary.items_removed += one.removed;
                    summary.items_missed += one.missed;
                }
                Err(e) => {
                    tracing::error!("Error migrating collection '{}': {}", name, e);
                    summary.failed += 1;
                }
            }
        }
    }

    tracing::info!("Done. Migrated {} collections.", summary.migrated);
    Ok(summary)
}

#[derive(Debug, Default)]
struct OneCollection {
    added: usize,
    removed: usize,
    missed: usize,
}

async fn migrate_one(
    source: &dyn MediaServer,
    dest: &dyn MediaServer,
    index: &IdentifierIndex,
    dest_collections: &[Collection],
    coll: &Collection,
    opts: &CollectionOptions,
) -> Result<OneCollection, PlexError> {
    let items = source.collection_items(coll).await?;
    let mapping = map_items(&items, index);
    let dest_name = opts.rename.render(&coll.title);
    tracing::debug!(
        "Mapped {} items for collection '{}', missing {}",
        mapping.matched(),
        dest_name,
        mapping.missing.len()
    );

    let mut one = OneCollection {
        missed: mapping.missing.len(),
        ..Default::default()
    };
    let mut current = current_members(dest, dest_collections, &dest_name).await?;

    if opts.replace && !current.is_empty() {
        if opts.dry_run {
            tracing::info!(
                "[DRY RUN] Would clear '{}' from {} items",
                dest_name,
                current.len()
            );
        } else {
            for key in &current {
                match dest.remove_collection_tag(key, &dest_name).await {
                    Ok(()) => one.removed += 1,
                    Err(e) => tracing::warn!(
                        "Failed to remove '{}' from ratingKey={}: {}",
                        dest_name,
                        key,
                        e
                    ),
                }
            }
            tracing::debug!("Cleared '{}' from {} items", dest_name, one.removed);
        }
        current.clear();
    }

    let additions = plan_additions(&current, &mapping.keys);
    if opts.dry_run {
        tracing::info!(
            "[DRY RUN] Would {}add {} items to collection '{}'",
            if opts.replace { "replace and " } else { "" },
            additions.len(),
            dest_name
        );
        one.added = additions.len();
        return Ok(one);
    }

    for key in &additions {
        match dest.add_collection_tag(key, &dest_name).await {
            Ok(()) => one.added += 1,
            Err(e) => {
                tracing::warn!("Failed to add '{}' to ratingKey={}: {}", dest_name, key, e);
                one.missed += 1;
            }
        }
    }

    tracing::info!(
        "Created or updated collection '{}' with {} new items. Missed {}.",
        dest_name,
        one.added,
        one.missed
    );
    Ok(one)
}
