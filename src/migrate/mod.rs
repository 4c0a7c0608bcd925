//! Server-to-server migration of playlists, collections, and metadata.
//!
//! Items are matched across servers by provider GUID through an
//! [`IdentifierIndex`] of the destination, built once per run. Every write is
//! additive unless replace mode is on, so an interrupted run can simply be
//! started again.

pub mod batch;
pub mod collections;
pub mod index;
pub mod matcher;
pub mod metadata;
pub mod playlists;
pub mod reconcile;

pub use batch::{apply_in_batches, BatchOutcome, BatchSink, PlaylistSink};
pub use collections::{migrate_collections, CollectionOptions, CollectionSummary};
pub use index::IdentifierIndex;
pub use matcher::{map_items, match_item, match_remote, Mapping, MissingItem};
pub use metadata::{
    apply_fields, copy_artwork, diff_fields, sync_metadata, ArtworkOutcome, ArtworkStatus,
    FieldDiff, MetadataOptions, MetadataSummary,
};
pub use playlists::{migrate_playlists, PlaylistOptions, PlaylistSummary};
pub use reconcile::{dedup_keys, plan_additions};

use crate::plex::{MediaServer, PlexError};

/// Which steps to run; `None` disables a step.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    pub playlists: Option<PlaylistOptions>,
    pub collections: Option<CollectionOptions>,
    pub metadata: Option<MetadataOptions>,
}

impl MigrateOptions {
    pub fn is_empty(&self) -> bool {
        self.playlists.is_none() && self.collections.is_none() && self.metadata.is_none()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrateSummary {
    pub playlists: Option<PlaylistSummary>,
    pub collections: Option<CollectionSummary>,
    pub metadata: Option<MetadataSummary>,
}

impl MigrateSummary {
    /// Summary lines for every step that ran.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(s) = &self.playlists {
            lines.push(s.to_string());
        }
        if let Some(s) = &self.collections {
            lines.push(s.to_string());
        }
        if let Some(s) = &self.metadata {
            lines.push(s.to_string());
        }
        lines
    }
}

/// Run the enabled steps in order: playlists, collections, metadata.
///
/// Failing to build the index or to list top-level source state is fatal;
/// failures local to one playlist, collection, or item are counted in the
/// summary.
pub async fn run(
    source: &dyn MediaServer,
    dest: &dyn MediaServer,
    opts: &MigrateOptions,
) -> Result<MigrateSummary, PlexError> {
    let mut summary = MigrateSummary::default();
    if opts.is_empty() {
        tracing::warn!("Nothing to do: playlists, collections, and metadata sync are all disabled");
        return Ok(summary);
    }

    let index = IdentifierIndex::build(dest).await?;

    if let Some(playlist_opts) = &opts.playlists {
        summary.playlists = Some(migrate_playlists(source, dest, &index, playlist_opts).await?);
    }
    if let Some(collection_opts) = &opts.collections {
        summary.collections =
            Some(migrate_collections(source, dest, &index, collection_opts).await?);
    }
    if let Some(metadata_opts) = &opts.metadata {
        summary.metadata = Some(sync_metadata(source, dest, &index, metadata_opts).await?);
    }

    Ok(summary)
}
