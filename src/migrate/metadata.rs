//! Field and artwork sync between matched items.

use super::index::IdentifierIndex;
use super::matcher::match_remote;
use crate::filter::NameFilter;
use crate::plex::{MediaServer, PlexError, RemoteItem};
use plexsync_common::{ImageKind, SectionKind};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Source and destination value of one differing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub source: Option<String>,
    pub dest: Option<String>,
}

/// Fields whose trimmed values differ. A missing field counts as empty.
pub fn diff_fields(
    source: &RemoteItem,
    dest: &RemoteItem,
    fields: &[String],
) -> BTreeMap<String, FieldDiff> {
    let trimmed = |v: Option<&str>| v.unwrap_or_default().trim().to_string();

    fields
        .iter()
        .filter_map(|field| {
            let src = source.field(field);
            let dst = dest.field(field);
            (trimmed(src) != trimmed(dst)).then(|| {
                (
                    field.clone(),
                    FieldDiff {
                        source: src.map(String::from),
                        dest: dst.map(String::from),
                    },
                )
            })
        })
        .collect()
}

/// One edit call with every value, then one lock per field when asked.
/// Lock failures are logged and otherwise ignored.
pub async fn apply_fields(
    server: &dyn MediaServer,
    dest: &RemoteItem,
    values: &BTreeMap<String, String>,
    lock: bool,
) -> Result<(), PlexError> {
    if values.is_empty() {
        return Ok(());
    }
    server.edit_fields(&dest.rating_key, values).await?;

    if lock {
        for field in values.keys() {
            if let Err(e) = server.lock_field(&dest.rating_key, field).await {
                tracing::debug!("Could not lock '{}' on '{}': {}", field, dest.title, e);
            }
        }
    }
    tracing::debug!(
        "Applied fields {:?} to '{}'",
        values.keys().collect::<Vec<_>>(),
        dest.title
    );
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkStatus {
    Copied,
    /// The source item has no such image.
    Absent,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtworkOutcome {
    pub poster: ArtworkStatus,
    pub background: ArtworkStatus,
}

impl ArtworkOutcome {
    pub fn any_copied(&self) -> bool {
        self.poster == ArtworkStatus::Copied || self.background == ArtworkStatus::Copied
    }
}

/// Copy poster and background independently; one failing does not stop
/// the other.
pub async fn copy_artwork(
    source_server: &dyn MediaServer,
    dest_server: &dyn MediaServer,
    source_item: &RemoteItem,
    dest_item: &RemoteItem,
) -> ArtworkOutcome {
    let poster = copy_one(
        source_server,
        dest_server,
        source_item.thumb.as_deref(),
        dest_item,
        ImageKind::Poster,
    )
    .await;
    let background = copy_one(
        source_server,
        dest_server,
        source_item.art.as_deref(),
        dest_item,
        ImageKind::Background,
    )
    .await;
    ArtworkOutcome { poster, background }
}

async fn copy_one(
    source_server: &dyn MediaServer,
    dest_server: &dyn MediaServer,
    path: Option<&str>,
    dest_item: &RemoteItem,
    kind: ImageKind,
) -> ArtworkStatus {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return ArtworkStatus::Absent;
    };
    match copy_image(source_server, dest_server, path, dest_item, kind).await {
        Ok(()) => {
            tracing::debug!("Copied {} for '{}'", kind, dest_item.title);
            ArtworkStatus::Copied
        }
        Err(e) => {
            tracing::warn!("Failed to copy {} for '{}': {}", kind, dest_item.title, e);
            ArtworkStatus::Failed
        }
    }
}

async fn copy_image(
    source_server: &dyn MediaServer,
    dest_server: &dyn MediaServer,
    path: &str,
    dest_item: &RemoteItem,
    kind: ImageKind,
) -> Result<(), PlexError> {
    let bytes = source_server.fetch_image(path).await?;

    let mut file = tempfile::Builder::new()
        .prefix("plexsync-")
        .suffix(".jpg")
        .tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;

    dest_server
        .upload_image(&dest_item.rating_key, kind, file.path())
        .await
}

#[derive(Debug, Clone)]
pub struct MetadataOptions {
    pub fields: Vec<String>,
    pub artwork: bool,
    pub lock_fields: bool,
    /// Applied to source titles.
    pub filter: NameFilter,
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetadataSummary {
    pub scanned: usize,
    pub matched: usize,
    pub updated: usize,
    pub artwork_copied: usize,
    pub failed: usize,
}

impl fmt::Display for MetadataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Metadata sync: scanned {}, matched {}, updated {}, artwork copied {}, failed {}",
            self.scanned, self.matched, self.updated, self.artwork_copied, self.failed
        )
    }
}

/// Source items eligible for sync: movies, and episodes of shows, mirroring
/// what the destination index holds.
async fn source_items(server: &dyn MediaServer) -> Result<Vec<RemoteItem>, PlexError> {
    let mut out = Vec::new();
    for section in server.sections().await? {
        if !matches!(section.kind, SectionKind::Movie | SectionKind::Show) {
            continue;
        }
        tracing::info!("Scanning source section '{}' for metadata sync", section.title);

        let items = match server.section_items(&section).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Could not list section '{}': {}", section.title, e);
                continue;
            }
        };
        if section.kind == SectionKind::Movie {
            out.extend(items);
            continue;
        }
        for show in items {
            match server.episodes(&show).await {
                Ok(episodes) => out.extend(episodes),
                Err(e) => tracing::warn!("Could not list episodes for '{}': {}", show.title, e),
            }
        }
    }
    Ok(out)
}

/// Align configured fields (and optionally artwork) of every matched item.
pub async fn sync_metadata(
    source: &dyn MediaServer,
    dest: &dyn MediaServer,
    index: &IdentifierIndex,
    opts: &MetadataOptions,
) -> Result<MetadataSummary, PlexError> {
    let mut summary = MetadataSummary::default();

    for item in source_items(source).await? {
        summary.scanned += 1;
        if !opts.filter.allows(&item.title) {
            continue;
        }
        let Some(matched) = match_remote(&item, index) else {
            continue;
        };
        summary.matched += 1;

        // Listings can omit fields; compare full detail.
        let pair = async {
            let src = source.item(&item.rating_key).await?;
            let dst = dest.item(&matched.rating_key).await?;
            Ok::<_, PlexError>((src, dst))
        };
        let (src_full, dest_full) = match pair.await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!("Could not load detail for '{}': {}", item.display_name(), e);
                summary.failed += 1;
                continue;
            }
        };

        let diffs = diff_fields(&src_full, &dest_full, &opts.fields);
        if !diffs.is_empty() {
            tracing::debug!(
                "'{}': diffs -> {:?}",
                item.display_name(),
                diffs.keys().collect::<Vec<_>>()
            );
        }
        if opts.dry_run {
            if !diffs.is_empty() {
                tracing::info!(
                    "[DRY RUN] Would update {:?} on '{}'",
                    diffs.keys().collect::<Vec<_>>(),
                    dest_full.display_name()
                );
                summary.updated += 1;
            }
            continue;
        }

        if !diffs.is_empty() {
            let values: BTreeMap<String, String> = diffs
                .into_iter()
                .map(|(field, diff)| (field, diff.source.unwrap_or_default()))
                .collect();
            match apply_fields(dest, &dest_full, &values, opts.lock_fields).await {
                Ok(()) => summary.updated += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to edit fields {:?} on '{}': {}",
                        values.keys().collect::<Vec<_>>(),
                        dest_full.display_name(),
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        if opts.artwork && copy_artwork(source, dest, &src_full, &dest_full).await.any_copied() {
            summary.artwork_copied += 1;
        }
    }

    tracing::info!(
        "Metadata sync complete. Scanned {} items. Updated {}.",
        summary.scanned,
        summary.updated
    );
    Ok(summary)
}
