//! Copy per-user library grants from one server to another by library title.
//!
//! Grants are only ever added: a user's destination share after a run is the
//! union of what they had and what they have on the source, restricted to
//! libraries that exist on the destination.

pub mod auth;
pub mod reconcile;

pub use auth::{authenticate, CodePrompt, TerminalPrompt, MFA_ATTEMPTS};
pub use reconcile::{reconcile, SectionCatalog, ShareDelta};

use crate::plex::{PlexError, PlexUser, ShareDirectory, SharedServer};
use plexsync_common::MachineId;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Push changes; otherwise only report them.
    pub apply: bool,
    /// Restrict to users matching any of these names or emails.
    pub only_users: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShareSummary {
    pub users_scanned: usize,
    pub users_updated: usize,
    pub grants_added: usize,
    pub failed: usize,
    pub applied: bool,
}

impl fmt::Display for ShareSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Users scanned: {}", self.users_scanned)?;
        writeln!(f, "  Users updated: {}", self.users_updated)?;
        writeln!(f, "  Library grants added on destination: {}", self.grants_added)?;
        if self.failed > 0 {
            writeln!(f, "  Users failed: {}", self.failed)?;
        }
        if !self.applied {
            write!(
                f,
                "  No changes were applied because this was a dry run. Use --apply to push updates."
            )?;
        }
        Ok(())
    }
}

/// Titles a share grants, expanding `allLibraries` to the whole catalog.
fn granted_titles(share: Option<&SharedServer>, catalog: &SectionCatalog) -> BTreeSet<String> {
    match share {
        None => BTreeSet::new(),
        Some(share) if share.all_libraries => catalog.titles().into_iter().collect(),
        Some(share) => share.shared_titles().map(String::from).collect(),
    }
}

fn share_of<'a>(shares: &'a [SharedServer], user: &PlexUser) -> Option<&'a SharedServer> {
    shares.iter().find(|s| s.belongs_to(user))
}

async fn catalog_of(
    directory: &dyn ShareDirectory,
    server: &MachineId,
    label: &str,
) -> Result<SectionCatalog, PlexError> {
    let catalog = SectionCatalog::new(directory.server_sections(server).await?);
    if !catalog.duplicates().is_empty() {
        tracing::warn!(
            "Server '{}' has duplicate library names: {:?}",
            label,
            catalog.duplicates()
        );
    }
    tracing::debug!(
        "{} libraries on '{}': {:?}",
        catalog.len(),
        label,
        catalog.titles()
    );
    Ok(catalog)
}

/// Plan, and with `apply` push, the grant union for every user.
pub async fn sync_shares(
    directory: &dyn ShareDirectory,
    source: &MachineId,
    dest: &MachineId,
    opts: &SyncOptions,
) -> Result<ShareSummary, PlexError> {
    let source_catalog = catalog_of(directory, source, source.as_str()).await?;
    let dest_catalog = catalog_of(directory, dest, dest.as_str()).await?;

    let mut summary = ShareSummary {
        applied: opts.apply,
        ..Default::default()
    };
    if dest_catalog.is_empty() {
        tracing::warn!("Destination '{}' has no libraries; nothing to share", dest);
        return Ok(summary);
    }

    let mut users = directory.users().await?;
    if !opts.only_users.is_empty() {
        users.retain(|u| u.matches_any(&opts.only_users));
        if users.is_empty() {
            tracing::warn!("No users matched --only-user filters");
        }
    }

    let source_shares = directory.shared_servers(source).await?;
    let dest_shares = directory.shared_servers(dest).await?;

    for user in &users {
        summary.users_scanned += 1;
        let label = user.label();

        let source_titles = granted_titles(share_of(&source_shares, user), &source_catalog);
        if source_titles.is_empty() {
            tracing::debug!("User '{}': no shares on source, skipping", label);
            continue;
        }
        tracing::info!("User '{}': source has {:?}", label, source_titles);

        let desired: BTreeSet<String> = source_titles
            .into_iter()
            .filter(|t| dest_catalog.contains(t))
            .collect();
        if desired.is_empty() {
            tracing::info!("  No matching libraries exist on destination. Skipping.");
            continue;
        }

        let existing = share_of(&dest_shares, user);
        let current = granted_titles(existing, &dest_catalog);
        tracing::debug!("  Current on destination: {:?}", current);

        let delta = reconcile(&current, &desired, &dest_catalog.titles());
        if delta.is_noop() {
            tracing::debug!("  No changes needed");
            continue;
        }
        tracing::info!("  Will add on destination for '{}': {:?}", label, delta.to_add);

        if opts.apply {
            let (ids, unknown) = dest_catalog.ids_for(&delta.final_set);
            if !unknown.is_empty() {
                tracing::debug!("  Skipping titles not on destination: {:?}", unknown);
            }
            if let Err(e) = directory.update_share(dest, user, existing, &ids).await {
                tracing::error!("  Failed to update shares for '{}': {}", label, e);
                summary.failed += 1;
                continue;
            }
            tracing::info!("  Applied");
        }

        summary.users_updated += 1;
        summary.grants_added += delta.to_add.len();
    }

    Ok(summary)
}
