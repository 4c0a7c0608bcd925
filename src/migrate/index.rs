//! Provider-identifier index of the destination server.

use crate::plex::{MediaServer, PlexError, RemoteItem};
use plexsync_common::{ProviderGuid, SectionKind};
use std::collections::HashMap;

/// Lowercased provider GUID to destination item.
///
/// When two items claim the same GUID the first one registered keeps it and
/// the conflict is counted.
#[derive(Debug, Default)]
pub struct IdentifierIndex {
    items: Vec<RemoteItem>,
    by_guid: HashMap<ProviderGuid, usize>,
    duplicates: usize,
}

impl IdentifierIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every GUID of an item.
    pub fn insert(&mut self, item: RemoteItem) {
        let slot = self.items.len();
        for guid in item.provider_guids() {
            match self.by_guid.get(&guid) {
                Some(&existing) if self.items[existing].rating_key != item.rating_key => {
                    tracing::debug!(
                        "GUID {} already maps to '{}', ignoring '{}'",
                        guid,
                        self.items[existing].title,
                        item.title
                    );
                    self.duplicates += 1;
                }
                Some(_) => {}
                None => {
                    self.by_guid.insert(guid, slot);
                }
            }
        }
        self.items.push(item);
    }

    /// Walk every movie and show section of a server.
    ///
    /// Listing the sections is fatal; a section or show that cannot be
    /// enumerated is logged and skipped.
    pub async fn build(server: &dyn MediaServer) -> Result<Self, PlexError> {
        let mut index = Self::new();

        for section in server.sections().await? {
            match section.kind {
                SectionKind::Movie | SectionKind::Show => {}
                _ => continue,
            }
            tracing::info!(
                "Indexing destination section '{}' ({})",
                section.title,
                section.kind
            );

            let items = match server.section_items(&section).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Failed to index section '{}': {}", section.title, e);
                    continue;
                }
            };

            if section.kind == SectionKind::Movie {
                items.into_iter().for_each(|item| index.insert(item));
                continue;
            }

            for show in items {
                match server.episodes(&show).await {
                    Ok(episodes) => episodes.into_iter().for_each(|ep| index.insert(ep)),
                    Err(e) => {
                        tracing::warn!("Could not enumerate episodes for '{}': {}", show.title, e)
                    }
                }
            }
        }

        tracing::info!(
            "Indexed {} GUIDs across {} destination items",
            index.len(),
            index.item_count()
        );
        if index.duplicates > 0 {
            tracing::warn!(
                "{} GUIDs were claimed by more than one destination item; the first item seen was kept",
                index.duplicates
            );
        }

        Ok(index)
    }

    pub fn get(&self, guid: &ProviderGuid) -> Option<&RemoteItem> {
        self.by_guid.get(guid).map(|&slot| &self.items[slot])
    }

    /// Distinct GUIDs.
    pub fn len(&self) -> usize {
        self.by_guid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_guid.is_empty()
    }

    /// Items registered, including ones without any GUID.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Registrations that lost to an earlier item.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexsync_common::ItemKind;

    fn movie(key: &str, guids: &[&str]) -> RemoteItem {
        RemoteItem::new(key, format!("Movie {}", key), ItemKind::Movie).with_guids(guids.to_vec())
    }

    #[test]
    fn test_first_seen_wins() {
        let mut index = IdentifierIndex::new();
        index.insert(movie("1", &["imdb://tt1", "tmdb://1"]));
        index.insert(movie("2", &["IMDB://TT1"]));

        let hit = index.get(&ProviderGuid::new("imdb://tt1")).unwrap();
        assert_eq!(hit.rating_key.as_str(), "1");
        assert_eq!(index.duplicates(), 1);
        assert_eq!(index.len(), 2);
        assert_eq!(index.item_count(), 2);
    }

    #[test]
    fn test_same_item_twice_is_not_a_conflict() {
        let mut index = IdentifierIndex::new();
        index.insert(movie("1", &["imdb://tt1"]));
        index.insert(movie("1", &["imdb://tt1"]));
        assert_eq!(index.duplicates(), 0);
    }

    #[test]
    fn test_items_without_guids_are_counted() {
        let mut index = IdentifierIndex::new();
        index.insert(movie("1", &[]));
        assert!(index.is_empty());
        assert_eq!(index.item_count(), 1);
    }
}
