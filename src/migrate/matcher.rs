//! Source-to-destination item matching by provider GUID.

use super::index::IdentifierIndex;
use super::reconcile::dedup_keys;
use crate::plex::RemoteItem;
use plexsync_common::{ProviderGuid, RatingKey};
use std::collections::HashSet;

/// First GUID, in source order, that the index knows about.
pub fn match_item<'a>(guids: &[ProviderGuid], index: &'a IdentifierIndex) -> Option<&'a RemoteItem> {
    guids.iter().find_map(|guid| index.get(guid))
}

/// Match a source item using its own GUIDs.
pub fn match_remote<'a>(item: &RemoteItem, index: &'a IdentifierIndex) -> Option<&'a RemoteItem> {
    match_item(&item.provider_guids(), index)
}

/// A source item with no destination counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingItem {
    pub title: String,
    pub first_guid: Option<String>,
}

/// Result of mapping a list of source items onto the destination.
#[derive(Debug, Default)]
pub struct Mapping {
    /// Destination keys in source order, without duplicates.
    pub keys: Vec<RatingKey>,
    pub missing: Vec<MissingItem>,
}

impl Mapping {
    pub fn matched(&self) -> usize {
        self.keys.len()
    }
}

/// Map source items to destination keys. Repeated source items are
/// considered once, and two source items resolving to the same
/// destination item produce a single key.
pub fn map_items(items: &[RemoteItem], index: &IdentifierIndex) -> Mapping {
    let mut seen_source: HashSet<&RatingKey> = HashSet::new();
    let mut keys = Vec::new();
    let mut missing = Vec::new();

    for item in items {
        if !seen_source.insert(&item.rating_key) {
            continue;
        }
        let guids = item.provider_guids();
        match match_item(&guids, index) {
            Some(dest) => keys.push(dest.rating_key.clone()),
            None => missing.push(MissingItem {
                title: item.display_name(),
                first_guid: guids.first().map(ToString::to_string),
            }),
        }
    }

    Mapping {
        keys: dedup_keys(keys),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexsync_common::ItemKind;

    fn item(key: &str, guids: &[&str]) -> RemoteItem {
        RemoteItem::new(key, format!("Item {}", key), ItemKind::Movie).with_guids(guids.to_vec())
    }

    fn index_of(items: Vec<RemoteItem>) -> IdentifierIndex {
        let mut index = IdentifierIndex::new();
        items.into_iter().for_each(|i| index.insert(i));
        index
    }

    #[test]
    fn test_later_guid_matches_when_first_is_unknown() {
        let index = index_of(vec![item("d1", &["y"])]);
        let guids = vec![ProviderGuid::new("X"), ProviderGuid::new("Y")];
        let hit = match_item(&guids, &index).unwrap();
        assert_eq!(hit.rating_key.as_str(), "d1");
    }

    #[test]
    fn test_first_guid_in_source_order_wins() {
        let index = index_of(vec![item("d1", &["tmdb://1"]), item("d2", &["imdb://tt1"])]);
        let source = item("s1", &["imdb://tt1", "tmdb://1"]);
        assert_eq!(match_remote(&source, &index).unwrap().rating_key.as_str(), "d2");
    }

    #[test]
    fn test_no_match() {
        let index = index_of(vec![item("d1", &["imdb://tt1"])]);
        assert!(match_remote(&item("s1", &["imdb://tt2"]), &index).is_none());
        assert!(match_remote(&item("s2", &[]), &index).is_none());
    }

    #[test]
    fn test_map_items_dedups_and_reports_missing() {
        let index = index_of(vec![
            item("d1", &["imdb://tt1"]),
            item("d2", &["imdb://tt2"]),
        ]);
        let source = vec![
            item("s1", &["imdb://tt1"]),
            item("s2", &["imdb://tt2"]),
            item("s1", &["imdb://tt1"]),
            item("s3", &["tmdb://1", "imdb://tt1"]),
            item("s4", &["tvdb://404"]),
        ];

        let mapping = map_items(&source, &index);
        let keys: Vec<&str> = mapping.keys.iter().map(RatingKey::as_str).collect();
        assert_eq!(keys, vec!["d1", "d2"]);
        assert_eq!(mapping.missing.len(), 1);
        assert_eq!(mapping.missing[0].first_guid.as_deref(), Some("tvdb://404"));
    }
}
