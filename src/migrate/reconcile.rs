//! Membership planning for playlists and collections.
//!
//! Additions are always planned against what the destination already holds,
//! so running the same migration twice adds nothing the second time.

use plexsync_common::RatingKey;
use std::collections::HashSet;

/// Keep the first occurrence of every key, preserving order.
pub fn dedup_keys<I>(keys: I) -> Vec<RatingKey>
where
    I: IntoIterator<Item = RatingKey>,
{
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Desired keys, deduplicated and in order, that are not already present.
pub fn plan_additions(current: &[RatingKey], desired: &[RatingKey]) -> Vec<RatingKey> {
    let present: HashSet<&RatingKey> = current.iter().collect();
    dedup_keys(desired.iter().filter(|k| !present.contains(k)).cloned())
}
