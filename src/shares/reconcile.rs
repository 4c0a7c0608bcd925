//! Additive union of library grants.

use crate::plex::ServerSection;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Outcome of reconciling one user's grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareDelta {
    /// Titles granted by this run.
    pub to_add: BTreeSet<String>,
    /// Complete grant list after this run; always contains every current title.
    pub final_set: BTreeSet<String>,
}

impl ShareDelta {
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty()
    }
}

/// Union `current` with the desired titles that exist in `catalog`.
///
/// Matching against the catalog and against `current` ignores case; titles
/// taken from `desired` are written in the catalog's spelling. Desired
/// titles missing from the catalog are dropped.
pub fn reconcile(
    current: &BTreeSet<String>,
    desired: &BTreeSet<String>,
    catalog: &[String],
) -> ShareDelta {
    let by_folded: BTreeMap<String, &String> =
        catalog.iter().map(|t| (t.to_lowercase(), t)).collect();
    let present: HashSet<String> = current.iter().map(|t| t.to_lowercase()).collect();

    let mut to_add = BTreeSet::new();
    for title in desired {
        let folded = title.to_lowercase();
        match by_folded.get(&folded) {
            Some(spelled) if !present.contains(&folded) => {
                to_add.insert((*spelled).clone());
            }
            Some(_) => {}
            None => tracing::debug!("Library '{}' does not exist on destination", title),
        }
    }

    let final_set = current.iter().cloned().chain(to_add.iter().cloned()).collect();
    ShareDelta { to_add, final_set }
}

/// Case-insensitive title lookup over a server's sections.
#[derive(Debug, Clone, Default)]
pub struct SectionCatalog {
    by_folded: BTreeMap<String, ServerSection>,
    duplicates: BTreeSet<String>,
}

impl SectionCatalog {
    /// Later sections with an already-seen title replace earlier ones and are
    /// reported in [`duplicates`](Self::duplicates).
    pub fn new(sections: Vec<ServerSection>) -> Self {
        let mut catalog = Self::default();
        for section in sections {
            let folded = section.title.to_lowercase();
            if catalog.by_folded.contains_key(&folded) {
                catalog.duplicates.insert(section.title.clone());
            }
            catalog.by_folded.insert(folded, section);
        }
        catalog
    }

    pub fn get(&self, title: &str) -> Option<&ServerSection> {
        self.by_folded.get(&title.to_lowercase())
    }

    pub fn contains(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    /// Titles in catalog spelling.
    pub fn titles(&self) -> Vec<String> {
        self.by_folded.values().map(|s| s.title.clone()).collect()
    }

    pub fn duplicates(&self) -> &BTreeSet<String> {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.by_folded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_folded.is_empty()
    }

    /// Section ids for `titles`, plus the titles the catalog does not know.
    pub fn ids_for<'a, I>(&self, titles: I) -> (Vec<u64>, Vec<String>)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut ids = Vec::new();
        let mut unknown = Vec::new();
        for title in titles {
            match self.get(title) {
                Some(section) => ids.push(section.id),
                None => unknown.push(title.clone()),
            }
        }
        ids.sort_unstable();
        ids.dedup();
        (ids, unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(titles: &[&str]) -> BTreeSet<String> {
        titles.iter().map(|t| t.to_string()).collect()
    }

    fn catalog(titles: &[&str]) -> Vec<String> {
        titles.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_union_is_superset_of_current() {
        let current = set(&["Kids"]);
        let delta = reconcile(&current, &set(&["Movies", "Anime"]), &catalog(&["Movies", "Kids"]));

        assert!(delta.final_set.is_superset(&current));
        assert_eq!(delta.to_add, set(&["Movies"]));
        assert_eq!(delta.final_set, set(&["Kids", "Movies"]));
        let diff: BTreeSet<String> = delta.final_set.difference(&current).cloned().collect();
        assert_eq!(diff, delta.to_add);
    }

    #[test]
    fn test_catalog_spelling_wins() {
        let delta = reconcile(&set(&[]), &set(&["tv shows"]), &catalog(&["TV Shows"]));
        assert_eq!(delta.to_add, set(&["TV Shows"]));
    }

    #[test]
    fn test_already_granted_in_other_case_is_noop() {
        let delta = reconcile(&set(&["Movies"]), &set(&["MOVIES"]), &catalog(&["Movies"]));
        assert!(delta.is_noop());
        assert_eq!(delta.final_set, set(&["Movies"]));
    }

    #[test]
    fn test_current_titles_kept_even_when_not_in_catalog() {
        let delta = reconcile(&set(&["Old"]), &set(&["Movies"]), &catalog(&["Movies"]));
        assert_eq!(delta.final_set, set(&["Movies", "Old"]));
    }

    #[test]
    fn test_section_catalog() {
        let cat = SectionCatalog::new(vec![
            ServerSection { id: 1, key: "1".into(), title: "Movies".into() },
            ServerSection { id: 2, key: "2".into(), title: "TV".into() },
            ServerSection { id: 3, key: "3".into(), title: "movies".into() },
        ]);
        assert_eq!(cat.len(), 2);
        assert!(cat.duplicates().contains("movies"));
        assert_eq!(cat.get("MOVIES").unwrap().id, 3);

        let (ids, unknown) = cat.ids_for(&set(&["tv", "Movies", "Gone"]));
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(unknown, vec!["Gone".to_string()]);
    }
}
