//! Shared fakes for integration tests.
//!
//! [`FakeServer`] is an in-memory [`MediaServer`] and [`FakeDirectory`] an
//! in-memory [`ShareDirectory`]. Both record every write so tests can assert
//! on exactly what a run would have sent.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use plexsync::plex::account::SharedSection;
use plexsync::plex::{
    Collection, EpisodeInfo, MediaPart, MediaServer, MediaVersion, Playlist, PlexError, PlexUser,
    RemoteItem, Section, ServerSection, ShareDirectory, SharedServer,
};
use plexsync_common::{ImageKind, ItemKind, MachineId, RatingKey, SectionKey, SectionKind};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Item builders
// ---------------------------------------------------------------------------

pub fn movie(key: &str, title: &str, guids: &[&str]) -> RemoteItem {
    RemoteItem::new(key, title, ItemKind::Movie).with_guids(guids.to_vec())
}

pub fn show(key: &str, title: &str) -> RemoteItem {
    RemoteItem::new(key, title, ItemKind::Show)
}

pub fn episode(key: &str, title: &str, guids: &[&str]) -> RemoteItem {
    let mut ep = RemoteItem::new(key, title, ItemKind::Episode).with_guids(guids.to_vec());
    ep.episode = Some(EpisodeInfo::default());
    ep
}

/// Attach one media version with an explicit height and file.
pub fn with_height(mut item: RemoteItem, height: u32, file: &str) -> RemoteItem {
    item.media.push(MediaVersion {
        height: Some(height),
        video_resolution: None,
        parts: vec![MediaPart {
            file: Some(file.to_string()),
            video_heights: vec![],
        }],
    });
    item
}

// ---------------------------------------------------------------------------
// FakeServer
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeState {
    pub sections: Vec<Section>,
    pub section_items: HashMap<SectionKey, Vec<RemoteItem>>,
    pub episodes: HashMap<RatingKey, Vec<RemoteItem>>,
    /// Items only reachable through `item()` (seasons).
    pub extra_items: Vec<RemoteItem>,
    pub failing_sections: HashSet<SectionKey>,
    pub failing_shows: HashSet<RatingKey>,

    pub playlists: Vec<(Playlist, Vec<RatingKey>)>,
    /// title -> (section, members)
    pub collections: BTreeMap<String, (SectionKey, Vec<RatingKey>)>,

    pub images: HashMap<String, Bytes>,

    /// Reject any multi-item add with the empty-batch error.
    pub reject_batches: bool,
    /// Seeds that `create_playlist` rejects as empty.
    pub reject_seeds: HashSet<RatingKey>,

    pub add_calls: Vec<Vec<RatingKey>>,
    pub created_playlists: Vec<String>,
    pub deleted_playlists: Vec<String>,
    pub tags_added: Vec<(RatingKey, String)>,
    pub tags_removed: Vec<(RatingKey, String)>,
    pub edits: Vec<(RatingKey, BTreeMap<String, String>)>,
    pub locks: Vec<(RatingKey, String)>,
    pub uploads: Vec<(RatingKey, ImageKind, Vec<u8>)>,
    next_key: u64,
}

impl FakeState {
    fn all_items(&self) -> impl Iterator<Item = &RemoteItem> {
        self.section_items
            .values()
            .flatten()
            .chain(self.episodes.values().flatten())
            .chain(self.extra_items.iter())
    }

    /// Item by key, with its collection tags taken from current membership.
    fn find(&self, key: &RatingKey) -> Option<RemoteItem> {
        let mut item = self.all_items().find(|i| &i.rating_key == key).cloned()?;
        item.collections = self
            .collections
            .iter()
            .filter(|(_, (_, keys))| keys.contains(key))
            .map(|(title, _)| title.clone())
            .collect();
        Some(item)
    }

    fn resolve(&self, keys: &[RatingKey]) -> Vec<RemoteItem> {
        keys.iter().filter_map(|k| self.find(k)).collect()
    }
}

pub struct FakeServer {
    name: String,
    machine_id: MachineId,
    pub state: Mutex<FakeState>,
}

impl FakeServer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            machine_id: MachineId::new(format!("{}-machine", name)),
            state: Mutex::new(FakeState {
                next_key: 9000,
                ..Default::default()
            }),
        }
    }

    pub fn with_section(self, key: &str, title: &str, kind: SectionKind, items: Vec<RemoteItem>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let key = SectionKey::new(key);
            state.sections.push(Section {
                key: key.clone(),
                title: title.to_string(),
                kind,
            });
            state.section_items.insert(key, items);
        }
        self
    }

    pub fn with_episodes(self, show_key: &str, episodes: Vec<RemoteItem>) -> Self {
        self.state
            .lock()
            .unwrap()
            .episodes
            .insert(RatingKey::from(show_key), episodes);
        self
    }

    pub fn with_extra_item(self, item: RemoteItem) -> Self {
        self.state.lock().unwrap().extra_items.push(item);
        self
    }

    pub fn with_playlist(self, key: &str, title: &str, smart: bool, kind: &str, items: &[&str]) -> Self {
        self.state.lock().unwrap().playlists.push((
            Playlist {
                rating_key: RatingKey::from(key),
                title: title.to_string(),
                smart,
                playlist_type: Some(kind.to_string()),
            },
            items.iter().map(|k| RatingKey::from(*k)).collect(),
        ));
        self
    }

    pub fn with_collection(self, section: &str, title: &str, items: &[&str]) -> Self {
        self.state.lock().unwrap().collections.insert(
            title.to_string(),
            (
                SectionKey::new(section),
                items.iter().map(|k| RatingKey::from(*k)).collect(),
            ),
        );
        self
    }

    pub fn with_image(self, path: &str, bytes: &'static [u8]) -> Self {
        self.state
            .lock()
            .unwrap()
            .images
            .insert(path.to_string(), Bytes::from_static(bytes));
        self
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Member keys of a playlist by title.
    pub fn playlist_keys(&self, title: &str) -> Option<Vec<String>> {
        self.state()
            .playlists
            .iter()
            .find(|(p, _)| p.title == title)
            .map(|(_, keys)| keys.iter().map(|k| k.to_string()).collect())
    }

    /// Member keys of a collection by title, sorted.
    pub fn collection_keys(&self, title: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state()
            .collections
            .get(title)
            .map(|(_, keys)| keys.iter().map(|k| k.to_string()).collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

fn video_section(state: &FakeState) -> SectionKey {
    state
        .sections
        .iter()
        .find(|s| s.kind.is_video())
        .map(|s| s.key.clone())
        .unwrap_or_else(|| SectionKey::new("1"))
}

#[async_trait]
impl MediaServer for FakeServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn machine_id(&self) -> &MachineId {
        &self.machine_id
    }

    async fn sections(&self) -> Result<Vec<Section>, PlexError> {
        Ok(self.state().sections.clone())
    }

    async fn section_items(&self, section: &Section) -> Result<Vec<RemoteItem>, PlexError> {
        let state = self.state();
        if state.failing_sections.contains(&section.key) {
            return Err(PlexError::Api {
                status: 500,
                message: "section listing failed".into(),
            });
        }
        Ok(state
            .section_items
            .get(&section.key)
            .cloned()
            .unwrap_or_default())
    }

    async fn episodes(&self, show: &RemoteItem) -> Result<Vec<RemoteItem>, PlexError> {
        let state = self.state();
        if state.failing_shows.contains(&show.rating_key) {
            return Err(PlexError::Api {
                status: 500,
                message: "episode listing failed".into(),
            });
        }
        let mut episodes = state.episodes.get(&show.rating_key).cloned().unwrap_or_default();
        for ep in &mut episodes {
            if let Some(info) = ep.episode.as_mut() {
                info.show_title.get_or_insert_with(|| show.title.clone());
            }
        }
        Ok(episodes)
    }

    async fn item(&self, key: &RatingKey) -> Result<RemoteItem, PlexError> {
        self.state()
            .find(key)
            .ok_or_else(|| PlexError::NotFound(format!("item {}", key)))
    }

    async fn playlists(&self) -> Result<Vec<Playlist>, PlexError> {
        Ok(self.state().playlists.iter().map(|(p, _)| p.clone()).collect())
    }

    async fn playlist_items(&self, playlist: &Playlist) -> Result<Vec<RemoteItem>, PlexError> {
        let state = self.state();
        let keys = state
            .playlists
            .iter()
            .find(|(p, _)| p.rating_key == playlist.rating_key)
            .map(|(_, keys)| keys.clone())
            .ok_or_else(|| PlexError::NotFound(format!("playlist {}", playlist.title)))?;
        Ok(state.resolve(&keys))
    }

    async fn create_playlist(&self, title: &str, seed: &RatingKey) -> Result<Playlist, PlexError> {
        let mut state = self.state();
        if state.reject_seeds.contains(seed) {
            return Err(PlexError::EmptyBatch("Must include items to add".into()));
        }
        state.next_key += 1;
        let playlist = Playlist {
            rating_key: RatingKey::from(state.next_key),
            title: title.to_string(),
            smart: false,
            playlist_type: Some("video".into()),
        };
        state.playlists.push((playlist.clone(), vec![seed.clone()]));
        state.created_playlists.push(title.to_string());
        Ok(playlist)
    }

    async fn add_to_playlist(&self, playlist: &Playlist, keys: &[RatingKey]) -> Result<(), PlexError> {
        let mut state = self.state();
        state.add_calls.push(keys.to_vec());
        if state.reject_batches && keys.len() > 1 {
            return Err(PlexError::EmptyBatch("Must include items to add".into()));
        }
        if let Some(missing) = keys.iter().find(|k| state.find(k).is_none()) {
            return Err(PlexError::BadRequest(format!("unknown item {}", missing)));
        }
        let entry = state
            .playlists
            .iter_mut()
            .find(|(p, _)| p.rating_key == playlist.rating_key)
            .ok_or_else(|| PlexError::NotFound(format!("playlist {}", playlist.title)))?;
        entry.1.extend(keys.iter().cloned());
        Ok(())
    }

    async fn delete_playlist(&self, playlist: &Playlist) -> Result<(), PlexError> {
        let mut state = self.state();
        state.playlists.retain(|(p, _)| p.rating_key != playlist.rating_key);
        state.deleted_playlists.push(playlist.title.clone());
        Ok(())
    }

    async fn collections(&self, section: &Section) -> Result<Vec<Collection>, PlexError> {
        Ok(self
            .state()
            .collections
            .iter()
            .filter(|(_, (key, _))| *key == section.key)
            .map(|(title, (key, _))| Collection {
                rating_key: RatingKey::from(format!("coll-{}", title)),
                title: title.clone(),
                section: key.clone(),
            })
            .collect())
    }

    async fn collection_items(&self, collection: &Collection) -> Result<Vec<RemoteItem>, PlexError> {
        let state = self.state();
        let keys = state
            .collections
            .get(&collection.title)
            .map(|(_, keys)| keys.clone())
            .unwrap_or_default();
        Ok(state.resolve(&keys))
    }

    async fn add_collection_tag(&self, item: &RatingKey, name: &str) -> Result<(), PlexError> {
        let mut state = self.state();
        if state.find(item).is_none() {
            return Err(PlexError::NotFound(format!("item {}", item)));
        }
        let section = video_section(&state);
        let entry = state
            .collections
            .entry(name.to_string())
            .or_insert_with(|| (section, Vec::new()));
        if !entry.1.contains(item) {
            entry.1.push(item.clone());
        }
        state.tags_added.push((item.clone(), name.to_string()));
        Ok(())
    }

    async fn remove_collection_tag(&self, item: &RatingKey, name: &str) -> Result<(), PlexError> {
        let mut state = self.state();
        if let Some((_, keys)) = state.collections.get_mut(name) {
            keys.retain(|k| k != item);
        }
        state.tags_removed.push((item.clone(), name.to_string()));
        Ok(())
    }

    async fn edit_fields(&self, item: &RatingKey, values: &BTreeMap<String, String>) -> Result<(), PlexError> {
        let mut guard = self.state();
        let state = &mut *guard;
        for list in state.section_items.values_mut().chain(state.episodes.values_mut()) {
            for it in list.iter_mut().filter(|i| &i.rating_key == item) {
                for (field, value) in values {
                    it.fields.insert(field.clone(), value.clone());
                }
            }
        }
        state.edits.push((item.clone(), values.clone()));
        Ok(())
    }

    async fn lock_field(&self, item: &RatingKey, field: &str) -> Result<(), PlexError> {
        self.state().locks.push((item.clone(), field.to_string()));
        Ok(())
    }

    async fn fetch_image(&self, path: &str) -> Result<Bytes, PlexError> {
        self.state()
            .images
            .get(path)
            .cloned()
            .ok_or_else(|| PlexError::NotFound(format!("image {}", path)))
    }

    async fn upload_image(&self, item: &RatingKey, kind: ImageKind, file: &Path) -> Result<(), PlexError> {
        let bytes = std::fs::read(file)?;
        self.state().uploads.push((item.clone(), kind, bytes));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeDirectory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct DirectoryState {
    pub users: Vec<PlexUser>,
    pub sections: HashMap<MachineId, Vec<ServerSection>>,
    pub shares: HashMap<MachineId, Vec<SharedServer>>,
    /// (server, user id, share id if existing, section ids)
    pub updates: Vec<(MachineId, u64, Option<u64>, Vec<u64>)>,
    pub failing_users: HashSet<u64>,
}

#[derive(Default)]
pub struct FakeDirectory {
    pub state: Mutex<DirectoryState>,
}

pub fn user(id: u64, name: &str) -> PlexUser {
    PlexUser {
        id,
        title: name.to_string(),
        username: Some(name.to_string()),
        email: Some(format!("{}@example.com", name)),
    }
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: PlexUser) -> Self {
        self.state.lock().unwrap().users.push(user);
        self
    }

    /// Sections get ids `base + position`.
    pub fn with_server(self, machine: &str, base: u64, titles: &[&str]) -> Self {
        let sections = titles
            .iter()
            .enumerate()
            .map(|(i, t)| ServerSection {
                id: base + i as u64,
                key: (i + 1).to_string(),
                title: t.to_string(),
            })
            .collect();
        self.state
            .lock()
            .unwrap()
            .sections
            .insert(MachineId::new(machine), sections);
        self
    }

    pub fn with_share(self, machine: &str, share_id: u64, user_id: u64, all: bool, titles: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let machine = MachineId::new(machine);
            let catalog = state.sections.get(&machine).cloned().unwrap_or_default();
            let sections = catalog
                .iter()
                .map(|s| SharedSection {
                    id: s.id,
                    title: s.title.clone(),
                    shared: titles.iter().any(|t| *t == s.title),
                })
                .collect();
            state.shares.entry(machine).or_default().push(SharedServer {
                id: share_id,
                user_id,
                username: None,
                email: None,
                all_libraries: all,
                sections,
            });
        }
        self
    }

    pub fn updates(&self) -> Vec<(MachineId, u64, Option<u64>, Vec<u64>)> {
        self.state.lock().unwrap().updates.clone()
    }
}

#[async_trait]
impl ShareDirectory for FakeDirectory {
    async fn users(&self) -> Result<Vec<PlexUser>, PlexError> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn server_sections(&self, server: &MachineId) -> Result<Vec<ServerSection>, PlexError> {
        self.state
            .lock()
            .unwrap()
            .sections
            .get(server)
            .cloned()
            .ok_or_else(|| PlexError::NotFound(format!("server {}", server)))
    }

    async fn shared_servers(&self, server: &MachineId) -> Result<Vec<SharedServer>, PlexError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .shares
            .get(server)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_share(
        &self,
        server: &MachineId,
        user: &PlexUser,
        existing: Option<&SharedServer>,
        section_ids: &[u64],
    ) -> Result<(), PlexError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_users.contains(&user.id) {
            return Err(PlexError::Api {
                status: 500,
                message: "share update failed".into(),
            });
        }
        state.updates.push((
            server.clone(),
            user.id,
            existing.map(|s| s.id),
            section_ids.to_vec(),
        ));
        Ok(())
    }
}
