//! Adapters for the Plex Media Server and plex.tv APIs.
//!
//! The rest of the crate only talks to the traits defined here
//! ([`MediaServer`], [`ShareDirectory`], [`SignIn`]) and only sees
//! [`PlexError`], so the quirks of the remote API stay in this module.

pub mod account;
pub mod client;
pub mod error;
pub mod types;
mod wire;

pub use account::{PlexAccount, PlexTvSignIn, PlexUser, Resource, ServerSection, SharedServer};
pub use client::PlexClient;
pub use error::PlexError;
pub use types::{Collection, EpisodeInfo, MediaPart, MediaVersion, Playlist, RemoteItem, Section};

use crate::config::HttpConfig;
use async_trait::async_trait;
use bytes::Bytes;
use plexsync_common::{ImageKind, MachineId, RatingKey};
use reqwest::Client;
use std::collections::BTreeMap;
use std::path::Path;

/// Product name sent in the `X-Plex-Product` header.
pub const PRODUCT: &str = "plexsync";

/// Operations the tools need from one media server.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Friendly name of the server.
    fn name(&self) -> &str;

    /// Globally unique server id, used to build item URIs.
    fn machine_id(&self) -> &MachineId;

    async fn sections(&self) -> Result<Vec<Section>, PlexError>;

    /// Top-level items of a section (movies, or shows for TV sections).
    async fn section_items(&self, section: &Section) -> Result<Vec<RemoteItem>, PlexError>;

    /// Every episode of a show.
    async fn episodes(&self, show: &RemoteItem) -> Result<Vec<RemoteItem>, PlexError>;

    /// Full detail of a single item.
    async fn item(&self, key: &RatingKey) -> Result<RemoteItem, PlexError>;

    async fn playlists(&self) -> Result<Vec<Playlist>, PlexError>;

    async fn playlist_items(&self, playlist: &Playlist) -> Result<Vec<RemoteItem>, PlexError>;

    /// Create a static video playlist holding one seed item.
    async fn create_playlist(&self, title: &str, seed: &RatingKey) -> Result<Playlist, PlexError>;

    /// Append items to a playlist in one call.
    async fn add_to_playlist(&self, playlist: &Playlist, keys: &[RatingKey])
        -> Result<(), PlexError>;

    async fn delete_playlist(&self, playlist: &Playlist) -> Result<(), PlexError>;

    async fn collections(&self, section: &Section) -> Result<Vec<Collection>, PlexError>;

    async fn collection_items(&self, collection: &Collection)
        -> Result<Vec<RemoteItem>, PlexError>;

    /// Tag an item with a collection name (creates the collection if needed).
    async fn add_collection_tag(&self, item: &RatingKey, name: &str) -> Result<(), PlexError>;

    async fn remove_collection_tag(&self, item: &RatingKey, name: &str) -> Result<(), PlexError>;

    /// Set several scalar fields in one edit call.
    async fn edit_fields(
        &self,
        item: &RatingKey,
        values: &BTreeMap<String, String>,
    ) -> Result<(), PlexError>;

    /// Lock one field against agent refreshes.
    async fn lock_field(&self, item: &RatingKey, field: &str) -> Result<(), PlexError>;

    /// Download an image by its server path (`/library/metadata/1/thumb/...`).
    async fn fetch_image(&self, path: &str) -> Result<Bytes, PlexError>;

    /// Upload a local image file as the poster or background of an item.
    async fn upload_image(
        &self,
        item: &RatingKey,
        kind: ImageKind,
        file: &Path,
    ) -> Result<(), PlexError>;
}

/// User-to-server library grants as kept by plex.tv.
#[async_trait]
pub trait ShareDirectory: Send + Sync {
    /// Friends and managed users of the account.
    async fn users(&self) -> Result<Vec<PlexUser>, PlexError>;

    /// Sections of a server with their plex.tv-side ids.
    async fn server_sections(&self, server: &MachineId) -> Result<Vec<ServerSection>, PlexError>;

    /// Every share of a server.
    async fn shared_servers(&self, server: &MachineId) -> Result<Vec<SharedServer>, PlexError>;

    /// Set the complete list of shared sections for a user on a server,
    /// creating the share when `existing` is `None`.
    async fn update_share(
        &self,
        server: &MachineId,
        user: &PlexUser,
        existing: Option<&SharedServer>,
        section_ids: &[u64],
    ) -> Result<(), PlexError>;
}

/// Exchanges credentials for an account token.
#[async_trait]
pub trait SignIn: Send + Sync {
    async fn sign_in(
        &self,
        username: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<String, PlexError>;
}

/// Build the shared HTTP client from configuration.
pub fn build_http_client(http: &HttpConfig) -> Result<Client, PlexError> {
    Client::builder()
        .timeout(http.timeout())
        .danger_accept_invalid_certs(!http.verify_tls)
        .build()
        .map_err(|e| PlexError::Setup(e.to_string()))
}

/// `server://` URI Plex uses to reference items in playlist and collection calls.
pub fn items_uri(machine_id: &MachineId, keys: &[RatingKey]) -> String {
    let joined = keys
        .iter()
        .map(RatingKey::as_str)
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "server://{}/com.plexapp.plugins.library/library/metadata/{}",
        machine_id, joined
    )
}
