use super::error::PlexError;
use super::types::{Collection, Playlist, RemoteItem, Section};
use super::wire::{Envelope, MediaContainer};
use super::{build_http_client, items_uri, MediaServer, PRODUCT};
use crate::config::HttpConfig;
use async_trait::async_trait;
use bytes::Bytes;
use plexsync_common::{ImageKind, MachineId, RatingKey};
use reqwest::{Client, Method, RequestBuilder, Response};
use std::collections::BTreeMap;
use std::path::Path;

/// Items requested per page when listing large containers.
const PAGE_SIZE: usize = 200;

/// Client for one Plex Media Server.
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
    client_identifier: String,
    name: String,
    machine_id: MachineId,
}

impl PlexClient {
    /// Connect and read the server identity. Fails if the server is
    /// unreachable or rejects the token.
    pub async fn connect(url: &str, token: &str, http: &HttpConfig) -> Result<Self, PlexError> {
        let mut client = Self {
            client: build_http_client(http)?,
            base_url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client_identifier: http.client_identifier.clone(),
            name: String::new(),
            machine_id: MachineId::new(""),
        };

        let identity = client.get_container("/", &[]).await?;
        client.machine_id = MachineId::new(identity.machine_identifier.unwrap_or_default());
        client.name = identity
            .friendly_name
            .unwrap_or_else(|| client.base_url.clone());

        tracing::debug!(
            "Connected to '{}' ({}) at {}",
            client.name,
            client.machine_id,
            client.base_url
        );
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("X-Plex-Token", &self.token)
            .header("X-Plex-Product", PRODUCT)
            .header("X-Plex-Client-Identifier", &self.client_identifier)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Send and classify the response status.
    async fn send(&self, request: RequestBuilder) -> Result<Response, PlexError> {
        let response = request.send().await.map_err(|e| PlexError::Connection {
            url: self.base_url.clone(),
            source: e,
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PlexError::from_response(status, &body));
        }
        Ok(response)
    }

    async fn decode(response: Response) -> Result<MediaContainer, PlexError> {
        let text = response
            .text()
            .await
            .map_err(|e| PlexError::Decode(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(MediaContainer::default());
        }
        serde_json::from_str::<Envelope>(&text)
            .map(|env| env.container)
            .map_err(|e| PlexError::Decode(e.to_string()))
    }

    async fn get_container(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<MediaContainer, PlexError> {
        let response = self
            .send(self.request(Method::GET, path).query(query))
            .await?;
        Self::decode(response).await
    }

    /// Fetch every page of a metadata listing.
    async fn get_all(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<super::wire::Metadata>, PlexError> {
        let mut all = Vec::new();
        let page_size = PAGE_SIZE.to_string();

        loop {
            let start = all.len().to_string();
            let request = self
                .request(Method::GET, path)
                .query(query)
                .header("X-Plex-Container-Start", &start)
                .header("X-Plex-Container-Size", &page_size);
            let container = Self::decode(self.send(request).await?).await?;

            let received = container.metadata.len();
            all.extend(container.metadata);

            // A short page ends the listing; so does one larger than asked
            // for, which means the server ignored the paging headers.
            let reached_total = container
                .total_size
                .is_some_and(|total| all.len() as u64 >= total);
            if received != PAGE_SIZE || reached_total {
                break;
            }
        }

        Ok(all)
    }

    async fn items(&self, path: &str) -> Result<Vec<RemoteItem>, PlexError> {
        Ok(self
            .get_all(path, &[("includeGuids", "1")])
            .await?
            .into_iter()
            .map(RemoteItem::from)
            .collect())
    }

    async fn put_item(&self, item: &RatingKey, params: &[(String, String)]) -> Result<(), PlexError> {
        let path = format!("/library/metadata/{}", item);
        self.send(self.request(Method::PUT, &path).query(params))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MediaServer for PlexClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn machine_id(&self) -> &MachineId {
        &self.machine_id
    }

    async fn sections(&self) -> Result<Vec<Section>, PlexError> {
        let container = self.get_container("/library/sections", &[]).await?;
        Ok(container
            .directories
            .into_iter()
            .map(Section::from)
            .collect())
    }

    async fn section_items(&self, section: &Section) -> Result<Vec<RemoteItem>, PlexError> {
        self.items(&format!("/library/sections/{}/all", section.key))
            .await
    }

    async fn episodes(&self, show: &RemoteItem) -> Result<Vec<RemoteItem>, PlexError> {
        let mut episodes = self
            .items(&format!("/library/metadata/{}/allLeaves", show.rating_key))
            .await?;
        for ep in &mut episodes {
            if let Some(info) = ep.episode.as_mut() {
                if info.show_title.is_none() {
                    info.show_title = Some(show.title.clone());
                }
            }
        }
        Ok(episodes)
    }

    async fn item(&self, key: &RatingKey) -> Result<RemoteItem, PlexError> {
        let container = self
            .get_container(&format!("/library/metadata/{}", key), &[("includeGuids", "1")])
            .await?;
        container
            .metadata
            .into_iter()
            .next()
            .map(RemoteItem::from)
            .ok_or_else(|| PlexError::NotFound(format!("item {}", key)))
    }

    async fn playlists(&self) -> Result<Vec<Playlist>, PlexError> {
        Ok(self
            .get_all("/playlists", &[])
            .await?
            .into_iter()
            .map(Playlist::from)
            .collect())
    }

    async fn playlist_items(&self, playlist: &Playlist) -> Result<Vec<RemoteItem>, PlexError> {
        self.items(&format!("/playlists/{}/items", playlist.rating_key))
            .await
    }

    async fn create_playlist(&self, title: &str, seed: &RatingKey) -> Result<Playlist, PlexError> {
        let uri = items_uri(&self.machine_id, std::slice::from_ref(seed));
        let response = self
            .send(self.request(Method::POST, "/playlists").query(&[
                ("type", "video"),
                ("title", title),
                ("smart", "0"),
                ("uri", uri.as_str()),
            ]))
            .await?;

        if let Some(created) = Self::decode(response).await?.metadata.into_iter().next() {
            return Ok(Playlist::from(created));
        }

        // Some server versions answer with an empty container; look it up.
        self.playlists()
            .await?
            .into_iter()
            .find(|p| p.title == title)
            .ok_or_else(|| PlexError::NotFound(format!("playlist '{}' after create", title)))
    }

    async fn add_to_playlist(
        &self,
        playlist: &Playlist,
        keys: &[RatingKey],
    ) -> Result<(), PlexError> {
        if keys.is_empty() {
            return Ok(());
        }
        let uri = items_uri(&self.machine_id, keys);
        let path = format!("/playlists/{}/items", playlist.rating_key);
        self.send(self.request(Method::PUT, &path).query(&[("uri", uri.as_str())]))
            .await?;
        Ok(())
    }

    async fn delete_playlist(&self, playlist: &Playlist) -> Result<(), PlexError> {
        let path = format!("/playlists/{}", playlist.rating_key);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn collections(&self, section: &Section) -> Result<Vec<Collection>, PlexError> {
        Ok(self
            .get_all(&format!("/library/sections/{}/collections", section.key), &[])
            .await?
            .into_iter()
            .map(|m| m.into_collection(&section.key))
            .collect())
    }

    async fn collection_items(
        &self,
        collection: &Collection,
    ) -> Result<Vec<RemoteItem>, PlexError> {
        self.items(&format!(
            "/library/collections/{}/children",
            collection.rating_key
        ))
        .await
    }

    async fn add_collection_tag(&self, item: &RatingKey, name: &str) -> Result<(), PlexError> {
        // An indexed tag list replaces the item's collections, so the
        // existing ones are sent back along with the new tag.
        let current = self.item(item).await?;
        if current.in_collection(name) {
            tracing::debug!("Item {} already in collection '{}'", item, name);
            return Ok(());
        }
        let params = collection_tag_params(&current.collections, name);
        self.put_item(item, &params).await
    }

    async fn remove_collection_tag(&self, item: &RatingKey, name: &str) -> Result<(), PlexError> {
        self.put_item(
            item,
            &[("collection[].tag.tag-".to_string(), name.to_string())],
        )
        .await
    }

    async fn edit_fields(
        &self,
        item: &RatingKey,
        values: &BTreeMap<String, String>,
    ) -> Result<(), PlexError> {
        let params: Vec<(String, String)> = values
            .iter()
            .map(|(field, value)| (format!("{}.value", field), value.clone()))
            .collect();
        self.put_item(item, &params).await
    }

    async fn lock_field(&self, item: &RatingKey, field: &str) -> Result<(), PlexError> {
        self.put_item(item, &[(format!("{}.locked", field), "1".to_string())])
            .await
    }

    async fn fetch_image(&self, path: &str) -> Result<Bytes, PlexError> {
        let request = self
            .client
            .get(self.url(path))
            .header("X-Plex-Token", &self.token);
        let response = self.send(request).await?;
        response
            .bytes()
            .await
            .map_err(|e| PlexError::Decode(e.to_string()))
    }

    async fn upload_image(
        &self,
        item: &RatingKey,
        kind: ImageKind,
        file: &Path,
    ) -> Result<(), PlexError> {
        let body = tokio::fs::read(file).await?;
        let path = format!("/library/metadata/{}/{}", item, kind.upload_segment());
        self.send(self.request(Method::POST, &path).body(body))
            .await?;
        Ok(())
    }
}

/// Query parameters that tag an item with `existing` plus `added`.
fn collection_tag_params(existing: &[String], added: &str) -> Vec<(String, String)> {
    let mut tags: Vec<&str> = Vec::with_capacity(existing.len() + 1);
    for tag in existing.iter().map(String::as_str).chain(std::iter::once(added)) {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag);
        }
    }

    let mut params: Vec<(String, String)> = tags
        .iter()
        .enumerate()
        .map(|(i, tag)| (format!("collection[{}].tag.tag", i), tag.to_string()))
        .collect();
    params.push(("collection.locked".to_string(), "1".to_string()));
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_params_keep_existing_tags() {
        let existing = vec!["Favorites".to_string(), "heist".to_string()];
        let params = collection_tag_params(&existing, "Heist");

        assert_eq!(
            params,
            vec![
                ("collection[0].tag.tag".to_string(), "Favorites".to_string()),
                ("collection[1].tag.tag".to_string(), "heist".to_string()),
                ("collection.locked".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_collection_params_for_untagged_item() {
        let params = collection_tag_params(&[], "Heist");
        assert_eq!(params[0], ("collection[0].tag.tag".to_string(), "Heist".to_string()));
        assert_eq!(params.len(), 2);
    }
}
