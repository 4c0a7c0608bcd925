//! plex.tv account client.
//!
//! Server discovery (`/api/v2/resources`) and sign-in speak JSON. The user and
//! sharing endpoints only speak XML and are decoded with `quick-xml`.

use super::client::PlexClient;
use super::error::PlexError;
use super::{build_http_client, ShareDirectory, SignIn, PRODUCT};
use crate::config::{AccountConfig, HttpConfig};
use async_trait::async_trait;
use plexsync_common::MachineId;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

/// A friend or managed user of the account.
#[derive(Debug, Clone, PartialEq)]
pub struct PlexUser {
    pub id: u64,
    pub title: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl PlexUser {
    /// Name used in console output.
    pub fn label(&self) -> &str {
        if !self.title.is_empty() {
            &self.title
        } else {
            self.username
                .as_deref()
                .or(self.email.as_deref())
                .unwrap_or("<unknown user>")
        }
    }

    /// Case-insensitive match on username, title, or email.
    pub fn matches_any(&self, wanted: &[String]) -> bool {
        let candidates = [
            Some(self.title.as_str()),
            self.username.as_deref(),
            self.email.as_deref(),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .any(|c| wanted.iter().any(|w| w.to_lowercase() == c.to_lowercase()))
    }
}

/// A section as plex.tv knows it; `id` is what share calls expect.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSection {
    pub id: u64,
    pub key: String,
    pub title: String,
}

/// One section entry inside a share.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedSection {
    pub id: u64,
    pub title: String,
    pub shared: bool,
}

/// A user's share of one server.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedServer {
    pub id: u64,
    pub user_id: u64,
    pub username: Option<String>,
    pub email: Option<String>,
    pub all_libraries: bool,
    pub sections: Vec<SharedSection>,
}

impl SharedServer {
    pub fn belongs_to(&self, user: &PlexUser) -> bool {
        if self.user_id != 0 && self.user_id == user.id {
            return true;
        }
        let same = |a: &Option<String>, b: &Option<String>| match (a, b) {
            (Some(a), Some(b)) => !a.is_empty() && a.to_lowercase() == b.to_lowercase(),
            _ => false,
        };
        same(&self.username, &user.username) || same(&self.email, &user.email)
    }

    /// Titles of sections actually shared.
    pub fn shared_titles(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .filter(|s| s.shared)
            .map(|s| s.title.as_str())
    }
}

/// A server registered to the account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub name: String,
    pub client_identifier: String,
    #[serde(default)]
    pub provides: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub connections: Vec<ResourceConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConnection {
    pub uri: String,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub relay: bool,
}

impl Resource {
    pub fn machine_id(&self) -> MachineId {
        MachineId::new(self.client_identifier.clone())
    }

    pub fn is_server(&self) -> bool {
        self.provides.split(',').any(|p| p.trim() == "server")
    }

    /// Connection URIs with relays last.
    pub fn connection_order(&self) -> Vec<&str> {
        let mut conns: Vec<&ResourceConnection> = self.connections.iter().collect();
        conns.sort_by_key(|c| c.relay);
        conns.into_iter().map(|c| c.uri.as_str()).collect()
    }
}

mod xml {
    //! XML shapes of the plex.tv v1 endpoints.

    use serde::Deserialize;

    fn flag(v: &Option<String>) -> bool {
        matches!(v.as_deref(), Some("1") | Some("true"))
    }

    #[derive(Debug, Deserialize)]
    pub struct UsersContainer {
        #[serde(rename = "User", default)]
        pub users: Vec<User>,
    }

    #[derive(Debug, Deserialize)]
    pub struct User {
        #[serde(rename = "@id")]
        pub id: u64,
        #[serde(rename = "@title", default)]
        pub title: String,
        #[serde(rename = "@username", default)]
        pub username: Option<String>,
        #[serde(rename = "@email", default)]
        pub email: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ServersContainer {
        #[serde(rename = "Server", default)]
        pub servers: Vec<Server>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Server {
        #[serde(rename = "Section", default)]
        pub sections: Vec<Section>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Section {
        #[serde(rename = "@id")]
        pub id: u64,
        #[serde(rename = "@key", default)]
        pub key: String,
        #[serde(rename = "@title", default)]
        pub title: String,
        #[serde(rename = "@shared", default)]
        pub shared: Option<String>,
    }

    impl Section {
        pub fn is_shared(&self) -> bool {
            flag(&self.shared)
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct SharedServersContainer {
        #[serde(rename = "SharedServer", default)]
        pub shared: Vec<SharedServer>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SharedServer {
        #[serde(rename = "@id")]
        pub id: u64,
        #[serde(rename = "@userID", default)]
        pub user_id: Option<u64>,
        #[serde(rename = "@username", default)]
        pub username: Option<String>,
        #[serde(rename = "@email", default)]
        pub email: Option<String>,
        #[serde(rename = "@allLibraries", default)]
        pub all_libraries: Option<String>,
        #[serde(rename = "Section", default)]
        pub sections: Vec<Section>,
    }

    impl SharedServer {
        pub fn all_libraries(&self) -> bool {
            flag(&self.all_libraries)
        }
    }
}

#[derive(Serialize)]
struct ShareRequest<'a> {
    server_id: &'a str,
    shared_server: ShareBody<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sharing_settings: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ShareBody<'a> {
    library_section_ids: &'a [u64],
    #[serde(skip_serializing_if = "Option::is_none")]
    invited_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invited_email: Option<&'a str>,
}

/// Shared plumbing for plex.tv calls.
#[derive(Clone)]
struct PlexTv {
    client: Client,
    base_url: String,
    client_identifier: String,
}

impl PlexTv {
    fn new(account: &AccountConfig, http: &HttpConfig) -> Result<Self, PlexError> {
        Ok(Self {
            client: build_http_client(http)?,
            base_url: account.base_url.trim_end_matches('/').to_string(),
            client_identifier: http.client_identifier.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Plex-Product", PRODUCT)
            .header("X-Plex-Client-Identifier", &self.client_identifier)
    }

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
}

/// Username/password sign-in against plex.tv.
pub struct PlexTvSignIn {
    tv: PlexTv,
}

impl PlexTvSignIn {
    pub fn new(account: &AccountConfig, http: &HttpConfig) -> Result<Self, PlexError> {
        Ok(Self {
            tv: PlexTv::new(account, http)?,
        })
    }
}

#[async_trait]
impl SignIn for PlexTvSignIn {
    async fn sign_in(
        &self,
        username: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<String, PlexError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SignInResponse {
            auth_token: String,
        }

        let mut form = vec![
            ("login", username),
            ("password", password),
            ("rememberMe", "true"),
        ];
        if let Some(code) = code {
            form.push(("verificationCode", code));
        }

        let response = self
            .tv
            .send(
                self.tv
                    .request(Method::POST, "/api/v2/users/signin")
                    .header(reqwest::header::ACCEPT, "application/json")
                    .form(&form),
            )
            .await?;

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| PlexError::Decode(e.to_string()))?;
        Ok(body.auth_token)
    }
}

/// An authenticated plex.tv account.
pub struct PlexAccount {
    tv: PlexTv,
    token: String,
}

impl PlexAccount {
    pub fn new(token: &str, account: &AccountConfig, http: &HttpConfig) -> Result<Self, PlexError> {
        Ok(Self {
            tv: PlexTv::new(account, http)?,
            token: token.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.tv
            .request(method, path)
            .header("X-Plex-Token", &self.token)
    }

    async fn get_xml<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, PlexError> {
        let response = self
            .tv
            .send(
                self.request(Method::GET, path)
                    .header(reqwest::header::ACCEPT, "application/xml"),
            )
            .await?;
        let text = response
            .text()
            .await
            .map_err(|e| PlexError::Decode(e.to_string()))?;
        quick_xml::de::from_str(&text).map_err(|e| PlexError::Decode(e.to_string()))
    }

    /// Every server, player, and device registered to the account.
    pub async fn resources(&self) -> Result<Vec<Resource>, PlexError> {
        let response = self
            .tv
            .send(
                self.request(Method::GET, "/api/v2/resources")
                    .query(&[("includeHttps", "1"), ("includeRelay", "1")])
                    .header(reqwest::header::ACCEPT, "application/json"),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| PlexError::Decode(e.to_string()))
    }

    /// Find a server resource by its name (case-insensitive).
    pub async fn resource(&self, name: &str) -> Result<Resource, PlexError> {
        self.resources()
            .await?
            .into_iter()
            .filter(Resource::is_server)
            .find(|r| r.name.to_lowercase() == name.to_lowercase())
            .ok_or_else(|| {
                PlexError::NotFound(format!(
                    "server resource named '{}' under this account",
                    name
                ))
            })
    }

    /// Connect to a server resource, trying each advertised connection.
    pub async fn connect(&self, resource: &Resource, http: &HttpConfig) -> Result<PlexClient, PlexError> {
        let token = resource.access_token.as_deref().unwrap_or(&self.token);
        let mut last_err = None;

        for uri in resource.connection_order() {
            match PlexClient::connect(uri, token, http).await {
                Ok(client) => return Ok(client),
                Err(e) => {
                    tracing::debug!("Connection {} for '{}' failed: {}", uri, resource.name, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            PlexError::NotFound(format!("no connections advertised for '{}'", resource.name))
        }))
    }
}

#[async_trait]
impl ShareDirectory for PlexAccount {
    async fn users(&self) -> Result<Vec<PlexUser>, PlexError> {
        let container: xml::UsersContainer = self.get_xml("/api/users").await?;
        Ok(container
            .users
            .into_iter()
            .map(|u| PlexUser {
                id: u.id,
                title: u.title,
                username: u.username,
                email: u.email,
            })
            .collect())
    }

    async fn server_sections(&self, server: &MachineId) -> Result<Vec<ServerSection>, PlexError> {
        let container: xml::ServersContainer =
            self.get_xml(&format!("/api/servers/{}", server)).await?;
        Ok(container
            .servers
            .into_iter()
            .flat_map(|s| s.sections)
            .map(|s| ServerSection {
                id: s.id,
                key: s.key,
                title: s.title,
            })
            .collect())
    }

    async fn shared_servers(&self, server: &MachineId) -> Result<Vec<SharedServer>, PlexError> {
        let container: xml::SharedServersContainer = self
            .get_xml(&format!("/api/servers/{}/shared_servers", server))
            .await?;
        Ok(container
            .shared
            .into_iter()
            .map(|s| SharedServer {
                id: s.id,
                user_id: s.user_id.unwrap_or_default(),
                all_libraries: s.all_libraries(),
                sections: s
                    .sections
                    .iter()
                    .map(|sec| SharedSection {
                        id: sec.id,
                        title: sec.title.clone(),
                        shared: sec.is_shared(),
                    })
                    .collect(),
                username: s.username,
                email: s.email,
            })
            .collect())
    }

    async fn update_share(
        &self,
        server: &MachineId,
        user: &PlexUser,
        existing: Option<&SharedServer>,
        section_ids: &[u64],
    ) -> Result<(), PlexError> {
        let machine = server.as_str();
        let request = match existing {
            Some(share) => self
                .request(
                    Method::PUT,
                    &format!("/api/servers/{}/shared_servers/{}", machine, share.id),
                )
                .json(&ShareRequest {
                    server_id: machine,
                    shared_server: ShareBody {
                        library_section_ids: section_ids,
                        invited_id: Some(user.id),
                        invited_email: None,
                    },
                    sharing_settings: None,
                }),
            None => {
                let invited = user
                    .email
                    .as_deref()
                    .or(user.username.as_deref())
                    .unwrap_or(user.title.as_str());
                self.request(Method::POST, &format!("/api/servers/{}/shared_servers", machine))
                    .json(&ShareRequest {
                        server_id: machine,
                        shared_server: ShareBody {
                            library_section_ids: section_ids,
                            invited_id: None,
                            invited_email: Some(invited),
                        },
                        sharing_settings: Some(serde_json::json!({})),
                    })
            }
        };

        self.tv.send(request).await?;
        Ok(())
    }
}
