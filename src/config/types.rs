use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fields synced by `migrate --sync-metadata` when `--fields` is not given.
pub const SYNCABLE_FIELDS: &[&str] = &[
    "summary",
    "tagline",
    "contentRating",
    "originallyAvailableAt",
    "titleSort",
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,

    /// Server used by single-server tools (`scan-sd`).
    #[serde(default)]
    pub server: ServerConfig,

    /// Migration source.
    #[serde(default)]
    pub source: ServerConfig,

    /// Migration destination.
    #[serde(default)]
    pub dest: ServerConfig,

    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub migrate: MigrateConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Verify TLS certificates (disable for self-signed server certs)
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Value of `X-Plex-Client-Identifier`
    #[serde(default = "default_client_identifier")]
    pub client_identifier: String,
}

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_client_identifier() -> String {
    "plexsync-cli".to_string()
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            verify_tls: default_verify_tls(),
            timeout_secs: default_timeout_secs(),
            client_identifier: default_client_identifier(),
        }
    }
}

/// Direct connection to one Plex Media Server.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub token: Option<String>,
}

impl ServerConfig {
    /// URL and token, when both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().filter(|s| !s.trim().is_empty())?;
        let token = self.token.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((url, token))
    }
}

/// plex.tv account used to look up servers and manage shares.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Verification code supplied up front
    #[serde(default)]
    pub mfa_code: Option<String>,

    #[serde(default = "default_source_server")]
    pub source_server: String,

    #[serde(default = "default_dest_server")]
    pub dest_server: String,

    #[serde(default = "default_plex_tv_url")]
    pub base_url: String,
}

fn default_source_server() -> String {
    "noodle".to_string()
}

fn default_dest_server() -> String {
    "doodoo".to_string()
}

fn default_plex_tv_url() -> String {
    "https://plex.tv".to_string()
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            password: None,
            mfa_code: None,
            source_server: default_source_server(),
            dest_server: default_dest_server(),
            base_url: default_plex_tv_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MigrateConfig {
    /// Items per add-to-playlist call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
}

fn default_batch_size() -> usize {
    100
}

fn default_fields() -> Vec<String> {
    SYNCABLE_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            fields: default_fields(),
        }
    }
}
