//! Environment overlay for [`Config`].
//!
//! Values from the process environment (after `.env` has been loaded) take
//! precedence over the config file. Blank variables are ignored.

use super::Config;

/// Overlay the real process environment.
pub fn apply_env(config: &mut Config) {
    apply_env_with(config, |key| std::env::var(key).ok());
}

/// Overlay values from an arbitrary lookup.
pub fn apply_env_with<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("VERIFY_SSL") {
        config.http.verify_tls = !is_falsy(&v);
    }

    if let Some(v) = get("PLEX_URL") {
        config.server.url = Some(v);
    }
    if let Some(v) = get("PLEX_API_TOKEN").or_else(|| get("PLEX_TOKEN")) {
        config.server.token = Some(v);
    }

    if let Some(v) = get("SRC_PLEX_URL") {
        config.source.url = Some(v);
    }
    if let Some(v) = get("SRC_PLEX_TOKEN") {
        config.source.token = Some(v);
    }

    // The destination falls back to the single-server variables.
    if let Some(v) = get("DEST_PLEX_URL").or_else(|| get("PLEX_URL")) {
        config.dest.url = Some(v);
    }
    if let Some(v) = get("DEST_PLEX_TOKEN").or_else(|| get("PLEX_TOKEN")) {
        config.dest.token = Some(v);
    }

    if let Some(v) = get("PLEX_ACCOUNT_TOKEN") {
        config.account.token = Some(v);
    }
    if let Some(v) = get("PLEX_USERNAME") {
        config.account.username = Some(v);
    }
    if let Some(v) = get("PLEX_PASSWORD") {
        config.account.password = Some(v);
    }
    if let Some(v) = get("PLEX_2FA_CODE") {
        config.account.mfa_code = Some(v);
    }
    if let Some(v) = get("PLEX_SERVER_SOURCE") {
        config.account.source_server = v;
    }
    if let Some(v) = get("PLEX_SERVER_DEST") {
        config.account.dest_server = v;
    }
}

fn is_falsy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "no")
}
