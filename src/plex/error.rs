//! Error taxonomy for the Plex adapters.
//!
//! The server reports failures in several shapes (HTTP status, plain-text
//! bodies, JSON `errors` arrays, XML). Everything is folded into [`PlexError`]
//! by [`PlexError::from_response`] so callers only branch on variants.

use reqwest::StatusCode;

/// Marker text the server returns when an add-items call is rejected as empty.
pub const EMPTY_BATCH_MARKER: &str = "must include items to add";

/// plex.tv error code for a missing or invalid verification code.
const MFA_ERROR_CODE: u64 = 1029;

/// Phrases that indicate a sign-in needs a verification code.
const MFA_HINTS: &[&str] = &["verification code", "two-factor", "2fa"];

#[derive(Debug, thiserror::Error)]
pub enum PlexError {
    /// The server could not be reached at all.
    #[error("Connection to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Token missing, expired, or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Sign-in requires a (new) verification code.
    #[error("Two-factor verification required: {0}")]
    MfaRequired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Spurious rejection of an add-items call that did carry items.
    #[error("Server rejected batch as empty: {0}")]
    EmptyBatch(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client itself could not be built.
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl PlexError {
    /// Classify a non-success response.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let (message, codes) = summarize_body(body);
        let lower = message.to_lowercase();
        let wants_code =
            codes.contains(&MFA_ERROR_CODE) || MFA_HINTS.iter().any(|h| lower.contains(h));

        if lower.contains(EMPTY_BATCH_MARKER) {
            return Self::EmptyBatch(message);
        }

        match status {
            StatusCode::UNAUTHORIZED if wants_code => Self::MfaRequired(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::BadRequest(message)
            }
            _ => Self::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether this is the spurious empty-batch rejection.
    pub fn is_empty_batch(&self) -> bool {
        matches!(self, Self::EmptyBatch(_))
    }

    /// Whether a retry with a fresh verification code could succeed.
    pub fn is_auth_retryable(&self) -> bool {
        match self {
            Self::MfaRequired(_) | Self::Unauthorized(_) => true,
            Self::BadRequest(_) => self.mentions_mfa(),
            _ => false,
        }
    }

    /// Whether the message looks like a verification code problem.
    pub fn mentions_mfa(&self) -> bool {
        match self {
            Self::MfaRequired(_) => true,
            Self::Unauthorized(msg) | Self::BadRequest(msg) => {
                let lower = msg.to_lowercase();
                MFA_HINTS.iter().any(|h| lower.contains(h))
            }
            _ => false,
        }
    }
}

/// Pull a readable message out of a JSON `errors` array when present,
/// otherwise return the trimmed body.
fn summarize_body(body: &str) -> (String, Vec<u64>) {
    #[derive(serde::Deserialize)]
    struct ErrorEntry {
        #[serde(default)]
        code: Option<u64>,
        #[serde(default)]
        message: String,
    }

    #[derive(serde::Deserialize)]
    struct ErrorBody {
        errors: Vec<ErrorEntry>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let codes: Vec<u64> = parsed.errors.iter().filter_map(|e| e.code).collect();
        let joined = parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        if !joined.is_empty() {
            return (joined, codes);
        }
    }

    (body.trim().to_string(), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_detected_from_body() {
        let err = PlexError::from_response(
            StatusCode::BAD_REQUEST,
            "<html><h1>400 Bad Request</h1>Must include items to add</html>",
        );
        assert!(err.is_empty_batch());
    }

    #[test]
    fn test_plain_bad_request_is_not_empty_batch() {
        let err = PlexError::from_response(StatusCode::BAD_REQUEST, "invalid uri");
        assert!(matches!(err, PlexError::BadRequest(_)));
        assert!(!err.is_empty_batch());
    }

    #[test]
    fn test_mfa_from_json_errors() {
        let body = r#"{"errors":[{"code":1029,"message":"Please enter the verification code"}]}"#;
        let err = PlexError::from_response(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, PlexError::MfaRequired(ref m) if m.contains("verification")));
        assert!(err.mentions_mfa());
    }

    #[test]
    fn test_unauthorized_without_hint() {
        let err = PlexError::from_response(StatusCode::UNAUTHORIZED, "Invalid token");
        assert!(matches!(err, PlexError::Unauthorized(_)));
        assert!(!err.mentions_mfa());
    }

    #[test]
    fn test_unrelated_bad_request_is_not_mfa() {
        let body = r#"{"errors":[{"code":1001,"message":"User could not be authenticated"}]}"#;
        let err = PlexError::from_response(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, PlexError::Unauthorized(_)));
        assert!(!err.mentions_mfa());

        let err = PlexError::from_response(StatusCode::BAD_REQUEST, "Invalid country code");
        assert!(!err.mentions_mfa());
        assert!(!err.is_auth_retryable());

        let err = PlexError::from_response(StatusCode::BAD_REQUEST, "Two-factor code expired");
        assert!(err.is_auth_retryable());
    }

    #[test]
    fn test_mfa_from_error_code_alone() {
        let body = r#"{"errors":[{"code":1029,"message":"Sign in failed"}]}"#;
        let err = PlexError::from_response(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, PlexError::MfaRequired(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            PlexError::from_response(StatusCode::NOT_FOUND, ""),
            PlexError::NotFound(_)
        ));
        assert!(matches!(
            PlexError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            PlexError::Api { status: 500, .. }
        ));
    }
}
