//! Top-level failures and their process exit codes.

use crate::plex::PlexError;
use thiserror::Error;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL: i32 = 1;
pub const EXIT_MISSING_CREDENTIALS: i32 = 2;
pub const EXIT_CONNECTION: i32 = 3;
pub const EXIT_NOT_FOUND: i32 = 4;
pub const EXIT_OUTPUT: i32 = 5;
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: PlexError,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to write {path}: {message}")]
    Output { path: String, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Interrupted by user")]
    Interrupted,

    #[error(transparent)]
    Plex(#[from] PlexError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn missing_credentials(msg: impl Into<String>) -> Self {
        Self::MissingCredentials(msg.into())
    }

    pub fn connection(target: impl Into<String>, source: PlexError) -> Self {
        Self::Connection {
            target: target.into(),
            source,
        }
    }

    pub fn output(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Output {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredentials(_) => EXIT_MISSING_CREDENTIALS,
            Self::Connection { .. } => EXIT_CONNECTION,
            Self::NotFound(_) => EXIT_NOT_FOUND,
            Self::Output { .. } => EXIT_OUTPUT,
            Self::Interrupted => EXIT_INTERRUPTED,
            Self::Plex(PlexError::Connection { .. }) => EXIT_CONNECTION,
            Self::Plex(PlexError::NotFound(_)) => EXIT_NOT_FOUND,
            Self::Auth(_) | Self::Prompt(_) | Self::Plex(_) | Self::Other(_) => EXIT_FATAL,
        }
    }
}

/// A terminal prompt aborted with Ctrl-C is an interrupt; any other prompt
/// failure is fatal rather than a silent "no".
impl From<dialoguer::Error> for AppError {
    fn from(e: dialoguer::Error) -> Self {
        match e {
            dialoguer::Error::IO(io) if io.kind() == std::io::ErrorKind::Interrupted => {
                Self::Interrupted
            }
            e => Self::Prompt(e.to_string()),
        }
    }
}

/// Run a blocking terminal interaction off the runtime thread, so the
/// Ctrl-C handler keeps running while it waits for input.
pub async fn blocking_prompt<T, F>(interact: F) -> AppResult<T>
where
    F: FnOnce() -> Result<T, dialoguer::Error> + Send + 'static,
    T: Send + 'static,
{
    let answer = tokio::task::spawn_blocking(interact)
        .await
        .map_err(anyhow::Error::from)?;
    Ok(answer?)
}

pub type AppResult<T> = std::result::Result<T, AppError>;
