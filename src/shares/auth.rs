//! Account authentication with an optional verification-code prompt.

use crate::config::AccountConfig;
use crate::error::{blocking_prompt, AppError, AppResult};
use crate::plex::{PlexError, SignIn};
use async_trait::async_trait;

/// Attempts allowed at the verification-code prompt.
pub const MFA_ATTEMPTS: u32 = 3;

/// Source of verification codes.
#[async_trait]
pub trait CodePrompt: Send + Sync {
    /// Ask for a code; `Ok(None)` means the user entered nothing.
    async fn prompt(&self, attempt: u32, of: u32) -> AppResult<Option<String>>;
}

/// Reads codes from the terminal without echo.
pub struct TerminalPrompt;

#[async_trait]
impl CodePrompt for TerminalPrompt {
    async fn prompt(&self, attempt: u32, of: u32) -> AppResult<Option<String>> {
        let code: String = blocking_prompt(move || {
            dialoguer::Password::new()
                .with_prompt(format!(
                    "Enter current Plex 2FA code (attempt {} of {})",
                    attempt, of
                ))
                .allow_empty_password(true)
                .interact()
        })
        .await?;
        let code = code.trim().to_string();
        Ok((!code.is_empty()).then_some(code))
    }
}

fn sign_in_error(e: PlexError) -> AppError {
    match e {
        e @ PlexError::Connection { .. } => AppError::connection("plex.tv", e),
        e => AppError::Auth(e.to_string()),
    }
}

/// Resolve an account token.
///
/// A configured token is used as is. Otherwise username and password are
/// exchanged for one, prompting for a verification code when the account
/// needs it and `prompt` is available.
pub async fn authenticate(
    sign_in: &dyn SignIn,
    account: &AccountConfig,
    prompt: Option<&dyn CodePrompt>,
) -> Result<String, AppError> {
    if let Some(token) = account.token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(token.to_string());
    }

    let (Some(username), Some(password)) = (account.username.as_deref(), account.password.as_deref())
    else {
        return Err(AppError::missing_credentials(
            "set PLEX_ACCOUNT_TOKEN, or PLEX_USERNAME and PLEX_PASSWORD",
        ));
    };

    let preset = account.mfa_code.as_deref().filter(|c| !c.trim().is_empty());
    let first = match sign_in.sign_in(username, password, preset).await {
        Ok(token) => return Ok(token),
        Err(e) if e.is_auth_retryable() => e,
        Err(e) => return Err(sign_in_error(e)),
    };

    if preset.is_some() && !first.mentions_mfa() {
        return Err(sign_in_error(first));
    }

    let Some(prompt) = prompt else {
        return Err(AppError::Auth(format!(
            "MFA may be required but prompts are disabled. Supply --mfa-code or PLEX_2FA_CODE. ({})",
            first
        )));
    };

    tracing::warn!("MFA appears to be required for this Plex account");
    let mut last = first;
    for attempt in 1..=MFA_ATTEMPTS {
        let Some(code) = prompt.prompt(attempt, MFA_ATTEMPTS).await? else {
            eprintln!("Empty code, try again.");
            continue;
        };
        match sign_in.sign_in(username, password, Some(&code)).await {
            Ok(token) => return Ok(token),
            Err(e) if e.is_auth_retryable() => {
                eprintln!("Invalid or expired code. Trying again.");
                last = e;
            }
            Err(e) => return Err(sign_in_error(e)),
        }
    }

    Err(AppError::Auth(format!(
        "Failed to authenticate after {} MFA attempts: {}",
        MFA_ATTEMPTS, last
    )))
}
