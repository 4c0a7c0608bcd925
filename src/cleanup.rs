//! Deleting media files found by a scan.

use crate::error::AppResult;
use std::path::Path;

/// Yes/no confirmation source.
pub trait Confirm: Send {
    fn confirm(&self, prompt: &str) -> AppResult<bool>;
}

/// Asks on the terminal, defaulting to no. Blocks; run the deletion pass
/// off the runtime thread.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> AppResult<bool> {
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }
}

/// Never asks, always agrees.
pub struct NoConfirm;

impl Confirm for NoConfirm {
    fn confirm(&self, _prompt: &str) -> AppResult<bool> {
        Ok(true)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Delete each path after confirmation. Relative and missing paths are
/// skipped with a warning. A failed prompt stops the pass.
pub fn delete_paths(paths: &[String], confirm: &dyn Confirm) -> AppResult<DeleteOutcome> {
    let mut outcome = DeleteOutcome::default();

    for raw in paths.iter().filter(|p| !p.is_empty()) {
        let path = Path::new(raw);
        if !path.is_absolute() {
            tracing::warn!("Skipping non-absolute path: {}", raw);
            outcome.skipped += 1;
            continue;
        }
        if !confirm.confirm(&format!("Delete file: {}", raw))? {
            tracing::info!("Skipped {}", raw);
            outcome.skipped += 1;
            continue;
        }
        if !path.exists() {
            tracing::warn!("File does not exist: {}", raw);
            outcome.skipped += 1;
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => {
                println!("Deleted: {}", raw);
                outcome.deleted += 1;
            }
            Err(e) => {
                tracing::error!("Failed to delete {}: {}", raw, e);
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    struct Answers(Mutex<Vec<bool>>);

    impl Confirm for Answers {
        fn confirm(&self, _prompt: &str) -> AppResult<bool> {
            Ok(self.0.lock().unwrap().pop().unwrap_or(false))
        }
    }

    /// Fails like a confirm on a closed terminal.
    struct NoTerminal;

    impl Confirm for NoTerminal {
        fn confirm(&self, _prompt: &str) -> AppResult<bool> {
            Err(AppError::from(dialoguer::Error::IO(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "not a terminal",
            ))))
        }
    }

    #[test]
    fn test_deletes_confirmed_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.mkv");
        let gone = dir.path().join("gone.mkv");
        std::fs::write(&keep, b"x").unwrap();
        std::fs::write(&gone, b"x").unwrap();

        let paths = vec![
            gone.to_string_lossy().to_string(),
            keep.to_string_lossy().to_string(),
        ];
        // popped from the end: yes for gone, no for keep
        let answers = Answers(Mutex::new(vec![false, true]));
        let outcome = delete_paths(&paths, &answers).unwrap();

        assert_eq!(outcome.deleted, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(!gone.exists());
        assert!(keep.exists());
    }

    #[test]
    fn test_skips_relative_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mkv");
        let paths = vec![
            "relative/file.mkv".to_string(),
            missing.to_string_lossy().to_string(),
            String::new(),
        ];
        let outcome = delete_paths(&paths, &NoConfirm).unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome {
                deleted: 0,
                skipped: 2,
                failed: 0
            }
        );
    }

    #[test]
    fn test_prompt_failure_is_an_error_not_a_no() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("kept.mkv");
        std::fs::write(&file, b"x").unwrap();

        let err = delete_paths(&[file.to_string_lossy().to_string()], &NoTerminal).unwrap_err();

        assert!(matches!(err, AppError::Prompt(_)));
        assert!(file.exists());
    }
}
