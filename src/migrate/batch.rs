//! Chunked "add items" calls with a per-item fallback.
//!
//! Plex sometimes rejects a perfectly valid batch with "Must include items to
//! add". When that happens the chunk is replayed one key at a time.

use crate::plex::{MediaServer, Playlist, PlexError};
use async_trait::async_trait;
use plexsync_common::RatingKey;

/// Anything that accepts a batch of items in one call.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn add_batch(&self, keys: &[RatingKey]) -> Result<(), PlexError>;
}

/// Appends to a destination playlist.
pub struct PlaylistSink<'a> {
    server: &'a dyn MediaServer,
    playlist: &'a Playlist,
}

impl<'a> PlaylistSink<'a> {
    pub fn new(server: &'a dyn MediaServer, playlist: &'a Playlist) -> Self {
        Self { server, playlist }
    }
}

#[async_trait]
impl BatchSink for PlaylistSink<'_> {
    async fn add_batch(&self, keys: &[RatingKey]) -> Result<(), PlexError> {
        self.server.add_to_playlist(self.playlist, keys).await
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchOutcome {
    pub applied: usize,
    pub missed: Vec<RatingKey>,
}

/// Add `keys` in order, at most `batch_size` per call.
///
/// An empty-batch rejection degrades to single adds for that chunk; a
/// single add that fails is logged and recorded as missed. Any other chunk
/// error is returned.
pub async fn apply_in_batches<S>(
    sink: &S,
    keys: &[RatingKey],
    batch_size: usize,
) -> Result<BatchOutcome, PlexError>
where
    S: BatchSink + ?Sized,
{
    let mut outcome = BatchOutcome::default();

    for chunk in keys.chunks(batch_size.max(1)) {
        tracing::debug!("Adding batch of {} items", chunk.len());
        match sink.add_batch(chunk).await {
            Ok(()) => outcome.applied += chunk.len(),
            Err(e) if e.is_empty_batch() => {
                tracing::warn!(
                    "Batch of {} rejected as empty; falling back to single adds",
                    chunk.len()
                );
                for key in chunk {
                    match sink.add_batch(std::slice::from_ref(key)).await {
                        Ok(()) => outcome.applied += 1,
                        Err(e) => {
                            tracing::warn!("Single add failed for ratingKey={}: {}", key, e);
                            outcome.missed.push(key.clone());
                        }
                    }
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(outcome)
}
