// Metadata backend: session traits and timeout discipline
//
// The concrete session speaks the site's internal JSON API; tests and
// alternate backends plug in through these traits.

pub mod innertube;
pub mod parse;
pub mod session;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{timeout, Duration};

use crate::resolver::errors::SourceError;
use crate::resolver::models::{ClientVariant, Credential, PlaylistInfo, TrackInfo};

/// Wall-clock budget for search and related lookups
pub const SEARCH_TIMEOUT_SECS: u64 = 10;
/// Wall-clock budget for playlist and single-video lookups
pub const PLAYLIST_TIMEOUT_SECS: u64 = 15;

/// One live connection to the metadata service
#[async_trait]
pub trait MetadataSession: Send + Sync {
    /// Text search, trimmed to `limit` results
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackInfo>, SourceError>;

    /// Single-video lookup
    async fn video_info(&self, video_id: &str) -> Result<TrackInfo, SourceError>;

    /// Playlist lookup with entries in source order
    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistInfo, SourceError>;

    /// "Watch next" recommendations for a video, trimmed to `limit`
    async fn related(&self, video_id: &str, limit: usize) -> Result<Vec<TrackInfo>, SourceError>;

    /// Release the session upstream. Callers treat failure as non-fatal.
    async fn sign_out(&self) -> Result<(), SourceError>;
}

/// Builds sessions for the session manager
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Create a session bound to the given credential and client variant
    async fn create(
        &self,
        credential: Option<&Credential>,
        variant: ClientVariant,
    ) -> Result<Arc<dyn MetadataSession>, SourceError>;
}

/// Race a backend call against its budget; an elapsed race surfaces as
/// the distinct Timeout error.
pub async fn with_timeout<T, F>(secs: u64, fut: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let ok = with_timeout(5, async { Ok::<_, SourceError>(42) }).await;
        assert_eq!(ok.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_fires() {
        let err = with_timeout(1, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, SourceError>(())
        })
        .await
        .unwrap_err();
        assert!(err.is_timeout());
    }
}
