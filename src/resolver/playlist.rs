// Batched playlist entry resolution
//
// Entries arrive in source order and leave in source order. Groups bound
// how many lookups are in flight against the backend at once.

use futures::future::join_all;
use tracing::debug;

use crate::resolver::backend::MetadataSession;
use crate::resolver::models::{TrackInfo, UNKNOWN, UNKNOWN_ARTIST};
use crate::resolver::urls;

/// Upstream lookups in flight at once while filling a playlist
pub const BATCH_SIZE: usize = 10;

/// A playlist entry as the backend reported it, before resolution
#[derive(Debug, Clone, Default)]
pub struct PlaylistEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub duration: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Resolve entries in groups of BATCH_SIZE, preserving input order.
///
/// Within a group, lookups run concurrently; a failed or id-less entry is
/// dropped without disturbing its siblings. Groups run one after another.
pub async fn resolve_entries(
    session: &dyn MetadataSession,
    entries: Vec<PlaylistEntry>,
) -> Vec<TrackInfo> {
    let mut tracks = Vec::with_capacity(entries.len());

    for group in entries.chunks(BATCH_SIZE) {
        let lookups = group.iter().map(|entry| resolve_entry(session, entry));
        let resolved = join_all(lookups).await;
        let kept = resolved.into_iter().flatten().collect::<Vec<_>>();
        if kept.len() < group.len() {
            debug!("dropped {} unresolvable playlist entries", group.len() - kept.len());
        }
        tracks.extend(kept);
    }

    tracks
}

/// One entry to one track. Entries that already carry a title normalize
/// locally; the rest go through a single-video lookup.
async fn resolve_entry(session: &dyn MetadataSession, entry: &PlaylistEntry) -> Option<TrackInfo> {
    let id = entry.id.as_deref()?;

    if let Some(title) = entry.title.as_deref() {
        return Some(TrackInfo {
            id: id.to_string(),
            title: title.to_string(),
            author: entry
                .author
                .clone()
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            duration: entry.duration.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            thumbnail_url: entry.thumbnail_url.clone(),
            canonical_url: urls::watch_url(id),
            view_count: UNKNOWN.to_string(),
            description: None,
        });
    }

    match session.video_info(id).await {
        Ok(track) => Some(track),
        Err(e) => {
            debug!("dropping playlist entry {}: {}", id, e);
            None
        }
    }
}
