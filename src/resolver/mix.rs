// Mix materialization
//
// Mixes are endless server-generated radios with no browsable playlist
// behind them, so one is frozen into a fixed list: the seed video first,
// then its recommendations, capped at twenty tracks.

use tracing::debug;

use crate::resolver::backend::MetadataSession;
use crate::resolver::errors::SourceError;
use crate::resolver::models::{PlaylistInfo, TrackInfo, PLATFORM_NAME};
use crate::resolver::urls;

pub const MIX_PREFIX: &str = "RD";
pub const MIX_MAX_TRACKS: usize = 20;

const VIDEO_ID_LEN: usize = 11;

/// Seed video id of a mix playlist id, or `None` when the id is not a
/// well-formed mix id
pub fn mix_seed(playlist_id: &str) -> Option<&str> {
    let seed = playlist_id.strip_prefix(MIX_PREFIX)?;
    if seed.len() == VIDEO_ID_LEN
        && seed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Some(seed)
    } else {
        None
    }
}

/// Builds a fixed playlist out of a mix id: seed track first, then up to
/// nineteen related tracks. Failing to load the seed fails the mix;
/// failing to load recommendations degrades to the seed alone.
pub async fn materialize_mix(
    session: &dyn MetadataSession,
    playlist_id: &str,
) -> Result<PlaylistInfo, SourceError> {
    let seed_id = match mix_seed(playlist_id) {
        Some(seed) => seed,
        None => return Err(SourceError::InvalidMixId(playlist_id.to_string())),
    };

    let seed = match session.video_info(seed_id).await {
        Ok(track) => track,
        Err(e) => {
            debug!("mix seed {} failed to load: {}", seed_id, e);
            return Err(SourceError::MixUnavailable(playlist_id.to_string()));
        }
    };

    let title = format!("Mix - {}", seed.title);
    let mut tracks: Vec<TrackInfo> = vec![seed];

    match session.related(seed_id, MIX_MAX_TRACKS - 1).await {
        Ok(related) => tracks.extend(related.into_iter().take(MIX_MAX_TRACKS - 1)),
        Err(e) => debug!("mix {} continues with seed only: {}", playlist_id, e),
    }
    tracks.truncate(MIX_MAX_TRACKS);

    let thumbnail_url = tracks.iter().find_map(|t| t.thumbnail_url.clone());
    Ok(PlaylistInfo {
        id: playlist_id.to_string(),
        title,
        description: None,
        thumbnail_url,
        author: PLATFORM_NAME.to_string(),
        canonical_url: urls::playlist_url(playlist_id),
        tracks,
    })
}
