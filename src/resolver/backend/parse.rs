// Backend response normalization
//
// Responses are deep renderer trees whose shape changes without notice,
// so everything here is tolerant: walk the tree, pick what exists, fill
// sentinels for the rest. Only a wholly unusable response is an error.

use serde_json::Value;

use crate::resolver::errors::SourceError;
use crate::resolver::models::{
    format_duration, PlaylistInfo, TrackInfo, UNKNOWN, UNKNOWN_ARTIST, UNKNOWN_TITLE,
};
use crate::resolver::playlist::PlaylistEntry;
use crate::resolver::urls;

/// Tracks from a search response: every `videoRenderer` in document order
pub fn search_tracks(v: &Value) -> Vec<TrackInfo> {
    let mut out = Vec::new();
    scan(
        v,
        &mut |node| {
            let r = node.get("videoRenderer")?;
            let id = r["videoId"].as_str()?;
            Some(TrackInfo {
                id: id.to_string(),
                title: text_of(&r["title"]).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                author: text_of(&r["ownerText"])
                    .or_else(|| text_of(&r["longBylineText"]))
                    .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                duration: text_of(&r["lengthText"]).unwrap_or_else(|| UNKNOWN.to_string()),
                thumbnail_url: thumbnail_of(r),
                canonical_url: urls::watch_url(id),
                view_count: text_of(&r["viewCountText"]).unwrap_or_else(|| UNKNOWN.to_string()),
                description: None,
            })
        },
        &mut out,
    );
    out
}

/// Track from a player response. `NotFound` when the service reports the
/// video missing or returns no details at all.
pub fn video_details(v: &Value, video_id: &str) -> Result<TrackInfo, SourceError> {
    let details = &v["videoDetails"];
    let id = match details["videoId"].as_str() {
        Some(id) => id,
        None => {
            let reason = v["playabilityStatus"]["reason"]
                .as_str()
                .unwrap_or("no video details in response");
            return Err(SourceError::NotFound(format!("{}: {}", video_id, reason)));
        }
    };

    let duration = details["lengthSeconds"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .map(format_duration)
        .unwrap_or_else(|| UNKNOWN.to_string());

    Ok(TrackInfo {
        id: id.to_string(),
        title: text_of(&details["title"]).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        author: text_of(&details["author"]).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        duration,
        thumbnail_url: thumbnail_of(details),
        canonical_url: urls::watch_url(id),
        view_count: details["viewCount"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        description: details["shortDescription"].as_str().map(|s| s.to_string()),
    })
}

/// Recommendations from a watch-next response: `compactVideoRenderer`
/// entries carrying both an id and a title. Non-video recommendations
/// (playlists, radios) use other renderer keys and fall away here.
pub fn related_tracks(v: &Value) -> Vec<TrackInfo> {
    let mut out = Vec::new();
    scan(
        v,
        &mut |node| {
            let r = node.get("compactVideoRenderer")?;
            let id = r["videoId"].as_str()?;
            let title = text_of(&r["title"])?;
            Some(TrackInfo {
                id: id.to_string(),
                title,
                author: text_of(&r["longBylineText"])
                    .or_else(|| text_of(&r["shortBylineText"]))
                    .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                duration: text_of(&r["lengthText"]).unwrap_or_else(|| UNKNOWN.to_string()),
                thumbnail_url: thumbnail_of(r),
                canonical_url: urls::watch_url(id),
                view_count: text_of(&r["viewCountText"]).unwrap_or_else(|| UNKNOWN.to_string()),
                description: None,
            })
        },
        &mut out,
    );
    out
}

/// Playlist metadata and raw entries from a browse response.
///
/// Three layouts are tolerated: renderer trees (`playlistVideoRenderer`
/// nodes), a top-level `videos` array, or a top-level `items` array.
/// Entries may carry flat string fields or the nested text shapes. A
/// response with none of the three layouts is private or gone.
pub fn playlist_parts(
    v: &Value,
    playlist_id: &str,
) -> Result<(PlaylistInfo, Vec<PlaylistEntry>), SourceError> {
    if let Some(alert) = alert_text(v) {
        return Err(SourceError::PrivateOrUnavailable(format!(
            "{}: {}",
            playlist_id, alert
        )));
    }

    let mut entries: Vec<PlaylistEntry> = Vec::new();
    scan(
        v,
        &mut |node| node.get("playlistVideoRenderer").map(entry_of),
        &mut entries,
    );
    let mut found_layout = !entries.is_empty();

    if entries.is_empty() {
        if let Some(list) = v["videos"].as_array().or_else(|| v["items"].as_array()) {
            found_layout = true;
            entries = list.iter().map(entry_of).collect();
        }
    }

    let meta = &v["metadata"]["playlistMetadataRenderer"];
    let header = &v["header"]["playlistHeaderRenderer"];
    if !meta.is_object() && !header.is_object() && !found_layout {
        return Err(SourceError::PrivateOrUnavailable(format!(
            "playlist {} returned no recognizable data",
            playlist_id
        )));
    }

    let title = text_of(&meta["title"])
        .or_else(|| text_of(&header["title"]))
        .or_else(|| text_of(&v["title"]))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let description = text_of(&meta["description"]).or_else(|| text_of(&v["description"]));
    let author = text_of(&header["ownerText"])
        .or_else(|| text_of(&v["author"]))
        .or_else(|| text_of(&v["channel"]))
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    let thumbnail_url = entries.iter().find_map(|e| e.thumbnail_url.clone());

    let info = PlaylistInfo {
        id: playlist_id.to_string(),
        title,
        description,
        thumbnail_url,
        author,
        canonical_url: urls::playlist_url(playlist_id),
        tracks: Vec::new(),
    };
    Ok((info, entries))
}

fn entry_of(e: &Value) -> PlaylistEntry {
    let duration = e["duration"]
        .as_f64()
        .map(format_duration)
        .or_else(|| text_of(&e["lengthText"]))
        .or_else(|| text_of(&e["duration"]))
        .or_else(|| {
            e["lengthSeconds"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .map(format_duration)
        });

    PlaylistEntry {
        id: e["videoId"]
            .as_str()
            .or_else(|| e["id"].as_str())
            .map(|s| s.to_string()),
        title: text_of(&e["title"]),
        author: text_of(&e["author"])
            .or_else(|| text_of(&e["shortBylineText"]))
            .or_else(|| text_of(&e["ownerText"]))
            .or_else(|| text_of(&e["channel"])),
        duration,
        thumbnail_url: thumbnail_of(e),
    }
}

/// Display text in any of the shapes it arrives in: a bare string,
/// `{"simpleText": ..}`, `{"runs": [{"text": ..}, ..]}` or `{"text": ..}`.
fn text_of(v: &Value) -> Option<String> {
    if let Some(s) = v.as_str() {
        return non_empty(s);
    }
    if let Some(s) = v["simpleText"].as_str() {
        return non_empty(s);
    }
    if let Some(runs) = v["runs"].as_array() {
        let joined: String = runs.iter().filter_map(|r| r["text"].as_str()).collect();
        return non_empty(&joined);
    }
    if let Some(s) = v["text"].as_str() {
        return non_empty(s);
    }
    None
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Largest thumbnail, or the flat string form
fn thumbnail_of(r: &Value) -> Option<String> {
    if let Some(s) = r["thumbnail"].as_str() {
        return non_empty(s);
    }
    r["thumbnail"]["thumbnails"]
        .as_array()
        .and_then(|list| list.last())
        .and_then(|t| t["url"].as_str())
        .map(|s| s.to_string())
}

fn alert_text(v: &Value) -> Option<String> {
    let alerts = v["alerts"].as_array()?;
    alerts.iter().find_map(|a| {
        text_of(&a["alertRenderer"]["text"]).or_else(|| text_of(&a["alertWithButtonRenderer"]["text"]))
    })
}

fn scan<T, F>(v: &Value, f: &mut F, out: &mut Vec<T>)
where
    F: FnMut(&Value) -> Option<T>,
{
    if let Some(item) = f(v) {
        out.push(item);
    }
    match v {
        Value::Array(items) => {
            for item in items {
                scan(item, f, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                scan(item, f, out);
            }
        }
        _ => {}
    }
}
