// URL classification for the recognized video site
//
// Pure functions, no I/O. Recognized hosts: youtube.com with its www,
// mobile and music subdomains, and the youtu.be short-link form.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    // Video ids are exactly 11 characters and must end at a delimiter,
    // so a longer id-like run does not match.
    static ref VIDEO_ID_RE: Regex = Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)"
    )
    .unwrap();
    static ref PLAYLIST_ID_RE: Regex = Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").unwrap();
}

const RECOGNIZED_HOSTS: [&str; 5] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

const DENIED_SCHEMES: [&str; 3] = ["file", "ftp", "mailto"];

/// True iff the string parses as an absolute URL
pub fn is_url(s: &str) -> bool {
    Url::parse(s).is_ok()
}

/// True iff the string points at one of the recognized video-site hosts.
/// A missing scheme is tolerated; matching is case-insensitive.
pub fn is_recognized_site_url(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return false;
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    match Url::parse(&candidate) {
        Ok(parsed) => parsed
            .host_str()
            .map(|host| {
                let host = host.to_ascii_lowercase();
                RECOGNIZED_HOSTS.iter().any(|known| host == *known)
            })
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// True iff the URL is on a recognized host and carries a playlist
/// identifier parameter
pub fn is_playlist_url(s: &str) -> bool {
    is_recognized_site_url(s) && PLAYLIST_ID_RE.is_match(s)
}

/// Pull the 11-character video id out of any recognized URL form.
/// Returns None when no id is present; never panics.
pub fn extract_video_id(s: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(s)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Pull the playlist id out of a URL's `list` parameter.
/// Returns None when no id is present; never panics.
pub fn extract_playlist_id(s: &str) -> Option<String> {
    PLAYLIST_ID_RE
        .captures(s)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Policy gate for host-supplied URLs: non-empty, parseable, and not a
/// local-resource scheme. Returns a bool, never panics.
pub fn validate_url(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    match Url::parse(s) {
        Ok(parsed) => !DENIED_SCHEMES.contains(&parsed.scheme()),
        Err(_) => false,
    }
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Canonical URL for a playlist id
pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={}", playlist_id)
}
