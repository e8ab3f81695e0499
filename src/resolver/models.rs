// Value types shared by the resolver: tracks, playlists, credentials, config

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for tracks whose title never arrived
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Sentinel for tracks whose author never arrived
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Sentinel for durations and view counts that never arrived
pub const UNKNOWN: &str = "Unknown";

/// Display name of the platform, used as the author of synthesized mixes
pub const PLATFORM_NAME: &str = "YouTube";

/// Default format-preference expression: audio-only m4a, then webm, then
/// whatever best audio remains
pub const DEFAULT_QUALITY_SELECTOR: &str = "bestaudio[ext=m4a]/bestaudio[ext=webm]/bestaudio";

/// Normalized track metadata
///
/// Every backend result is converted to this shape before leaving the
/// resolver. Fields the upstream response lacked carry sentinel values
/// rather than being absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Display string, "H:MM:SS" or "M:SS", or "Unknown"
    pub duration: String,
    pub thumbnail_url: Option<String>,
    pub canonical_url: String,
    /// Display string, or "Unknown"
    pub view_count: String,
    pub description: Option<String>,
}

/// Normalized playlist metadata with its tracks in source order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub author: String,
    pub canonical_url: String,
    pub tracks: Vec<TrackInfo>,
}

/// One cookie as name and value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

/// Opaque cookie material supplied by the host
///
/// Compared by value: the session manager replaces the live backend
/// session when the credential it was created with no longer equals the
/// one supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credential {
    /// A raw `Cookie` header, `NAME=value` pairs joined by `;`
    Raw(String),
    /// Already-structured cookie pairs
    Cookies(Vec<CookiePair>),
}

impl Credential {
    /// The cookie pairs, parsing the raw form as needed.
    /// Malformed fragments of a raw string are skipped.
    pub fn pairs(&self) -> Vec<CookiePair> {
        match self {
            Credential::Cookies(pairs) => pairs.clone(),
            Credential::Raw(raw) => raw
                .split(';')
                .filter_map(|part| {
                    let (name, value) = part.trim().split_once('=')?;
                    if name.is_empty() {
                        return None;
                    }
                    Some(CookiePair {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                })
                .collect(),
        }
    }

    /// Render as a `Cookie` header value
    pub fn header(&self) -> String {
        match self {
            Credential::Raw(raw) => raw.clone(),
            Credential::Cookies(pairs) => pairs
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// The SAPISID value used for authorized backend calls, if present
    pub fn sapisid(&self) -> Option<String> {
        self.pairs()
            .into_iter()
            .find(|c| c.name == "SAPISID" || c.name == "__Secure-3PAPISID")
            .map(|c| c.value)
    }
}

/// Per-request context supplied by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Display identity of who asked for this resolution
    pub requester: Option<String>,
    /// Canonical URLs of recently played tracks
    pub history: Vec<String>,
    /// Cookie material for authenticated calls
    pub credential: Option<Credential>,
}

/// Host-supplied hint for how to treat a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryKind {
    /// Classify from the query text
    #[default]
    Auto,
    /// Treat as a direct URL
    Url,
    /// Treat as search text
    Search,
}

/// What a resolution produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Resolved {
    Track(TrackInfo),
    Playlist(PlaylistInfo),
    /// Nothing found; failed searches degrade here instead of erroring
    None,
}

impl Resolved {
    pub fn is_none(&self) -> bool {
        matches!(self, Resolved::None)
    }
}

/// First-party client identity the metadata backend session presents
///
/// Affects which results the service is willing to return; some content
/// is reachable from one client and not another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientVariant {
    /// Desktop web client
    #[default]
    Web,
    /// Android app client
    Android,
    /// Music web client
    Music,
}

impl ClientVariant {
    /// Client name sent in the request context
    pub fn client_name(&self) -> &'static str {
        match self {
            Self::Web => "WEB",
            Self::Android => "ANDROID",
            Self::Music => "WEB_REMIX",
        }
    }

    /// Fixed version for clients whose version cannot be scraped from the
    /// web bootstrap page
    pub fn version_override(&self) -> Option<&'static str> {
        match self {
            Self::Web => None,
            Self::Android => Some("19.09.37"),
            Self::Music => Some("1.20240101.01.00"),
        }
    }
}

impl fmt::Display for ClientVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => write!(f, "web"),
            Self::Android => write!(f, "android"),
            Self::Music => write!(f, "music"),
        }
    }
}

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Allow text-search resolution
    pub search_enabled: bool,
    /// Allow direct-URL resolution
    pub url_extraction_enabled: bool,
    /// Extractor binary location; discovered when unset
    pub extractor_path: Option<String>,
    /// Format-preference expression for stream resolution
    pub quality_selector: String,
    /// Client identity the backend session presents
    pub client_variant: ClientVariant,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            search_enabled: true,
            url_extraction_enabled: true,
            extractor_path: None,
            quality_selector: DEFAULT_QUALITY_SELECTOR.to_string(),
            client_variant: ClientVariant::Web,
        }
    }
}

impl SourceConfig {
    pub fn with_search_enabled(mut self, enabled: bool) -> Self {
        self.search_enabled = enabled;
        self
    }

    pub fn with_url_extraction_enabled(mut self, enabled: bool) -> Self {
        self.url_extraction_enabled = enabled;
        self
    }

    pub fn with_extractor_path(mut self, path: Option<String>) -> Self {
        self.extractor_path = path;
        self
    }

    pub fn with_quality_selector(mut self, selector: String) -> Self {
        self.quality_selector = selector;
        self
    }

    pub fn with_client_variant(mut self, variant: ClientVariant) -> Self {
        self.client_variant = variant;
        self
    }
}

/// Render a duration in seconds as "H:MM:SS" or "M:SS".
/// Values that are not a non-negative finite number render as "Unknown".
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return UNKNOWN.to_string();
    }
    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
