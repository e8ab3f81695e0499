// Innertube metadata session
//
// Speaks the same private JSON API the web player uses: bootstrap by
// scraping the site config for an API key and client version, then POST
// to the youtubei/v1 endpoints. Credentials ride along as a Cookie
// header plus the SAPISIDHASH authorization scheme.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, USER_AGENT,
};
use serde_json::{json, Value};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::resolver::backend::{
    parse, with_timeout, MetadataSession, SessionFactory, PLAYLIST_TIMEOUT_SECS,
    SEARCH_TIMEOUT_SECS,
};
use crate::resolver::errors::SourceError;
use crate::resolver::models::{ClientVariant, Credential, PlaylistInfo, TrackInfo};
use crate::resolver::playlist;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SITE_ORIGIN: &str = "https://www.youtube.com";

// Filter param restricting search results to plain videos
const VIDEO_SEARCH_PARAMS: &str = "EgIQAQ%3D%3D";

pub struct InnertubeFactory;

#[async_trait]
impl SessionFactory for InnertubeFactory {
    fn name(&self) -> &'static str {
        "innertube"
    }

    async fn create(
        &self,
        credential: Option<&Credential>,
        variant: ClientVariant,
    ) -> Result<Arc<dyn MetadataSession>, SourceError> {
        let session = InnertubeSession::connect(credential, variant).await?;
        Ok(Arc::new(session))
    }
}

pub struct InnertubeSession {
    http: reqwest::Client,
    api_key: String,
    client_version: String,
    visitor_data: Option<String>,
    variant: ClientVariant,
}

impl InnertubeSession {
    /// Builds a client with the credential baked into its default headers
    /// and bootstraps the API configuration from the landing page.
    pub async fn connect(
        credential: Option<&Credential>,
        variant: ClientVariant,
    ) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static(SITE_ORIGIN));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(cred) = credential {
            let cookie_header = cred.header();
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&cookie_header)
                    .map_err(|e| SourceError::Parse(format!("cookie header: {}", e)))?,
            );
            if let Some(sapisid) = cred.sapisid() {
                let auth = sapisid_hash_header(SITE_ORIGIN, &sapisid);
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&auth)
                        .map_err(|e| SourceError::Parse(format!("authorization header: {}", e)))?,
                );
            }
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let page = with_timeout(SEARCH_TIMEOUT_SECS, async {
            let text = http
                .get(format!("{}/", SITE_ORIGIN))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok::<String, SourceError>(text)
        })
        .await?;

        let api_key = scrape_config_value(&page, "INNERTUBE_API_KEY")
            .ok_or_else(|| SourceError::Parse("no API key in landing page".to_string()))?;
        let client_version = scrape_config_value(&page, "INNERTUBE_CLIENT_VERSION")
            .ok_or_else(|| SourceError::Parse("no client version in landing page".to_string()))?;
        let visitor_data = scrape_config_value(&page, "VISITOR_DATA");

        debug!(%variant, "metadata session established");
        Ok(Self {
            http,
            api_key,
            client_version,
            visitor_data,
            variant,
        })
    }

    fn context(&self) -> Value {
        let version = self
            .variant
            .version_override()
            .unwrap_or(self.client_version.as_str());
        json!({
            "client": {
                "clientName": self.variant.client_name(),
                "clientVersion": version,
                "hl": "en",
            }
        })
    }

    async fn post(&self, endpoint: &str, payload: Value) -> Result<Value, SourceError> {
        let url = format!(
            "{}/youtubei/v1/{}?key={}&prettyPrint=false",
            SITE_ORIGIN, endpoint, self.api_key
        );
        let mut request = self.http.post(url).json(&payload);
        if let Some(visitor) = &self.visitor_data {
            request = request.header("X-Goog-Visitor-Id", visitor.as_str());
        }
        let body = request.send().await?.error_for_status()?.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl MetadataSession for InnertubeSession {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackInfo>, SourceError> {
        let payload = json!({
            "context": self.context(),
            "query": query,
            "params": VIDEO_SEARCH_PARAMS,
        });
        let body = with_timeout(SEARCH_TIMEOUT_SECS, self.post("search", payload)).await?;
        let mut tracks = parse::search_tracks(&body);
        tracks.truncate(limit);
        Ok(tracks)
    }

    async fn video_info(&self, video_id: &str) -> Result<TrackInfo, SourceError> {
        let payload = json!({
            "context": self.context(),
            "videoId": video_id,
        });
        let body = with_timeout(PLAYLIST_TIMEOUT_SECS, self.post("player", payload)).await?;
        parse::video_details(&body, video_id)
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistInfo, SourceError> {
        let payload = json!({
            "context": self.context(),
            "browseId": format!("VL{}", playlist_id),
        });
        let body = with_timeout(PLAYLIST_TIMEOUT_SECS, self.post("browse", payload)).await?;
        let (mut info, entries) = parse::playlist_parts(&body, playlist_id)?;
        info.tracks = playlist::resolve_entries(self, entries).await;
        Ok(info)
    }

    async fn related(&self, video_id: &str, limit: usize) -> Result<Vec<TrackInfo>, SourceError> {
        let payload = json!({
            "context": self.context(),
            "videoId": video_id,
        });
        let body = with_timeout(SEARCH_TIMEOUT_SECS, self.post("next", payload)).await?;
        let mut tracks = parse::related_tracks(&body);
        tracks.truncate(limit);
        Ok(tracks)
    }

    async fn sign_out(&self) -> Result<(), SourceError> {
        // Callers treat failure here as non-fatal; the session is dropped
        // either way.
        with_timeout(SEARCH_TIMEOUT_SECS, async {
            self.http
                .post(format!("{}/logout", SITE_ORIGIN))
                .send()
                .await?;
            Ok(())
        })
        .await?;
        debug!("metadata session signed out");
        Ok(())
    }
}

/// `SAPISIDHASH <ts>_<sha1(ts sapisid origin)>`, the authorization scheme
/// the web player pairs with cookie auth
fn sapisid_hash_header(origin: &str, sapisid: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut hasher = Sha1::new();
    hasher.update(format!("{} {} {}", timestamp, sapisid, origin).as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("SAPISIDHASH {}_{}", timestamp, digest)
}

/// Pulls `"KEY":"value"` out of the landing page script soup
fn scrape_config_value(html: &str, key: &str) -> Option<String> {
    let needle = format!("\"{}\":\"", key);
    let start = html.find(&needle)? + needle.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    let value = &rest[..end];
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_config_value() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY":"AIzaSyTest123","INNERTUBE_CLIENT_VERSION":"2.20240101.00.00"});</script>"#;
        assert_eq!(
            scrape_config_value(html, "INNERTUBE_API_KEY").as_deref(),
            Some("AIzaSyTest123")
        );
        assert_eq!(
            scrape_config_value(html, "INNERTUBE_CLIENT_VERSION").as_deref(),
            Some("2.20240101.00.00")
        );
        assert_eq!(scrape_config_value(html, "VISITOR_DATA"), None);
        assert_eq!(scrape_config_value(r#""EMPTY":"""#, "EMPTY"), None);
    }

    #[test]
    fn test_sapisid_hash_shape() {
        let header = sapisid_hash_header("https://www.youtube.com", "abc123");
        let rest = header.strip_prefix("SAPISIDHASH ").unwrap();
        let (ts, digest) = rest.split_once('_').unwrap();
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
