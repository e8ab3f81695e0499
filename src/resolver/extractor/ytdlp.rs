// yt-dlp subprocess client
//
// Every call shells out: stream URLs expire, so nothing here is cached.
// Credentials are handed over as a temp cookie file that lives exactly
// as long as the invocation.

use std::path::PathBuf;
use std::process::Command as StdCommand;

use serde_json::Value;
use tracing::debug;

use crate::resolver::errors::SourceError;
use crate::resolver::extractor::cookies::CookieFile;
use crate::resolver::extractor::diagnostics::classify_stderr;
use crate::resolver::models::{
    format_duration, Credential, TrackInfo, UNKNOWN, UNKNOWN_ARTIST, UNKNOWN_TITLE,
};
use crate::resolver::utils::run_with_timeout;

const STREAM_TIMEOUT_SECS: u64 = 15;
const METADATA_TIMEOUT_SECS: u64 = 15;
const PROBE_TIMEOUT_SECS: u64 = 10;
const SOCKET_TIMEOUT_SECS: u64 = 10;

pub struct YtDlpClient {
    binary_path: String,
}

impl YtDlpClient {
    pub fn new(configured: Option<&str>) -> Self {
        let binary_path = match configured {
            Some(path) => path.to_string(),
            None => Self::find_binary(),
        };
        Self { binary_path }
    }

    /// Looks in the usual install spots, then PATH via `which`, then
    /// falls back to the bare name
    fn find_binary() -> String {
        let mut candidates = vec![
            PathBuf::from("/opt/homebrew/bin/yt-dlp"),
            PathBuf::from("/usr/local/bin/yt-dlp"),
            PathBuf::from("/usr/bin/yt-dlp"),
        ];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".local/bin/yt-dlp"));
        }
        for candidate in &candidates {
            if candidate.exists() {
                return candidate.to_string_lossy().to_string();
            }
        }

        if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return path;
                }
            }
        }

        "yt-dlp".to_string()
    }

    pub fn available(&self) -> bool {
        StdCommand::new(&self.binary_path)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub fn binary_path(&self) -> &str {
        &self.binary_path
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-check-certificates".to_string(),
            "--socket-timeout".to_string(),
            SOCKET_TIMEOUT_SECS.to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ]
    }

    /// Fresh playable stream URL for a track page. Expected output is a
    /// single URL on stdout; anything else is a failed extraction.
    pub async fn resolve_stream_url(
        &self,
        page_url: &str,
        quality_selector: &str,
        credential: Option<&Credential>,
    ) -> Result<String, SourceError> {
        let cookie_file = credential.and_then(|c| CookieFile::write(c, "stream"));

        let mut args = vec![
            "--get-url".to_string(),
            "-f".to_string(),
            quality_selector.to_string(),
        ];
        args.extend(self.base_args());
        if let Some(jar) = &cookie_file {
            args.push("--cookies".to_string());
            args.push(jar.path().to_string_lossy().to_string());
        }
        args.push(page_url.to_string());

        debug!("stream extraction: {} {}", self.binary_path, args.join(" "));
        let output = run_with_timeout(&self.binary_path, args, STREAM_TIMEOUT_SECS).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr, STREAM_TIMEOUT_SECS));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let url = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("");
        if !url.starts_with("http") {
            return Err(SourceError::InvalidResult(format!(
                "expected a stream URL, got {:?}",
                url
            )));
        }
        Ok(url.to_string())
    }

    /// Full metadata for one track page
    pub async fn fetch_metadata(
        &self,
        page_url: &str,
        credential: Option<&Credential>,
    ) -> Result<TrackInfo, SourceError> {
        let cookie_file = credential.and_then(|c| CookieFile::write(c, "metadata"));

        let mut args = vec!["--dump-json".to_string()];
        args.extend(self.base_args());
        if let Some(jar) = &cookie_file {
            args.push("--cookies".to_string());
            args.push(jar.path().to_string_lossy().to_string());
        }
        args.push(page_url.to_string());

        debug!("metadata extraction: {} {}", self.binary_path, args.join(" "));
        let output = run_with_timeout(&self.binary_path, args, METADATA_TIMEOUT_SECS).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr, METADATA_TIMEOUT_SECS));
        }

        parse_track_json(&String::from_utf8_lossy(&output.stdout), page_url)
    }

    /// Shallow metadata for pages outside the recognized hosts. Skips
    /// format resolution, so it is fast but may miss fields.
    pub async fn fetch_flat_info(&self, page_url: &str) -> Result<TrackInfo, SourceError> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--flat-playlist".to_string(),
        ];
        args.extend(self.base_args());
        args.push(page_url.to_string());

        debug!("flat extraction: {} {}", self.binary_path, args.join(" "));
        let output = run_with_timeout(&self.binary_path, args, METADATA_TIMEOUT_SECS).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr, METADATA_TIMEOUT_SECS));
        }

        parse_track_json(&String::from_utf8_lossy(&output.stdout), page_url)
    }

    /// Whether the tool believes it can extract the page at all
    pub async fn probe(&self, page_url: &str) -> bool {
        let mut args = vec!["--simulate".to_string(), "--quiet".to_string()];
        args.extend(self.base_args());
        args.push(page_url.to_string());

        match run_with_timeout(&self.binary_path, args, PROBE_TIMEOUT_SECS).await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}

/// Normalizes a `--dump-json` object into a track. A page that resolves
/// to a list contributes its first entry.
fn parse_track_json(text: &str, page_url: &str) -> Result<TrackInfo, SourceError> {
    let parsed: Value = serde_json::from_str(text.trim())
        .map_err(|e| SourceError::InvalidResult(format!("metadata is not JSON: {}", e)))?;

    let v = match parsed["entries"].as_array() {
        Some(entries) => match entries.first() {
            Some(first) => first.clone(),
            None => {
                return Err(SourceError::InvalidResult(
                    "page resolved to an empty list".to_string(),
                ))
            }
        },
        None => parsed,
    };

    Ok(TrackInfo {
        id: v["id"].as_str().unwrap_or("").to_string(),
        title: v["title"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        author: v["uploader"]
            .as_str()
            .or_else(|| v["channel"].as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        duration: v["duration"]
            .as_f64()
            .map(format_duration)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        thumbnail_url: v["thumbnail"].as_str().map(|s| s.to_string()),
        canonical_url: v["webpage_url"]
            .as_str()
            .unwrap_or(page_url)
            .to_string(),
        view_count: v["view_count"]
            .as_u64()
            .map(|n| n.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        description: v["description"].as_str().map(|s| s.to_string()),
    })
}
