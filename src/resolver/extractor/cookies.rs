// Cookie jar handoff
//
// The extractor only accepts credentials as a Netscape-format cookie
// file, so each authenticated invocation writes one to the temp dir and
// removes it when the guard drops. Names carry the pid and a process
// counter so concurrent invocations never share a file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::resolver::models::Credential;

static COOKIE_FILE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Temp cookie file that deletes itself on drop
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    /// Writes the credential as a cookie jar. Returns `None` when the
    /// write fails; the invocation then proceeds unauthenticated.
    pub fn write(credential: &Credential, kind: &str) -> Option<CookieFile> {
        let name = format!(
            "yt-source-cookies-{}-{}-{}.txt",
            kind,
            std::process::id(),
            COOKIE_FILE_SEQ.fetch_add(1, Ordering::Relaxed)
        );
        let path = std::env::temp_dir().join(name);
        match std::fs::write(&path, netscape_jar(credential)) {
            Ok(()) => Some(CookieFile { path }),
            Err(e) => {
                warn!("could not write cookie file: {}", e);
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CookieFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Netscape cookie file body: the magic header line, then one
/// tab-separated row per cookie. Expiry 0 marks a session cookie, which
/// the extractor accepts for the lifetime of one invocation.
pub fn netscape_jar(credential: &Credential) -> String {
    let mut jar = String::from("# Netscape HTTP Cookie File\n");
    for pair in credential.pairs() {
        let secure = if pair.name.contains("Secure") {
            "TRUE"
        } else {
            "FALSE"
        };
        jar.push_str(&format!(
            ".youtube.com\tTRUE\t/\t{}\t0\t{}\t{}\n",
            secure, pair.name, pair.value
        ));
    }
    jar
}
