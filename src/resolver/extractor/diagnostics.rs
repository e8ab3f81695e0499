// Extractor stderr classification
//
// yt-dlp reports failure reasons only as prose on stderr, so errors are
// sorted into variants by substring. Access problems are checked before
// missing-video wording because age-gate messages also mention the
// video being unavailable.

use crate::resolver::errors::SourceError;

pub fn classify_stderr(stderr: &str, timeout_secs: u64) -> SourceError {
    if stderr.trim().is_empty() {
        return SourceError::ExtractorError("extractor produced no output".to_string());
    }
    let lowered = stderr.to_lowercase();

    if lowered.contains("private video")
        || lowered.contains("sign in to confirm your age")
        || lowered.contains("age-restricted")
        || lowered.contains("members only")
        || lowered.contains("members-only")
        || lowered.contains("join this channel")
        || lowered.contains("sign in if you've been granted access")
    {
        return SourceError::PrivateOrUnavailable(first_error_line(stderr));
    }

    if lowered.contains("video unavailable")
        || lowered.contains("does not exist")
        || lowered.contains("has been removed")
        || lowered.contains("404")
    {
        return SourceError::NotFound(first_error_line(stderr));
    }

    if lowered.contains("timed out") || lowered.contains("timeout") {
        return SourceError::Timeout(timeout_secs);
    }

    SourceError::ExtractorError(first_error_line(stderr))
}

/// First line starting with `ERROR:`, else the first line, so multi-line
/// warning spew does not bury the actual failure
fn first_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .find(|l| l.trim().to_lowercase().starts_with("error:"))
        .or_else(|| stderr.lines().next())
        .unwrap_or("")
        .trim()
        .to_string()
}
