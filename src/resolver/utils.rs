// Subprocess plumbing shared by the extractor operations

use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use crate::resolver::errors::SourceError;

/// Upper bound on captured stdout/stderr. A stream URL or a single JSON
/// metadata document fits well under this.
pub const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Run a command to completion with a wall-clock budget.
/// The child is killed when the budget expires.
pub async fn run_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, SourceError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::BinaryNotFound(program.to_string()),
            _ => SourceError::Io(e),
        })?;

    let stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| SourceError::ExtractorError(format!("no stdout pipe from {}", program)))?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| SourceError::ExtractorError(format!("no stderr pipe from {}", program)))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .take(MAX_OUTPUT_BYTES)
            .read_to_end(&mut buf)
            .await
            .map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe
            .take(MAX_OUTPUT_BYTES)
            .read_to_end(&mut buf)
            .await
            .map(|_| buf)
    });

    let waited = timeout(Duration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res?;
            let stdout = stdout_task
                .await
                .map_err(|e| SourceError::ExtractorError(format!("stdout task failed: {}", e)))??;
            let stderr = stderr_task
                .await
                .map_err(|e| SourceError::ExtractorError(format!("stderr task failed: {}", e)))??;
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(SourceError::Timeout(timeout_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let out = run_with_timeout("echo", vec!["hello".to_string()], 5)
            .await
            .unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let err = run_with_timeout("sleep", vec!["5".to_string()], 1)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let err = run_with_timeout("no-such-binary-anywhere", vec![], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::BinaryNotFound(_)));
    }
}
