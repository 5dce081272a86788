//! Downstream parser boundary.
//!
//! Each message is handed to an external parser binary as
//! `<binary> <dictionary_dir> <message>`; the binary answers with a JSON
//! verdict on stdout. Every invocation is an isolated process. [`ParserClient::parse`]
//! folds any failure to use the parser into a failed verdict.

mod verdict;

pub use verdict::{ParsedField, ParserVerdict, VerdictOutcome, VerifySummary};

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::error::VerifyError;

/// Default per-message timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Largest stdout accepted from the parser (1 MiB).
///
/// Output is read through a limit one byte past this, so an oversized
/// response is detected without buffering the rest of it.
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

const READ_LIMIT: u64 = MAX_RESPONSE_SIZE as u64 + 1;

/// Client for an external parser binary.
#[derive(Debug, Clone)]
pub struct ParserClient {
    binary: PathBuf,
    dictionary_dir: PathBuf,
    timeout: Duration,
}

impl ParserClient {
    /// Creates a client with [`DEFAULT_TIMEOUT_MS`].
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, dictionary_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            dictionary_dir: dictionary_dir.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Sets the per-message timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The parser binary.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Parses `message`, folding boundary failures into the verdict.
    pub async fn parse(&self, message: &str) -> ParserVerdict {
        match self.try_parse(message).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(binary = %self.binary.display(), error = %e, "parser invocation failed");
                ParserVerdict::from_failure(&e)
            }
        }
    }

    /// Parses `message`.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Unavailable`] if the binary cannot be started,
    /// [`VerifyError::Timeout`] if it does not finish in time,
    /// [`VerifyError::ExecutionFailed`] if it exits unsuccessfully, and
    /// [`VerifyError::MalformedResponse`] if its output is not a verdict or
    /// exceeds [`MAX_RESPONSE_SIZE`].
    pub async fn try_parse(&self, message: &str) -> Result<ParserVerdict, VerifyError> {
        let is_path = self.binary.components().count() > 1;
        if is_path && !self.binary.exists() {
            return Err(VerifyError::Unavailable(self.binary.display().to_string()));
        }

        let mut command = tokio::process::Command::new(&self.binary);
        command
            .arg(&self.dictionary_dir)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| VerifyError::Unavailable(format!("{}: {e}", self.binary.display())))?;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let exchange = async {
            let (stdout, stderr) = tokio::join!(read_limited(stdout_pipe), read_limited(stderr_pipe));
            let stdout = stdout.map_err(|e| VerifyError::ExecutionFailed(e.to_string()))?;
            let stderr = stderr.map_err(|e| VerifyError::ExecutionFailed(e.to_string()))?;
            if stdout.len() > MAX_RESPONSE_SIZE {
                return Err(VerifyError::MalformedResponse(format!(
                    "stdout exceeds {MAX_RESPONSE_SIZE} byte limit"
                )));
            }
            let status = child
                .wait()
                .await
                .map_err(|e| VerifyError::ExecutionFailed(e.to_string()))?;
            Ok::<_, VerifyError>((status, stdout, stderr))
        };

        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let (status, stdout, stderr) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| VerifyError::Timeout(timeout_ms))??;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            let stdout = String::from_utf8_lossy(&stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(VerifyError::ExecutionFailed(match status.code() {
                Some(code) => format!("exit status {code}: {detail}"),
                None => format!("terminated by signal: {detail}"),
            }));
        }

        let verdict: ParserVerdict = serde_json::from_slice(&stdout)
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;
        debug!(ok = verdict.ok, msg_type = %verdict.msg_type, "parser verdict");
        Ok(verdict)
    }
}

/// Reads `pipe` to its end or to [`READ_LIMIT`] bytes, whichever is first.
/// The pipe is closed on return, so a writer past the limit stops.
async fn read_limited<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(pipe) = pipe {
        pipe.take(READ_LIMIT).read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Runs `body` through `/bin/sh`: the script path takes the dictionary
    /// argument's place, so the message arrives as `$1`.
    fn shell_parser(dir: &Path, body: &str) -> ParserClient {
        let path = dir.join("parser.sh");
        std::fs::write(&path, format!("{body}\n")).unwrap();
        ParserClient::new("/bin/sh", path)
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let client = ParserClient::new("/nonexistent/fix_parser", "/tmp");
        let err = client.try_parse("8=FIX.4.4|").await.unwrap_err();
        assert!(matches!(err, VerifyError::Unavailable(_)));

        let verdict = client.parse("8=FIX.4.4|").await;
        assert_eq!(verdict.outcome(), VerdictOutcome::Unavailable);
        assert!(verdict.parse_error.starts_with("parser binary not available"));
    }

    #[tokio::test]
    async fn test_unknown_command_is_unavailable() {
        let client = ParserClient::new("fixcorpus-no-such-parser", "/tmp");
        let err = client.try_parse("8=FIX.4.4|").await.unwrap_err();
        assert!(matches!(err, VerifyError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_execution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let client = shell_parser(dir.path(), "echo 'usage' >&2\nexit 2");
        let err = client.try_parse("x").await.unwrap_err();
        match err {
            VerifyError::ExecutionFailed(detail) => assert_eq!(detail, "exit status 2: usage"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_output_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let client = shell_parser(dir.path(), "echo 'not json'");
        let verdict = client.parse("x").await;
        assert!(verdict.parse_error.starts_with("parser returned invalid JSON"));
        assert!(!verdict.ok);
    }

    #[tokio::test]
    async fn test_oversized_output_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let client = shell_parser(dir.path(), "head -c 3000000 /dev/zero");
        let err = client.try_parse("x").await.unwrap_err();
        match err {
            VerifyError::MalformedResponse(detail) => {
                assert_eq!(detail, format!("stdout exceeds {MAX_RESPONSE_SIZE} byte limit"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_parser_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let client = shell_parser(dir.path(), "sleep 5").with_timeout(Duration::from_millis(100));
        let err = client.try_parse("x").await.unwrap_err();
        assert!(matches!(err, VerifyError::Timeout(100)));
    }

    #[tokio::test]
    async fn test_message_is_passed_and_verdict_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let client = shell_parser(
            dir.path(),
            r#"printf '{"ok":true,"msg_type":"%s","structurally_valid":true}' "$1""#,
        );
        let verdict = client.parse("8=FIX.4.4|35=0|").await;
        assert!(verdict.ok);
        assert_eq!(verdict.msg_type, "8=FIX.4.4|35=0|");
        assert_eq!(verdict.outcome(), VerdictOutcome::Valid);
    }
}
