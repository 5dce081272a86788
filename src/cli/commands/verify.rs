//! `verify` command handler.
//!
//! Feeds every message of a corpus file to the external parser, one
//! isolated invocation each, and tallies the verdicts.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::args::{OutputFormat, VerifyArgs};
use crate::corpus::read_corpus;
use crate::error::{FixCorpusError, VerifyError};
use crate::observability::events::{Event, EventEmitter};
use crate::observability::{init_metrics, metrics};
use crate::verify::{ParserClient, ParserVerdict, VerdictOutcome, VerifySummary};

use super::write_metrics_snapshot;

/// Verdict for one corpus line.
#[derive(Debug, Clone, Serialize)]
pub struct MessageReport {
    /// 1-based line number among non-empty lines.
    pub line: usize,
    /// Classification of the verdict.
    pub outcome: VerdictOutcome,
    /// The parser's answer.
    pub verdict: ParserVerdict,
}

/// Run `verify`.
///
/// # Errors
///
/// Returns an I/O error if the corpus cannot be read, and the first
/// [`VerifyError`] if the parser could not be used for any message at all.
pub async fn run(args: &VerifyArgs, quiet: bool) -> Result<VerifySummary, FixCorpusError> {
    if args.metrics_file.is_some() {
        init_metrics()?;
    }
    let events = EventEmitter::for_path(args.events_file.as_deref())?;
    let messages = read_corpus(&args.corpus)?;
    let client = ParserClient::new(&args.parser, &args.dictionary_dir)
        .with_timeout(Duration::from_millis(args.timeout_ms));
    info!(
        corpus = %args.corpus.display(),
        messages = messages.len(),
        parser = %client.binary().display(),
        "verifying corpus"
    );

    let mut summary = VerifySummary::default();
    let mut reports = Vec::with_capacity(messages.len());
    let mut first_failure: Option<VerifyError> = None;
    for (i, message) in messages.iter().enumerate() {
        let verdict = match client.try_parse(message).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(line = i + 1, error = %e, "parser invocation failed");
                let verdict = ParserVerdict::from_failure(&e);
                first_failure.get_or_insert(e);
                verdict
            }
        };
        let outcome = verdict.outcome();
        debug!(line = i + 1, %outcome, "message verified");
        summary.record(outcome);
        metrics::record_verdict(outcome);
        reports.push(MessageReport {
            line: i + 1,
            outcome,
            verdict,
        });
    }

    events.emit(Event::MessagesVerified {
        timestamp: Utc::now(),
        corpus_file: args.corpus.display().to_string(),
        summary,
    });
    write_metrics_snapshot(args.metrics_file.as_deref())?;

    if !quiet {
        match args.format {
            OutputFormat::Json => {
                let out = serde_json::json!({
                    "corpus": args.corpus.display().to_string(),
                    "summary": summary,
                    "messages": reports,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Human => print_human(&args.corpus.display().to_string(), &summary, &reports),
        }
    }

    match first_failure {
        Some(e) if summary.unavailable == summary.total => Err(e.into()),
        _ => Ok(summary),
    }
}

fn print_human(corpus: &str, summary: &VerifySummary, reports: &[MessageReport]) {
    for report in reports {
        let detail = if !report.verdict.parse_error.is_empty() {
            report.verdict.parse_error.as_str()
        } else {
            report
                .verdict
                .validation_errors
                .first()
                .map_or("", String::as_str)
        };
        println!(
            "{:>6}  {:<11} {:<4} {}",
            report.line, report.outcome, report.verdict.msg_type, detail
        );
    }
    println!(
        "{corpus}: {} messages, {} valid, {} invalid, {} rejected, {} unavailable",
        summary.total, summary.valid, summary.invalid, summary.rejected, summary.unavailable
    );
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;

    fn args(dir: &Path, script: &str, lines: &str) -> VerifyArgs {
        let corpus = dir.join("corpus.messages");
        std::fs::write(&corpus, lines).unwrap();
        let parser = dir.join("parser.sh");
        std::fs::write(&parser, format!("{script}\n")).unwrap();
        VerifyArgs {
            corpus,
            parser: "/bin/sh".into(),
            dictionary_dir: parser,
            timeout_ms: 2_000,
            format: OutputFormat::Json,
            events_file: None,
            metrics_file: None,
        }
    }

    #[tokio::test]
    async fn tallies_verdicts() {
        let dir = tempfile::tempdir().unwrap();
        let script = r#"case "$1" in
  8=*) printf '{"ok":true,"structurally_valid":true}' ;;
  *) printf '{"ok":false,"parse_error":"Missing required FIX BeginString field (tag 8)."}' ;;
esac"#;
        let args = args(dir.path(), script, "8=FIX.4.4|35=0|\n35=0|\n\n8=FIX.4.4|35=1|\n");
        let summary = run(&args, true).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.rejected, 1);
    }

    #[tokio::test]
    async fn unusable_parser_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), "true", "8=FIX.4.4|35=0|\n");
        args.parser = dir.path().join("missing-parser");
        let err = run(&args, true).await.unwrap_err();
        assert!(matches!(err, FixCorpusError::Verify(VerifyError::Unavailable(_))));
    }

    #[tokio::test]
    async fn failing_parser_on_every_message_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), "echo boom >&2\nexit 1", "8=FIX.4.4|35=0|\n8=FIX.4.4|35=1|\n");
        let err = run(&args, true).await.unwrap_err();
        assert!(err.to_string().contains("exit status 1: boom"), "{err}");
    }
}
