//! Metrics collection.
//!
//! Counters are recorded through the `metrics` facade. [`init_metrics`]
//! installs a Prometheus recorder without an HTTP listener; its snapshot is
//! rendered on demand and written to a file by the CLI.

use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::FixCorpusError;
use crate::verify::VerdictOutcome;

/// Handle of the installed recorder.
static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Message kind labels.
pub const KIND_CORRECT: &str = "correct";
/// Message kind label for semantically invalid messages.
pub const KIND_SEMANTIC_INVALID: &str = "semantic_invalid";
/// Message kind label for garbled messages.
pub const KIND_GARBLED: &str = "garbled";

/// Installs the global Prometheus recorder. Later calls are no-ops.
///
/// # Errors
///
/// Returns `FixCorpusError::Io` if another recorder is already installed.
pub fn init_metrics() -> Result<(), FixCorpusError> {
    if PROMETHEUS.get().is_some() {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| FixCorpusError::Io(std::io::Error::other(e.to_string())))?;
    let _ = PROMETHEUS.set(handle);
    describe_metrics();
    Ok(())
}

/// Renders the current snapshot in Prometheus text format, or `None` if
/// [`init_metrics`] was never called.
#[must_use]
pub fn render_metrics() -> Option<String> {
    PROMETHEUS.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(
        "fixcorpus_messages_total",
        "Messages generated by variant and kind"
    );
    describe_counter!(
        "fixcorpus_variants_skipped_total",
        "Variants skipped for missing inputs or generation errors"
    );
    describe_counter!(
        "fixcorpus_verify_total",
        "Downstream parser verdicts by outcome"
    );
}

/// Records `count` generated messages of one kind.
pub fn record_messages(variant: &str, kind: &'static str, count: usize) {
    counter!(
        "fixcorpus_messages_total",
        "variant" => variant.to_owned(),
        "kind" => kind,
    )
    .increment(u64::try_from(count).unwrap_or(u64::MAX));
}

/// Records a skipped variant.
pub fn record_variant_skipped(variant: &str) {
    counter!("fixcorpus_variants_skipped_total", "variant" => variant.to_owned()).increment(1);
}

/// Records one parser verdict.
pub fn record_verdict(outcome: VerdictOutcome) {
    counter!("fixcorpus_verify_total", "outcome" => outcome.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_messages("FIX44", KIND_CORRECT, 850);
        record_messages("FIX44", KIND_GARBLED, 50);
        record_variant_skipped("FIX43");
        record_verdict(VerdictOutcome::Rejected);
    }

    #[test]
    fn installed_recorder_renders_counters() {
        init_metrics().unwrap();
        init_metrics().unwrap();
        record_messages("FIX42", KIND_SEMANTIC_INVALID, 3);
        let text = render_metrics().unwrap();
        assert!(text.contains("fixcorpus_messages_total"));
    }
}
