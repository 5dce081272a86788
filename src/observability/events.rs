//! Structured run event stream.
//!
//! Typed events emitted while a corpus is generated or verified, written
//! as newline-delimited JSON (JSONL) with a monotonically increasing
//! sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::verify::VerifySummary;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a `fixcorpus` run.
///
/// Serialized with a `"type"` tag naming the variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A generation run has started.
    RunStarted {
        /// When the run started.
        timestamp: DateTime<Utc>,
        /// Variants discovered from template files.
        variants: Vec<String>,
        /// Output directory.
        output_dir: String,
    },

    /// A variant's corpus was generated and written.
    VariantGenerated {
        /// When the corpus was written.
        timestamp: DateTime<Utc>,
        /// Variant identifier.
        variant: String,
        /// Compliant messages written.
        correct: usize,
        /// Semantically invalid messages written.
        semantic_invalid: usize,
        /// Garbled messages written.
        garbled: usize,
        /// Path of the combined corpus file.
        combined_file: String,
    },

    /// A variant was skipped.
    VariantSkipped {
        /// When the variant was skipped.
        timestamp: DateTime<Utc>,
        /// Variant identifier.
        variant: String,
        /// Why it was skipped.
        reason: String,
    },

    /// A corpus file was run through the downstream parser.
    MessagesVerified {
        /// When verification finished.
        timestamp: DateTime<Utc>,
        /// Corpus file.
        corpus_file: String,
        /// Outcome counts.
        summary: VerifySummary,
    },

    /// A run has finished.
    RunCompleted {
        /// When the run finished.
        timestamp: DateTime<Utc>,
        /// Variants with a written corpus.
        generated: usize,
        /// Variants skipped.
        skipped: usize,
        /// Wall-clock duration in milliseconds.
        duration_ms: u64,
    },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization and I/O failures are dropped; a broken event sink never
/// fails a run.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emitter for an optional `--events-file`, discarding when absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn for_path(path: Option<&Path>) -> std::io::Result<Self> {
        path.map_or_else(|| Ok(Self::noop()), Self::from_file)
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope { sequence: seq, event };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}
