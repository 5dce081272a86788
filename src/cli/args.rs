//! CLI argument definitions
//!
//! All Clap derive structs for `fixcorpus` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::generator::Variant;

// ============================================================================
// Root CLI
// ============================================================================

/// Dictionary-driven FIX test corpus synthesizer.
#[derive(Parser, Debug)]
#[command(name = "fixcorpus", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "FIXCORPUS_COLOR")]
    pub color: ColorChoice,

    /// Log output format on stderr.
    #[arg(long, default_value = "human", global = true, env = "FIXCORPUS_LOG_FORMAT")]
    pub log_format: OutputFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate compliant, semantically invalid and garbled corpora.
    Generate(GenerateArgs),

    /// Show what a dictionary offers the generator.
    Inspect(InspectArgs),

    /// Run a corpus file through an external parser.
    Verify(VerifyArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Generate
// ============================================================================

/// Arguments for `generate`. Flags override the configuration file.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Path to a YAML run configuration.
    #[arg(short, long, env = "FIXCORPUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding `FIX*.messages` template files.
    #[arg(long, env = "FIXCORPUS_TEMPLATES_DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Directory holding `<VARIANT>.xml` dictionaries.
    #[arg(long, env = "FIXCORPUS_DICTIONARY_DIR")]
    pub dictionary_dir: Option<PathBuf>,

    /// Reference data JSON cache. The built-in bundle is used when absent.
    #[arg(long, env = "FIXCORPUS_REFERENCE")]
    pub reference: Option<PathBuf>,

    /// Output directory.
    #[arg(short, long, env = "FIXCORPUS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Compliant messages per variant.
    #[arg(long)]
    pub num_correct: Option<usize>,

    /// Semantically invalid messages per variant.
    #[arg(long)]
    pub num_semantic_incorrect: Option<usize>,

    /// Garbled messages per variant.
    #[arg(long)]
    pub num_garbled: Option<usize>,

    /// Restrict generation to these variants (repeatable).
    #[arg(long = "variant")]
    pub variants: Vec<Variant>,

    /// Draw every N-th compliant message from group-bearing templates.
    #[arg(long)]
    pub group_heavy_interval: Option<usize>,

    /// Write JSONL run events to this file.
    #[arg(long, env = "FIXCORPUS_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Write a Prometheus metrics snapshot to this file.
    #[arg(long, env = "FIXCORPUS_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
}

// ============================================================================
// Inspect
// ============================================================================

/// Arguments for `inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Dictionary file.
    pub dictionary: PathBuf,

    /// Message type to describe.
    #[arg(short, long)]
    pub msg_type: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Verify
// ============================================================================

/// Arguments for `verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Corpus file, one message per line.
    pub corpus: PathBuf,

    /// Parser binary, invoked as `<parser> <dictionary-dir> <message>`.
    #[arg(long, env = "FIXCORPUS_PARSER")]
    pub parser: PathBuf,

    /// Dictionary directory handed to the parser.
    #[arg(long, env = "FIXCORPUS_PARSER_DICTIONARY_DIR")]
    pub dictionary_dir: PathBuf,

    /// Per-message timeout in milliseconds.
    #[arg(long, default_value_t = crate::verify::DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Write JSONL run events to this file.
    #[arg(long, env = "FIXCORPUS_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Write a Prometheus metrics snapshot to this file.
    #[arg(long, env = "FIXCORPUS_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
}

// ============================================================================
// Version
// ============================================================================

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
