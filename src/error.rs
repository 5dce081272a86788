//! Error types for `fixcorpus`
//!
//! One error enum per domain, aggregated by [`FixCorpusError`] which also
//! owns the mapping to process exit codes.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `fixcorpus` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, invalid value)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Dictionary could not be loaded
    pub const DICTIONARY_ERROR: i32 = 4;

    /// Reference data bundle could not be loaded
    pub const REFERENCE_ERROR: i32 = 5;

    /// Corpus generation failed
    pub const GENERATOR_ERROR: i32 = 10;

    /// Downstream parser verification failed
    pub const VERIFY_ERROR: i32 = 11;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `fixcorpus` operations.
#[derive(Debug, Error)]
pub enum FixCorpusError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dictionary loading error
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    /// Reference data loading error
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Corpus generation error
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    /// Downstream parser error
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FixCorpusError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Dictionary(_) => ExitCode::DICTIONARY_ERROR,
            Self::Reference(_) => ExitCode::REFERENCE_ERROR,
            Self::Generator(_) => ExitCode::GENERATOR_ERROR,
            Self::Verify(_) => ExitCode::VERIFY_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Run configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message from the parser
        message: String,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Dictionary Errors
// ============================================================================

/// Failure to turn a dictionary document into a [`Dictionary`].
///
/// Only document-level problems are errors. Unresolvable entries inside a
/// well-formed dictionary are skipped during loading.
///
/// [`Dictionary`]: crate::dictionary::Dictionary
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// The document is not well-formed markup
    #[error("malformed dictionary markup: {0}")]
    Malformed(String),

    /// The root element is not a dictionary root
    #[error("root element <{root}> is not a FIX dictionary")]
    NotADictionary {
        /// Name of the root element found
        root: String,
    },

    /// The dictionary file could not be read
    #[error("cannot read dictionary {path}: {source}")]
    Io {
        /// Path to the dictionary file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

// ============================================================================
// Reference Data Errors
// ============================================================================

/// Reference data bundle errors.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The cache file could not be read or written
    #[error("reference data I/O error for {path}: {source}")]
    Io {
        /// Path to the cache file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The cache file is not a valid bundle
    #[error("invalid reference data in {path}: {message}")]
    Invalid {
        /// Path to the cache file
        path: PathBuf,
        /// Deserializer message
        message: String,
    },
}

// ============================================================================
// Generator Errors
// ============================================================================

/// Corpus generation errors. All of them are fatal for one variant only.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// No usable template messages for a variant
    #[error("no template messages for variant {0}")]
    EmptyTemplatePool(String),

    /// Variant identifier is not one of the supported protocol versions
    #[error("unknown protocol variant: {0}")]
    UnknownVariant(String),

    /// No dictionary file for the variant
    #[error("missing dictionary for variant {variant}: {path}")]
    MissingDictionary {
        /// Variant identifier
        variant: String,
        /// Expected dictionary path
        path: PathBuf,
    },
}

// ============================================================================
// Verify Errors
// ============================================================================

/// Failures at the downstream parser boundary.
///
/// Each variant renders a distinct message that is surfaced to the user
/// as the verdict's parse error.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The parser binary does not exist or cannot be started
    #[error("parser binary not available: {0}")]
    Unavailable(String),

    /// The parser exited with a non-zero status
    #[error("parser execution failed: {0}")]
    ExecutionFailed(String),

    /// The parser did not answer in time
    #[error("parser timed out after {0} ms")]
    Timeout(u64),

    /// The parser wrote something that is not a verdict
    #[error("parser returned invalid JSON: {0}")]
    MalformedResponse(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `fixcorpus` operations.
pub type Result<T> = std::result::Result<T, FixCorpusError>;

// ============================================================================
// Tests
// ============================================================================
