//! Parser verdicts and their tally.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::VerifyError;

/// Structured answer of the downstream parser for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserVerdict {
    /// Tokenization and framing succeeded.
    pub ok: bool,
    /// Detected begin string.
    pub begin_string: String,
    /// Detected message type.
    pub msg_type: String,
    /// Framing-level error, empty when none.
    pub parse_error: String,
    /// Field layout matches the dictionary.
    pub structurally_valid: bool,
    /// Content-level findings.
    pub validation_errors: Vec<String>,
    /// Decoded fields in wire order.
    pub fields: Vec<ParsedField>,
    /// The verdict was synthesized because the parser could not be used.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub boundary_failure: bool,
}

/// One decoded field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedField {
    /// 1-based position.
    pub index: usize,
    /// Wire tag.
    #[serde(deserialize_with = "tag_from_number_or_string")]
    pub tag: String,
    /// Dictionary name.
    pub name: String,
    /// Dictionary type.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Raw value.
    pub value: String,
    /// Typed rendering.
    pub typed: String,
}

fn tag_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tag {
        Number(u64),
        Text(String),
    }
    Ok(match Tag::deserialize(deserializer)? {
        Tag::Number(n) => n.to_string(),
        Tag::Text(s) => s,
    })
}

impl ParserVerdict {
    /// Verdict standing in for a failed parser invocation.
    #[must_use]
    pub fn from_failure(error: &VerifyError) -> Self {
        Self {
            parse_error: error.to_string(),
            boundary_failure: true,
            ..Self::default()
        }
    }

    /// Classifies this verdict.
    #[must_use]
    pub fn outcome(&self) -> VerdictOutcome {
        if self.boundary_failure {
            VerdictOutcome::Unavailable
        } else if !self.ok {
            VerdictOutcome::Rejected
        } else if self.structurally_valid && self.validation_errors.is_empty() {
            VerdictOutcome::Valid
        } else {
            VerdictOutcome::Invalid
        }
    }
}

/// How a message fared at the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictOutcome {
    /// Parsed and passed every check.
    Valid,
    /// Parsed, but failed dictionary validation.
    Invalid,
    /// Rejected at the framing layer.
    Rejected,
    /// The parser could not be used.
    Unavailable,
}

impl VerdictOutcome {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Rejected => "rejected",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for VerdictOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome counts over a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifySummary {
    /// Messages checked.
    pub total: usize,
    /// [`VerdictOutcome::Valid`] count.
    pub valid: usize,
    /// [`VerdictOutcome::Invalid`] count.
    pub invalid: usize,
    /// [`VerdictOutcome::Rejected`] count.
    pub rejected: usize,
    /// [`VerdictOutcome::Unavailable`] count.
    pub unavailable: usize,
}

impl VerifySummary {
    /// Counts one outcome.
    pub const fn record(&mut self, outcome: VerdictOutcome) {
        self.total += 1;
        match outcome {
            VerdictOutcome::Valid => self.valid += 1,
            VerdictOutcome::Invalid => self.invalid += 1,
            VerdictOutcome::Rejected => self.rejected += 1,
            VerdictOutcome::Unavailable => self.unavailable += 1,
        }
    }
}
