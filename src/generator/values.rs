//! Field-value synthesis.
//!
//! Produces a plausible value for a named field. Resolution order:
//! name-specific rules for well-known fields, then the field's declared
//! primitive type, then a sanitized company name. Names pass through
//! [`sanitize`] and external codes through [`wire_safe`], so a generated
//! value never contains the field delimiter or the assignment character.

use chrono::DateTime;
use rand::Rng;
use rand::rngs::StdRng;

use crate::dictionary::Dictionary;
use crate::reference::{DEFAULT_CUSIP, DEFAULT_SYMBOL, ReferenceData};
use crate::wire::{ASSIGNMENT, FIELD_DELIMITER};

use super::payload::payload_for;

/// Sending time of sequence number 0: 2026-02-19T12:00:00Z.
pub const EPOCH_SECONDS: i64 = 1_771_502_400;

/// Value used for date-only fields.
pub const CANONICAL_DATE: &str = "20260219";

/// Substitute for names that sanitize to nothing.
pub const PLACEHOLDER_NAME: &str = "PARTY";

/// Longest generated identifier.
const ID_MAX_LEN: usize = 20;

/// Longest generated company id.
pub const COMP_ID_MAX_LEN: usize = 12;

/// Longest generated free-form name.
const NAME_MAX_LEN: usize = 16;

const PARTY_ROLES: [&str; 4] = ["1", "3", "12", "24"];
const SIDES: [&str; 2] = ["1", "2"];
const SECURITY_TYPES: [&str; 5] = ["CS", "FOR", "TBOND", "FUT", "REPO"];
const BOOLEANS: [&str; 2] = ["Y", "N"];
const CHARS: [&str; 6] = ["A", "B", "C", "D", "1", "2"];

/// Uppercases `text`, keeps only `[A-Z0-9]` and truncates to `max_len`.
///
/// Returns [`PLACEHOLDER_NAME`] (also truncated) when nothing survives.
#[must_use]
pub fn sanitize(text: &str, max_len: usize) -> String {
    let clean: String = text
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();
    let clean = if clean.is_empty() {
        PLACEHOLDER_NAME
    } else {
        clean.as_str()
    };
    clean.chars().take(max_len).collect()
}

/// Drops the delimiter, the assignment character and control characters
/// from an externally supplied code.
///
/// Returns `fallback` when nothing survives, so a field is never emitted
/// with an empty value.
#[must_use]
pub fn wire_safe(text: &str, fallback: &str) -> String {
    let clean: String = text
        .chars()
        .filter(|&c| c != FIELD_DELIMITER && c != ASSIGNMENT && !c.is_control())
        .collect();
    if clean.is_empty() {
        fallback.to_string()
    } else {
        clean
    }
}

/// Timestamp for a sequence number, one second apart, millisecond precision.
#[must_use]
pub fn sending_time(sequence: u64) -> String {
    let offset = i64::try_from(sequence).unwrap_or(i64::MAX);
    DateTime::from_timestamp(EPOCH_SECONDS.saturating_add(offset), 0)
        .unwrap_or_default()
        .format("%Y%m%d-%H:%M:%S%.3f")
        .to_string()
}

/// Formats hundredths as a two-decimal string.
pub(crate) fn format_cents(cents: usize) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options[rng.random_range(0..options.len())]
}

/// Synthesizes field values from a dictionary and a reference bundle.
#[derive(Debug, Clone, Copy)]
pub struct ValueSynthesizer<'a> {
    dictionary: &'a Dictionary,
    reference: &'a ReferenceData,
}

impl<'a> ValueSynthesizer<'a> {
    /// Creates a synthesizer over borrowed run inputs.
    #[must_use]
    pub const fn new(dictionary: &'a Dictionary, reference: &'a ReferenceData) -> Self {
        Self {
            dictionary,
            reference,
        }
    }

    /// The dictionary values are typed against.
    #[must_use]
    pub const fn dictionary(&self) -> &'a Dictionary {
        self.dictionary
    }

    /// The reference bundle values are drawn from.
    #[must_use]
    pub const fn reference(&self) -> &'a ReferenceData {
        self.reference
    }

    /// Value for `field_name` in the message with `sequence` number and
    /// sample index `sample`.
    ///
    /// Deterministic for a given `rng` state.
    pub fn value_for(&self, field_name: &str, sequence: u64, sample: usize, rng: &mut StdRng) -> String {
        let refdata = self.reference;
        match field_name {
            "PartyID" | "AllocAccount" | "ClientID" | "OrderID" | "ClOrdID" | "OrigClOrdID"
            | "ExecID" => sanitize(&format!("{}{sequence}", refdata.fund(sample)), ID_MAX_LEN),
            "PartyIDSource" => "D".to_string(),
            "PartyRole" => pick(rng, &PARTY_ROLES).to_string(),
            "Side" => pick(rng, &SIDES).to_string(),
            "Price" | "LastPx" | "AvgPx" | "StopPx" => format_cents(8_000 + (sample % 50) * 77),
            "OrderQty" | "LastQty" | "LeavesQty" | "CumQty" | "AllocQty" => {
                (50 + (sample % 30) * 10).to_string()
            }
            "Symbol" => wire_safe(refdata.symbol(sample), DEFAULT_SYMBOL),
            "SecurityID" => wire_safe(refdata.cusip(sample), DEFAULT_CUSIP),
            "SecurityIDSource" => "1".to_string(),
            "SecurityType" => pick(rng, &SECURITY_TYPES).to_string(),
            "TransactTime" | "SendingTime" => sending_time(sequence),
            "Text" | "TestReqID" => payload_for(sample),
            "SenderCompID" => sanitize(refdata.fund(sample), COMP_ID_MAX_LEN),
            "TargetCompID" => sanitize(refdata.bank(sample), COMP_ID_MAX_LEN),
            _ => self.value_for_type(field_name, sequence, sample, rng),
        }
    }

    fn value_for_type(&self, field_name: &str, sequence: u64, sample: usize, rng: &mut StdRng) -> String {
        let field_type = self
            .dictionary
            .field_type(field_name)
            .unwrap_or("STRING")
            .to_ascii_uppercase();
        match field_type.as_str() {
            "INT" | "SEQNUM" | "LENGTH" | "NUMINGROUP" => rng.random_range(1..=100).to_string(),
            "QTY" | "PRICE" | "PRICEOFFSET" | "AMT" | "PERCENTAGE" | "DOUBLE" | "FLOAT" => {
                format!("{:.2}", rng.random_range(1.0..250.0_f64))
            }
            "BOOLEAN" => pick(rng, &BOOLEANS).to_string(),
            "CHAR" => pick(rng, &CHARS).to_string(),
            "UTCTIMESTAMP" => sending_time(sequence),
            "UTCDATEONLY" | "LOCALMKTDATE" => CANONICAL_DATE.to_string(),
            _ if field_name.ends_with("ID") => sanitize(
                &format!("{}{sequence}", self.reference.company(sample)),
                ID_MAX_LEN,
            ),
            _ => sanitize(self.reference.company(sample), NAME_MAX_LEN),
        }
    }
}
