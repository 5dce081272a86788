//! Structural corruption.
//!
//! Garbling breaks a rendered message at the framing layer so a parser
//! rejects it before looking at content. The mode is picked from the
//! ordinal, so a corpus cycles through all four.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::wire::FIELD_DELIMITER;

/// First message-type token, anchored on a word boundary so tags such as
/// `135=` are left alone.
static MSG_TYPE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b35=").expect("valid regex"));

/// Leading begin-string token including its delimiter.
static LEADING_BEGIN_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^8=[^|]*\|").expect("valid regex"));

/// How a message is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarbleMode {
    /// `8=` becomes `X=`.
    UnknownBeginTag,
    /// `35=` becomes `35-`.
    BrokenMsgTypeSeparator,
    /// Every delimiter removed.
    NoDelimiters,
    /// Leading `8=...|` token removed.
    MissingBeginString,
}

impl GarbleMode {
    /// Mode used for `ordinal`.
    #[must_use]
    pub const fn for_ordinal(ordinal: usize) -> Self {
        match ordinal % 4 {
            0 => Self::UnknownBeginTag,
            1 => Self::BrokenMsgTypeSeparator,
            2 => Self::NoDelimiters,
            _ => Self::MissingBeginString,
        }
    }

    /// Applies this mode to a rendered message.
    #[must_use]
    pub fn apply(self, message: &str) -> String {
        match self {
            Self::UnknownBeginTag => message.replacen("8=", "X=", 1),
            Self::BrokenMsgTypeSeparator => MSG_TYPE_TOKEN.replace(message, "35-").into_owned(),
            Self::NoDelimiters => message.replace(FIELD_DELIMITER, ""),
            Self::MissingBeginString => LEADING_BEGIN_STRING.replace(message, "").into_owned(),
        }
    }
}

impl fmt::Display for GarbleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnknownBeginTag => "unknown_begin_tag",
            Self::BrokenMsgTypeSeparator => "broken_msg_type_separator",
            Self::NoDelimiters => "no_delimiters",
            Self::MissingBeginString => "missing_begin_string",
        };
        f.write_str(name)
    }
}

/// Garbles `message` with the mode for `ordinal`.
#[must_use]
pub fn garble(message: &str, ordinal: usize) -> String {
    GarbleMode::for_ordinal(ordinal).apply(message)
}
