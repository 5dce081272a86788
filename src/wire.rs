//! Wire token format.
//!
//! A message is a run of `tag=value` tokens, each followed by
//! [`FIELD_DELIMITER`]. Tags are decimal strings. Tag uniqueness is not
//! enforced: repeating groups legitimately emit the same child tags once per
//! entry, so every lookup here is a linear scan that honours field order.

use std::fmt;

/// Separator written after every `tag=value` token.
pub const FIELD_DELIMITER: char = '|';

/// Separator between a tag and its value.
pub const ASSIGNMENT: char = '=';

/// Well-known tag numbers used by the mutation engine.
pub mod tag {
    /// Currency.
    pub const CURRENCY: &str = "15";
    /// Client order identifier.
    pub const CL_ORD_ID: &str = "11";
    /// Security identifier source.
    pub const SECURITY_ID_SOURCE: &str = "22";
    /// Message sequence number.
    pub const MSG_SEQ_NUM: &str = "34";
    /// Message type.
    pub const MSG_TYPE: &str = "35";
    /// Order quantity.
    pub const ORDER_QTY: &str = "38";
    /// Price.
    pub const PRICE: &str = "44";
    /// Security identifier.
    pub const SECURITY_ID: &str = "48";
    /// Sender company identifier.
    pub const SENDER_COMP_ID: &str = "49";
    /// Sending time.
    pub const SENDING_TIME: &str = "52";
    /// Symbol.
    pub const SYMBOL: &str = "55";
    /// Target company identifier.
    pub const TARGET_COMP_ID: &str = "56";
    /// Free text.
    pub const TEXT: &str = "58";
    /// Begin string, the outer envelope tag.
    pub const BEGIN_STRING: &str = "8";
    /// Test request identifier, the long free-form field.
    pub const TEST_REQ_ID: &str = "112";
    /// Security type.
    pub const SECURITY_TYPE: &str = "167";
    /// Maturity month-year.
    pub const MATURITY_MONTH_YEAR: &str = "200";
    /// Security exchange.
    pub const SECURITY_EXCHANGE: &str = "207";
    /// Application version of the wrapped message.
    pub const APPL_VER_ID: &str = "1128";
    /// Default application version negotiated at logon.
    pub const DEFAULT_APPL_VER_ID: &str = "1137";
}

/// A single `tag=value` wire token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Decimal tag identifier.
    pub tag: String,
    /// Field value.
    pub value: String,
}

impl Field {
    /// Creates a field from anything string-like.
    #[must_use]
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// An ordered message under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSequence {
    fields: Vec<Field>,
}

impl FieldSequence {
    /// Creates an empty sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Tokenizes one template line.
    ///
    /// Lenient: empty tokens and tokens without an assignment are dropped,
    /// and only the first assignment splits tag from value.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        line.trim()
            .split(FIELD_DELIMITER)
            .filter_map(|token| token.split_once(ASSIGNMENT))
            .map(|(tag, value)| Field::new(tag, value))
            .collect()
    }

    /// Serializes to the wire token format, trailing delimiter included.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Number of fields, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the sequence holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates the fields in wire order.
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Returns `true` if any field carries `tag`.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.position(tag).is_some()
    }

    /// Index of the first field carrying `tag`.
    #[must_use]
    pub fn position(&self, tag: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.tag == tag)
    }

    /// Value of the first field carrying `tag`.
    #[must_use]
    pub fn first_value(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.tag == tag)
            .map(|f| f.value.as_str())
    }

    /// Number of fields carrying `tag`.
    #[must_use]
    pub fn count(&self, tag: &str) -> usize {
        self.fields.iter().filter(|f| f.tag == tag).count()
    }

    /// Replaces the first `tag` in place, or appends it.
    pub fn set_or_append(&mut self, tag: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.tag == tag) {
            Some(field) => field.value = value,
            None => self.fields.push(Field::new(tag, value)),
        }
    }

    /// Field at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Overwrites the value at `index`. Returns `false` if out of range.
    pub fn set_value_at(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.fields.get_mut(index) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Appends a field at the end.
    pub fn push(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field::new(tag, value));
    }

    /// Removes the first field carrying `tag`. Returns whether one was removed.
    pub fn remove_first(&mut self, tag: &str) -> bool {
        match self.position(tag) {
            Some(index) => {
                self.fields.remove(index);
                true
            }
            None => false,
        }
    }

    /// Splices `block` in before `index`. An index past the end appends.
    pub fn insert_block(&mut self, index: usize, block: Vec<Field>) {
        let at = index.min(self.fields.len());
        self.fields.splice(at..at, block);
    }
}

impl fmt::Display for FieldSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{}{ASSIGNMENT}{}{FIELD_DELIMITER}", field.tag, field.value)?;
        }
        Ok(())
    }
}

impl FromIterator<Field> for FieldSequence {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FieldSequence {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_tokens_without_assignment() {
        let seq = FieldSequence::parse("8=FIX.4.4|junk||35=D|58=a=b|\n");
        let tags: Vec<_> = seq.iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(tags, vec!["8", "35", "58"]);
        assert_eq!(seq.first_value("58"), Some("a=b"));
    }

    #[test]
    fn render_has_trailing_delimiter() {
        let seq = FieldSequence::parse("8=FIX.4.2|35=0");
        assert_eq!(seq.render(), "8=FIX.4.2|35=0|");
    }

    #[test]
    fn set_or_append_preserves_position() {
        let mut seq = FieldSequence::parse("8=FIX.4.4|34=1|35=D|");
        seq.set_or_append(tag::MSG_SEQ_NUM, "99");
        seq.set_or_append(tag::SENDER_COMP_ID, "ALPHA");
        assert_eq!(seq.render(), "8=FIX.4.4|34=99|35=D|49=ALPHA|");
    }

    #[test]
    fn set_or_append_touches_first_duplicate_only() {
        let mut seq = FieldSequence::parse("453=2|448=A|448=B|");
        seq.set_or_append("448", "Z");
        assert_eq!(seq.render(), "453=2|448=Z|448=B|");
    }

    #[test]
    fn remove_first_removes_one_occurrence() {
        let mut seq = FieldSequence::parse("448=A|448=B|");
        assert!(seq.remove_first("448"));
        assert_eq!(seq.count("448"), 1);
        assert!(seq.remove_first("448"));
        assert!(!seq.remove_first("448"));
        assert!(seq.is_empty());
    }

    #[test]
    fn insert_block_splices_before_index() {
        let mut seq = FieldSequence::parse("8=FIX.4.4|35=D|55=IBM|");
        seq.insert_block(2, vec![Field::new("78", "1"), Field::new("79", "ACC")]);
        assert_eq!(seq.render(), "8=FIX.4.4|35=D|78=1|79=ACC|55=IBM|");
    }

    #[test]
    fn insert_block_past_end_appends() {
        let mut seq = FieldSequence::parse("8=FIX.4.4|");
        seq.insert_block(42, vec![Field::new("58", "x")]);
        assert_eq!(seq.render(), "8=FIX.4.4|58=x|");
    }

    #[test]
    fn set_value_at_reports_range() {
        let mut seq = FieldSequence::parse("78=2|79=A|");
        assert!(seq.set_value_at(0, "3"));
        assert!(!seq.set_value_at(5, "x"));
        assert_eq!(seq.get(0).map(|f| f.value.as_str()), Some("3"));
    }
}
