//! Semantic corruption.
//!
//! A semantically invalid message tokenizes cleanly but breaks one
//! dictionary rule. Each message carries exactly one such defect, and the
//! defect is reported alongside the message so callers can check it.

use std::fmt;

use serde::Serialize;

use crate::dictionary::{Dictionary, Member};
use crate::wire::{FieldSequence, tag};

/// Message type written when no required field can be removed.
pub const FALLBACK_MSG_TYPE: &str = "ZZ";

/// The single defect introduced into a semantically invalid message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticDefect {
    /// A required message-level field was removed.
    MissingRequiredField {
        /// Wire tag of the removed field.
        tag: String,
    },
    /// The last entry of an inserted group lacks a required child.
    IncompleteGroupEntry {
        /// Group name.
        group: String,
        /// Name of the omitted child.
        field: String,
    },
    /// An inserted group declares more entries than it carries.
    GroupCountMismatch {
        /// Group name.
        group: String,
        /// Count written to the group's count field.
        declared: usize,
        /// Entries actually present.
        actual: usize,
    },
    /// The message type was replaced by a code the dictionary lacks.
    UnknownMessageType {
        /// The substituted code.
        code: String,
    },
}

impl fmt::Display for SemanticDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredField { tag } => write!(f, "required tag {tag} removed"),
            Self::IncompleteGroupEntry { group, field } => {
                write!(f, "{group} entry missing required {field}")
            }
            Self::GroupCountMismatch {
                group,
                declared,
                actual,
            } => write!(f, "{group} declares {declared} entries, carries {actual}"),
            Self::UnknownMessageType { code } => write!(f, "message type {code} not in dictionary"),
        }
    }
}

/// Removes one required field, or retypes the message if none can go.
///
/// Candidates are the message's required field names in traversal order,
/// minus the begin string and message type. The first candidate whose tag
/// occurs exactly once in `fields` is removed. Tags occurring more than once
/// are passed over, since removing one copy would leave the field present.
pub fn apply_semantic_defect(
    fields: &mut FieldSequence,
    dictionary: &Dictionary,
    members: &[Member],
) -> SemanticDefect {
    let candidate = dictionary
        .required_field_names(members)
        .into_iter()
        .filter_map(|name| dictionary.tag_of(name))
        .map(|number| number.to_string())
        .filter(|t| t != tag::BEGIN_STRING && t != tag::MSG_TYPE)
        .find(|t| fields.count(t) == 1);

    if let Some(removed) = candidate {
        fields.remove_first(&removed);
        return SemanticDefect::MissingRequiredField { tag: removed };
    }

    let code = unknown_message_type(dictionary);
    fields.set_or_append(tag::MSG_TYPE, code.clone());
    SemanticDefect::UnknownMessageType { code }
}

fn unknown_message_type(dictionary: &Dictionary) -> String {
    if !dictionary.knows_message_type(FALLBACK_MSG_TYPE) {
        return FALLBACK_MSG_TYPE.to_string();
    }
    (1_u32..)
        .map(|n| format!("{FALLBACK_MSG_TYPE}{n}"))
        .find(|code| !dictionary.knows_message_type(code))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, required: bool) -> Member {
        Member::Field {
            name: name.to_string(),
            required,
        }
    }

    fn dictionary() -> Dictionary {
        let mut dict = Dictionary::default();
        for (name, number) in [
            ("BeginString", 8),
            ("MsgType", 35),
            ("ClOrdID", 11),
            ("Side", 54),
            ("Symbol", 55),
        ] {
            dict.field_numbers.insert(name.to_string(), number);
        }
        dict.messages.insert("D".to_string(), vec![]);
        dict
    }

    #[test]
    fn removes_first_required_field_in_order() {
        let dict = dictionary();
        let members = vec![
            field("MsgType", true),
            field("Symbol", false),
            field("ClOrdID", true),
            field("Side", true),
        ];
        let mut fields = FieldSequence::parse("8=FIX.4.4|35=D|11=A|54=1|55=IBM|");
        let defect = apply_semantic_defect(&mut fields, &dict, &members);
        assert_eq!(
            defect,
            SemanticDefect::MissingRequiredField {
                tag: "11".to_string()
            }
        );
        assert_eq!(fields.render(), "8=FIX.4.4|35=D|54=1|55=IBM|");
    }

    #[test]
    fn skips_absent_and_repeated_candidates() {
        let dict = dictionary();
        let members = vec![field("ClOrdID", true), field("Side", true), field("Symbol", true)];
        let mut fields = FieldSequence::parse("8=FIX.4.4|35=D|54=1|54=2|55=IBM|");
        let defect = apply_semantic_defect(&mut fields, &dict, &members);
        assert_eq!(
            defect,
            SemanticDefect::MissingRequiredField {
                tag: "55".to_string()
            }
        );
        assert_eq!(fields.count("54"), 2);
    }

    #[test]
    fn falls_back_to_unknown_type() {
        let dict = dictionary();
        let members = vec![field("MsgType", true), field("BeginString", true)];
        let mut fields = FieldSequence::parse("8=FIX.4.4|35=D|");
        let defect = apply_semantic_defect(&mut fields, &dict, &members);
        assert_eq!(
            defect,
            SemanticDefect::UnknownMessageType {
                code: "ZZ".to_string()
            }
        );
        assert_eq!(fields.render(), "8=FIX.4.4|35=ZZ|");
        assert!(!dict.knows_message_type("ZZ"));
    }

    #[test]
    fn fallback_avoids_known_codes() {
        let mut dict = dictionary();
        dict.messages.insert("ZZ".to_string(), vec![]);
        dict.messages.insert("ZZ1".to_string(), vec![]);
        let mut fields = FieldSequence::parse("8=FIX.4.4|35=D|");
        let defect = apply_semantic_defect(&mut fields, &dict, &[]);
        assert_eq!(
            defect,
            SemanticDefect::UnknownMessageType {
                code: "ZZ2".to_string()
            }
        );
    }

    #[test]
    fn display_names_the_defect() {
        let defect = SemanticDefect::GroupCountMismatch {
            group: "NoPartyIDs".to_string(),
            declared: 3,
            actual: 2,
        };
        assert_eq!(defect.to_string(), "NoPartyIDs declares 3 entries, carries 2");
    }
}
