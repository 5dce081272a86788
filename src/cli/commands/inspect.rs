//! `inspect` command handler.
//!
//! Shows what the generator will see in a dictionary: table sizes, and for
//! one message type its required field names, member first tags and the
//! repeating groups usable for enrichment.

use serde::Serialize;

use crate::cli::args::{InspectArgs, OutputFormat};
use crate::dictionary::{Dictionary, Member};
use crate::error::FixCorpusError;

/// Table sizes of a dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryStats {
    /// Declared fields.
    pub fields: usize,
    /// Declared message types.
    pub messages: usize,
    /// Declared components.
    pub components: usize,
}

impl DictionaryStats {
    /// Counts the tables of `dictionary`.
    #[must_use]
    pub fn of(dictionary: &Dictionary) -> Self {
        Self {
            fields: dictionary.field_numbers.len(),
            messages: dictionary.messages.len(),
            components: dictionary.components.len(),
        }
    }
}

/// One top-level member of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    /// Member name.
    pub name: String,
    /// `field`, `component` or `group`.
    pub kind: &'static str,
    /// Whether it is mandatory.
    pub required: bool,
    /// First wire tag it contributes, if resolvable.
    pub first_tag: Option<u32>,
}

/// Generator-relevant view of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    /// Message type code.
    pub msg_type: String,
    /// Top-level members in declaration order.
    pub members: Vec<MemberSummary>,
    /// Required field names, components expanded.
    pub required_fields: Vec<String>,
    /// Every reachable repeating group.
    pub groups: Vec<String>,
    /// Top-level groups eligible for enrichment.
    pub usable_groups: Vec<String>,
}

impl MessageSummary {
    /// Describes `msg_type`, or `None` if the dictionary does not declare it.
    #[must_use]
    pub fn of(dictionary: &Dictionary, msg_type: &str) -> Option<Self> {
        if !dictionary.knows_message_type(msg_type) {
            return None;
        }
        let members = dictionary.message(msg_type);
        Some(Self {
            msg_type: msg_type.to_string(),
            members: members
                .iter()
                .map(|m| MemberSummary {
                    name: m.name().to_string(),
                    kind: m.kind().as_str(),
                    required: m.is_required(),
                    first_tag: dictionary.first_wire_tag(m),
                })
                .collect(),
            required_fields: dictionary
                .required_field_names(members)
                .into_iter()
                .map(str::to_string)
                .collect(),
            groups: names(&dictionary.collect_groups(members)),
            usable_groups: names(&dictionary.direct_usable_groups(members)),
        })
    }
}

/// Run `inspect`.
///
/// # Errors
///
/// Returns a dictionary error if the file cannot be loaded, or a usage
/// error if `--msg-type` names an undeclared message type.
pub fn run(args: &InspectArgs) -> Result<(), FixCorpusError> {
    let dictionary = Dictionary::load(&args.dictionary)?;
    let stats = DictionaryStats::of(&dictionary);
    let message = match &args.msg_type {
        Some(t) => Some(MessageSummary::of(&dictionary, t).ok_or_else(|| {
            FixCorpusError::Usage(format!(
                "message type '{t}' is not declared in {}",
                args.dictionary.display()
            ))
        })?),
        None => None,
    };

    match args.format {
        OutputFormat::Json => {
            let out = serde_json::json!({ "stats": stats, "message": message });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Human => {
            println!("{}", args.dictionary.display());
            println!(
                "  {} fields, {} messages, {} components",
                stats.fields, stats.messages, stats.components
            );
            if let Some(message) = message {
                print_message(&message);
            }
        }
    }
    Ok(())
}

fn names(members: &[&Member]) -> Vec<String> {
    members.iter().map(|m| m.name().to_string()).collect()
}

fn print_message(message: &MessageSummary) {
    println!();
    println!("message {}", message.msg_type);
    for member in &message.members {
        let tag = member
            .first_tag
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        let flag = if member.required { "required" } else { "optional" };
        println!("  {:>6}  {:<9} {:<8} {}", tag, member.kind, flag, member.name);
    }
    println!("required fields: {}", message.required_fields.join(", "));
    println!("groups: {}", message.groups.join(", "));
    println!("usable groups: {}", message.usable_groups.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<fix major="4" minor="4">
  <messages>
    <message name="NewOrderSingle" msgtype="D" msgcat="app">
      <field name="ClOrdID" required="Y"/>
      <component name="Parties" required="N"/>
      <group name="NoAllocs" required="N">
        <field name="AllocAccount" required="Y"/>
      </group>
      <field name="Side" required="Y"/>
    </message>
  </messages>
  <components>
    <component name="Parties">
      <group name="NoPartyIDs" required="N">
        <field name="PartyID" required="Y"/>
      </group>
    </component>
  </components>
  <fields>
    <field number="11" name="ClOrdID" type="STRING"/>
    <field number="54" name="Side" type="CHAR"/>
    <field number="78" name="NoAllocs" type="NUMINGROUP"/>
    <field number="79" name="AllocAccount" type="STRING"/>
    <field number="448" name="PartyID" type="STRING"/>
    <field number="453" name="NoPartyIDs" type="NUMINGROUP"/>
  </fields>
</fix>"#;

    #[test]
    fn stats_count_tables() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert_eq!(
            DictionaryStats::of(&dict),
            DictionaryStats {
                fields: 6,
                messages: 1,
                components: 1,
            }
        );
    }

    #[test]
    fn message_summary() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        let summary = MessageSummary::of(&dict, "D").unwrap();
        assert_eq!(summary.required_fields, vec!["ClOrdID", "Side"]);
        assert_eq!(summary.groups, vec!["NoPartyIDs", "NoAllocs"]);
        assert_eq!(summary.usable_groups, vec!["NoAllocs"]);
        assert_eq!(summary.members[1].kind, "component");
        assert_eq!(summary.members[1].first_tag, Some(453));
        assert_eq!(summary.members[2].first_tag, Some(78));
    }

    #[test]
    fn unknown_message_type() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert!(MessageSummary::of(&dict, "ZZ").is_none());
    }
}
