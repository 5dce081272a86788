//! FIX dictionary model.
//!
//! Loads a QuickFIX-style XML dictionary into lookup tables plus member
//! trees for every message and component. Components are kept by name and
//! expanded lazily by the traversal functions in [`traversal`], so
//! self-referencing component graphs load fine and are only guarded when
//! walked.
//!
//! Loading is forgiving below the document level: nameless entries,
//! non-numeric tag numbers and messages without a `msgtype` are skipped.

pub mod traversal;

use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::DictionaryError;

/// Root element name of a dictionary document.
const DICTIONARY_ROOT: &str = "fix";

/// Primitive type assumed for fields declared without one.
const DEFAULT_FIELD_TYPE: &str = "STRING";

/// Discriminant of a [`Member`], handy for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A plain field.
    Field,
    /// A reference to a named component.
    Component,
    /// A repeating group.
    Group,
}

impl MemberKind {
    /// Lowercase label, as used in dictionary markup.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Component => "component",
            Self::Group => "group",
        }
    }
}

/// A node of a message or component definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// A field referenced by name.
    Field {
        /// Field name, resolved through the dictionary's field table.
        name: String,
        /// Whether the dictionary mandates the field here.
        required: bool,
    },
    /// A component referenced by name, expanded on demand.
    Component {
        /// Component name.
        name: String,
        /// Whether the dictionary mandates the component here.
        required: bool,
    },
    /// A repeating group. Its name doubles as the count field's name.
    Group {
        /// Count field name.
        name: String,
        /// Whether the dictionary mandates the group here.
        required: bool,
        /// Members of one repetition.
        children: Vec<Member>,
    },
}

impl Member {
    /// The member's dictionary name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Field { name, .. } | Self::Component { name, .. } | Self::Group { name, .. } => {
                name
            }
        }
    }

    /// Whether the member is mandatory at its position.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        match self {
            Self::Field { required, .. }
            | Self::Component { required, .. }
            | Self::Group { required, .. } => *required,
        }
    }

    /// The member's kind.
    #[must_use]
    pub const fn kind(&self) -> MemberKind {
        match self {
            Self::Field { .. } => MemberKind::Field,
            Self::Component { .. } => MemberKind::Component,
            Self::Group { .. } => MemberKind::Group,
        }
    }

    /// Members of one group repetition; empty for fields and components.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Group { children, .. } => children,
            Self::Field { .. } | Self::Component { .. } => &[],
        }
    }
}

/// In-memory dictionary for one protocol variant.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    /// Field name to wire tag.
    pub field_numbers: HashMap<String, u32>,
    /// Field name to primitive type tag (`INT`, `PRICE`, `UTCTIMESTAMP`, ...).
    pub field_types: HashMap<String, String>,
    /// Message type code to top-level members.
    pub messages: HashMap<String, Vec<Member>>,
    /// Component name to members.
    pub components: HashMap<String, Vec<Member>>,
}

impl Dictionary {
    /// Parses a dictionary document.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::Malformed`] if the document is not
    /// well-formed markup, or [`DictionaryError::NotADictionary`] if its
    /// root element is not `<fix>`.
    pub fn parse(xml: &str) -> Result<Self, DictionaryError> {
        let root = parse_element_tree(xml)?;
        if root.name != DICTIONARY_ROOT {
            return Err(DictionaryError::NotADictionary { root: root.name });
        }

        let mut dictionary = Self::default();

        for field in root.children_named("fields").flat_map(|s| s.children_named("field")) {
            let Some(name) = field.attribute("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            let Some(number) = field
                .attribute("number")
                .and_then(|n| n.trim().parse::<u32>().ok())
                .filter(|&n| n > 0)
            else {
                tracing::debug!(field = name, "skipping field with non-numeric tag");
                continue;
            };
            let field_type = field.attribute("type").unwrap_or(DEFAULT_FIELD_TYPE);
            dictionary.field_numbers.insert(name.to_string(), number);
            dictionary
                .field_types
                .insert(name.to_string(), field_type.to_string());
        }

        for message in root
            .children_named("messages")
            .flat_map(|s| s.children_named("message"))
        {
            let Some(msg_type) = message.attribute("msgtype").filter(|t| !t.is_empty()) else {
                continue;
            };
            dictionary
                .messages
                .insert(msg_type.to_string(), parse_members(message));
        }

        for component in root
            .children_named("components")
            .flat_map(|s| s.children_named("component"))
        {
            let Some(name) = component.attribute("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            dictionary
                .components
                .insert(name.to_string(), parse_members(component));
        }

        tracing::debug!(
            fields = dictionary.field_numbers.len(),
            messages = dictionary.messages.len(),
            components = dictionary.components.len(),
            "dictionary loaded"
        );

        Ok(dictionary)
    }

    /// Reads and parses a dictionary file.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::Io`] if the file cannot be read, otherwise
    /// whatever [`Dictionary::parse`] returns.
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let xml = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    /// Wire tag registered for a field name.
    #[must_use]
    pub fn tag_of(&self, name: &str) -> Option<u32> {
        self.field_numbers.get(name).copied()
    }

    /// Declared primitive type of a field.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<&str> {
        self.field_types.get(name).map(String::as_str)
    }

    /// Top-level members of a message type; empty if unknown.
    #[must_use]
    pub fn message(&self, msg_type: &str) -> &[Member] {
        self.messages.get(msg_type).map_or(&[], Vec::as_slice)
    }

    /// Members of a component; empty if unknown.
    #[must_use]
    pub fn component(&self, name: &str) -> &[Member] {
        self.components.get(name).map_or(&[], Vec::as_slice)
    }

    /// Whether `msg_type` is declared in the message table.
    #[must_use]
    pub fn knows_message_type(&self, msg_type: &str) -> bool {
        self.messages.contains_key(msg_type)
    }
}

/// Converts the `field`/`component`/`group` children of an element.
fn parse_members(parent: &Element) -> Vec<Member> {
    parent
        .children
        .iter()
        .filter_map(|child| {
            let name = child.attribute("name").unwrap_or_default().to_string();
            let required = child
                .attribute("required")
                .is_some_and(|r| r.trim_start().to_ascii_uppercase().starts_with('Y'));
            match child.name.as_str() {
                "field" => Some(Member::Field { name, required }),
                "component" => Some(Member::Component { name, required }),
                "group" => Some(Member::Group {
                    name,
                    required,
                    children: parse_members(child),
                }),
                _ => None,
            }
        })
        .collect()
}

// ============================================================================
// Minimal element tree
// ============================================================================

/// Element node with attributes; text content is not retained.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, DictionaryError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DictionaryError::Malformed(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| DictionaryError::Malformed(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Builds the element tree of a document, rejecting anything that is not
/// a single well-formed root element.
fn parse_element_tree(xml: &str) -> Result<Element, DictionaryError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            DictionaryError::Malformed(format!(
                "at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    DictionaryError::Malformed("unexpected closing tag".to_string())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DictionaryError::Malformed(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| DictionaryError::Malformed("document has no root element".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DictionaryError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(DictionaryError::Malformed(format!(
            "second root element <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fix major="4" minor="4">
  <header>
    <field name="BeginString" required="Y"/>
  </header>
  <messages>
    <message name="Heartbeat" msgtype="0" msgcat="admin">
      <field name="TestReqID" required="N"/>
    </message>
    <message name="NewOrderSingle" msgtype="D" msgcat="app">
      <field name="ClOrdID" required="Y"/>
      <component name="Parties" required="N"/>
      <group name="NoAllocs" required="N">
        <field name="AllocAccount" required="Y"/>
        <field name="AllocQty" required="N"/>
      </group>
      <field name="Side" required="Y"/>
    </message>
    <message name="Nameless" msgtype="">
      <field name="Side" required="Y"/>
    </message>
  </messages>
  <components>
    <component name="Parties">
      <group name="NoPartyIDs" required="N">
        <field name="PartyID" required="N"/>
      </group>
    </component>
    <component name="">
      <field name="Side" required="Y"/>
    </component>
  </components>
  <fields>
    <field number="11" name="ClOrdID" type="STRING"/>
    <field number="54" name="Side" type="CHAR">
      <value enum="1" description="BUY"/>
    </field>
    <field number="78" name="NoAllocs" type="NUMINGROUP"/>
    <field number="79" name="AllocAccount" type="STRING"/>
    <field number="80" name="AllocQty" type="QTY"/>
    <field number="112" name="TestReqID"/>
    <field number="448" name="PartyID" type="STRING"/>
    <field number="453" name="NoPartyIDs" type="NUMINGROUP"/>
    <field number="abc" name="Broken" type="INT"/>
    <field number="999" type="INT"/>
  </fields>
</fix>"#;

    #[test]
    fn loads_fields_and_types() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert_eq!(dict.tag_of("ClOrdID"), Some(11));
        assert_eq!(dict.field_type("Side"), Some("CHAR"));
        assert_eq!(dict.field_type("TestReqID"), Some("STRING"));
    }

    #[test]
    fn skips_unparseable_and_nameless_fields() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert_eq!(dict.tag_of("Broken"), None);
        assert!(!dict.field_numbers.values().any(|&n| n == 999));
    }

    #[test]
    fn skips_nameless_messages_and_components() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert_eq!(dict.messages.len(), 2);
        assert_eq!(dict.components.len(), 1);
        assert!(dict.knows_message_type("D"));
        assert!(!dict.knows_message_type(""));
    }

    #[test]
    fn builds_member_trees() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        let members = dict.message("D");
        let kinds: Vec<_> = members.iter().map(Member::kind).collect();
        assert_eq!(
            kinds,
            vec![
                MemberKind::Field,
                MemberKind::Component,
                MemberKind::Group,
                MemberKind::Field
            ]
        );
        assert!(members[0].is_required());
        assert!(!members[1].is_required());
        assert_eq!(members[2].name(), "NoAllocs");
        assert_eq!(members[2].children().len(), 2);
        assert!(members[2].children()[0].is_required());
        assert!(members[1].children().is_empty());
    }

    #[test]
    fn unknown_lookups_are_empty() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert!(dict.message("ZZ").is_empty());
        assert!(dict.component("Nope").is_empty());
    }

    #[test]
    fn rejects_malformed_markup() {
        let err = Dictionary::parse("<fix><messages></fix>").unwrap_err();
        assert!(matches!(err, DictionaryError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn rejects_unclosed_root() {
        let err = Dictionary::parse("<fix><fields>").unwrap_err();
        assert!(matches!(err, DictionaryError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn rejects_empty_document() {
        let err = Dictionary::parse("   ").unwrap_err();
        assert!(matches!(err, DictionaryError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn rejects_foreign_root() {
        let err = Dictionary::parse("<html><body/></html>").unwrap_err();
        assert!(
            matches!(err, DictionaryError::NotADictionary { ref root } if root == "html"),
            "got {err:?}"
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Dictionary::load(Path::new("/nonexistent/FIX44.xml")).unwrap_err();
        assert!(matches!(err, DictionaryError::Io { .. }));
    }
}
