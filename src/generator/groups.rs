//! Repeating-group blocks.
//!
//! A block is the group's count field followed by `entry_count` runs of the
//! group's direct field children. Blocks are spliced into an existing
//! message at the position the dictionary's member order implies, without
//! rebuilding the message from the dictionary.

use rand::Rng;
use rand::rngs::StdRng;

use crate::dictionary::{Dictionary, Member};
use crate::wire::{Field, FieldSequence};

use super::values::ValueSynthesizer;

/// Chance that an armed defect drops a required child of the last entry.
pub const OMISSION_PROBABILITY: f64 = 0.5;

/// A materialized group block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBlock {
    /// Count field first, then the entries.
    pub fields: Vec<Field>,
    /// Entries written.
    pub entry_count: usize,
    /// Required child left out of the last entry, if the defect fired.
    pub omitted: Option<String>,
}

/// Builds a block for `group`.
///
/// Each entry offsets the sequence number and sample index by its own
/// index so repeated entries differ. With `defect` armed, the last entry
/// may skip one required child (see [`OMISSION_PROBABILITY`]); at most one
/// child is ever skipped.
///
/// Returns `None` unless the group is usable (see
/// [`Dictionary::is_usable_group`]), so every entry written carries at least
/// one field and the count matches the entries present.
#[must_use]
pub fn build_group_block(
    synth: &ValueSynthesizer<'_>,
    group: &Member,
    sequence: u64,
    sample: usize,
    rng: &mut StdRng,
    entry_count: usize,
    defect: bool,
) -> Option<GroupBlock> {
    let dictionary = synth.dictionary();
    if !dictionary.is_usable_group(group) {
        return None;
    }
    let count_tag = dictionary.tag_of(group.name())?;

    let mut armed = defect;
    let mut omitted = None;
    let mut fields = vec![Field::new(count_tag.to_string(), entry_count.to_string())];

    for entry in 0..entry_count {
        let is_last = entry + 1 == entry_count;
        for child in group.children() {
            let Member::Field { name, required } = child else {
                continue;
            };
            let Some(tag) = dictionary.tag_of(name) else {
                continue;
            };
            if armed && is_last && *required && rng.random_bool(OMISSION_PROBABILITY) {
                armed = false;
                omitted = Some(name.clone());
                continue;
            }
            let value = synth.value_for(name, sequence + entry as u64, sample + entry, rng);
            fields.push(Field::new(tag.to_string(), value));
        }
    }

    Some(GroupBlock {
        fields,
        entry_count,
        omitted,
    })
}

/// Splices `block` into `fields` at the dictionary-correct position.
///
/// Locates `group` among `members`, either by name or, for groups that are
/// only reachable through a component, by the component whose first wire
/// tag is the group's count tag. The block goes immediately before the
/// first later member whose first wire tag is already present; if none is,
/// it is appended. Returns the index the block starts at.
pub fn insert_group_block(
    fields: &mut FieldSequence,
    dictionary: &Dictionary,
    members: &[Member],
    group: &Member,
    block: Vec<Field>,
) -> usize {
    let group_tag = dictionary.tag_of(group.name());
    let anchor = members.iter().position(|member| match member {
        Member::Group { name, .. } => name == group.name(),
        Member::Component { .. } => {
            group_tag.is_some() && dictionary.first_wire_tag(member) == group_tag
        }
        Member::Field { .. } => false,
    });

    let insert_at = anchor
        .and_then(|index| {
            members[index + 1..].iter().find_map(|later| {
                let tag = dictionary.first_wire_tag(later)?;
                fields.position(&tag.to_string())
            })
        })
        .unwrap_or_else(|| fields.len());

    fields.insert_block(insert_at, block);
    insert_at
}
