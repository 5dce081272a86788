//! Cycle-safe walks over member trees.
//!
//! Component references are expanded through the dictionary. Each walk
//! tracks the components currently being expanded on its own call stack:
//! a component is skipped only while it is already open above the current
//! frame, so sibling branches may each expand it once.

use std::collections::HashSet;

use super::{Dictionary, Member};

type Visiting<'a> = HashSet<&'a str>;

impl Dictionary {
    /// First wire tag a member would emit.
    ///
    /// Fields and groups answer with their own tag. Components answer with
    /// the first tag any of their members would emit, or `None` when every
    /// member is unresolvable or the component is already being expanded.
    #[must_use]
    pub fn first_wire_tag(&self, member: &Member) -> Option<u32> {
        self.first_wire_tag_in(member, &mut Visiting::new())
    }

    fn first_wire_tag_in<'a>(&'a self, member: &'a Member, visiting: &mut Visiting<'a>) -> Option<u32> {
        match member {
            Member::Field { name, .. } | Member::Group { name, .. } => self.tag_of(name),
            Member::Component { name, .. } => {
                if !visiting.insert(name.as_str()) {
                    return None;
                }
                let tag = self
                    .component(name)
                    .iter()
                    .find_map(|m| self.first_wire_tag_in(m, visiting));
                visiting.remove(name.as_str());
                tag
            }
        }
    }

    /// Every usable group reachable from `members`, depth first.
    ///
    /// A group is usable when its name resolves to a tag and at least one
    /// direct field child does too. Groups nested inside other groups are
    /// not collected.
    #[must_use]
    pub fn collect_groups<'a>(&'a self, members: &'a [Member]) -> Vec<&'a Member> {
        let mut out = Vec::new();
        self.collect_groups_in(members, &mut Visiting::new(), &mut out);
        out
    }

    fn collect_groups_in<'a>(
        &'a self,
        members: &'a [Member],
        visiting: &mut Visiting<'a>,
        out: &mut Vec<&'a Member>,
    ) {
        for member in members {
            match member {
                Member::Group { .. } => {
                    if self.is_usable_group(member) {
                        out.push(member);
                    }
                }
                Member::Component { name, .. } => {
                    if visiting.insert(name.as_str()) {
                        self.collect_groups_in(self.component(name), visiting, out);
                        visiting.remove(name.as_str());
                    }
                }
                Member::Field { .. } => {}
            }
        }
    }

    /// Names of required fields at message level, in declaration order.
    ///
    /// Required components are flattened in place; optional components and
    /// groups contribute nothing.
    #[must_use]
    pub fn required_field_names<'a>(&'a self, members: &'a [Member]) -> Vec<&'a str> {
        let mut out = Vec::new();
        self.required_field_names_in(members, &mut Visiting::new(), &mut out);
        out
    }

    fn required_field_names_in<'a>(
        &'a self,
        members: &'a [Member],
        visiting: &mut Visiting<'a>,
        out: &mut Vec<&'a str>,
    ) {
        for member in members {
            match member {
                Member::Field {
                    name,
                    required: true,
                } => out.push(name),
                Member::Component {
                    name,
                    required: true,
                } => {
                    if visiting.insert(name.as_str()) {
                        self.required_field_names_in(self.component(name), visiting, out);
                        visiting.remove(name.as_str());
                    }
                }
                _ => {}
            }
        }
    }

    /// Usable groups declared directly in `members`.
    #[must_use]
    pub fn direct_usable_groups<'a>(&self, members: &'a [Member]) -> Vec<&'a Member> {
        direct_groups(members)
            .into_iter()
            .filter(|g| self.is_usable_group(g))
            .collect()
    }

    /// Whether `member` is a group that can be materialized.
    ///
    /// Entries are built from direct field children only, so a group whose
    /// children are all components or unresolvable names would declare
    /// entries it cannot carry.
    #[must_use]
    pub fn is_usable_group(&self, member: &Member) -> bool {
        let Member::Group { name, children, .. } = member else {
            return false;
        };
        self.tag_of(name).is_some()
            && children.iter().any(|child| {
                matches!(child, Member::Field { name: field, .. } if self.tag_of(field).is_some())
            })
    }
}

/// Groups declared directly in `members`, without expanding components.
#[must_use]
pub fn direct_groups(members: &[Member]) -> Vec<&Member> {
    members
        .iter()
        .filter(|m| matches!(m, Member::Group { .. }))
        .collect()
}
