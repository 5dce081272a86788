//! Message mutation engine.
//!
//! Turns a template message into a realistic, per-ordinal unique message:
//! envelope rewrite, transport wrapper, instrument rotation, synthetic order
//! fields, payload, required-member completion, group enrichment and, when
//! asked, one semantic defect. Every step is order-sensitive and every
//! random draw comes from an RNG seeded from the ordinal.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dictionary::{Dictionary, Member};
use crate::error::GeneratorError;
use crate::reference::{DEFAULT_BENCHMARK, DEFAULT_CUSIP, DEFAULT_FUTURE_CODE, DEFAULT_FX_PAIR, DEFAULT_SYMBOL};
use crate::wire::{FieldSequence, tag};

use super::groups::{build_group_block, insert_group_block};
use super::payload::payload_for;
use super::semantic::{SemanticDefect, apply_semantic_defect};
use super::values::{COMP_ID_MAX_LEN, ValueSynthesizer, format_cents, sanitize, sending_time, wire_safe};

/// Added to the ordinal to seed each message's RNG.
pub const SEED_OFFSET: u64 = 1000;

/// Message types that receive an extra repeating group.
pub const GROUP_MESSAGE_TYPES: [&str; 5] = ["D", "8", "AE", "AB", "A"];

/// Begin string of the transport-wrapped generation.
pub const TRANSPORT_BEGIN_STRING: &str = "FIXT.1.1";

/// Logon message type.
pub const LOGON: &str = "A";

/// Offset between the sender and target participant indices.
const TARGET_OFFSET: usize = 3;

// ============================================================================
// Variants
// ============================================================================

/// A supported protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Variant {
    /// FIX 4.0
    Fix40,
    /// FIX 4.1
    Fix41,
    /// FIX 4.2
    Fix42,
    /// FIX 4.3
    Fix43,
    /// FIX 4.4
    Fix44,
    /// FIX 5.0, transport-wrapped
    Fix50,
    /// FIX 5.0 SP1, transport-wrapped
    Fix50Sp1,
    /// FIX 5.0 SP2, transport-wrapped
    Fix50Sp2,
    /// FIXT 1.1 session layer
    Fixt11,
}

impl Variant {
    /// Every supported variant, oldest first.
    pub const ALL: [Self; 9] = [
        Self::Fix40,
        Self::Fix41,
        Self::Fix42,
        Self::Fix43,
        Self::Fix44,
        Self::Fix50,
        Self::Fix50Sp1,
        Self::Fix50Sp2,
        Self::Fixt11,
    ];

    /// Identifier used in file names and dictionaries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fix40 => "FIX40",
            Self::Fix41 => "FIX41",
            Self::Fix42 => "FIX42",
            Self::Fix43 => "FIX43",
            Self::Fix44 => "FIX44",
            Self::Fix50 => "FIX50",
            Self::Fix50Sp1 => "FIX50SP1",
            Self::Fix50Sp2 => "FIX50SP2",
            Self::Fixt11 => "FIXT11",
        }
    }

    /// ApplVerID code, for variants carried inside the transport wrapper.
    #[must_use]
    pub const fn appl_ver_id(self) -> Option<&'static str> {
        match self {
            Self::Fix50 => Some("7"),
            Self::Fix50Sp1 => Some("8"),
            Self::Fix50Sp2 => Some("9"),
            _ => None,
        }
    }

    /// Whether messages of this variant travel inside the transport wrapper.
    #[must_use]
    pub const fn is_transport_wrapped(self) -> bool {
        self.appl_ver_id().is_some()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GeneratorError::UnknownVariant(s.to_string()))
    }
}

// ============================================================================
// Instrument modes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstrumentMode {
    Equity,
    FxPair,
    Bond,
    Future,
    Benchmark,
}

impl InstrumentMode {
    const CYCLE: [Self; 5] = [
        Self::Equity,
        Self::FxPair,
        Self::Bond,
        Self::Future,
        Self::Benchmark,
    ];
}

// ============================================================================
// Mutation
// ============================================================================

/// A mutated message and the defect it carries, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatedMessage {
    /// The message fields.
    pub fields: FieldSequence,
    /// Semantic defect introduced, `None` for compliant messages.
    pub defect: Option<SemanticDefect>,
}

impl MutatedMessage {
    /// Wire rendering of the message.
    #[must_use]
    pub fn render(&self) -> String {
        self.fields.render()
    }
}

/// Mutates templates for one variant.
#[derive(Debug, Clone, Copy)]
pub struct MessageMutator<'a> {
    synth: ValueSynthesizer<'a>,
    variant: Variant,
}

impl<'a> MessageMutator<'a> {
    /// Creates a mutator for `variant`.
    #[must_use]
    pub const fn new(synth: ValueSynthesizer<'a>, variant: Variant) -> Self {
        Self { synth, variant }
    }

    /// The variant being generated.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    /// The dictionary messages are completed against.
    #[must_use]
    pub const fn dictionary(&self) -> &'a Dictionary {
        self.synth.dictionary()
    }

    /// Produces message `ordinal` from `template`.
    ///
    /// The template is never modified. With `wants_defect`, the result
    /// carries exactly one [`SemanticDefect`].
    #[must_use]
    pub fn mutate(
        &self,
        template: &FieldSequence,
        ordinal: usize,
        sequence: u64,
        wants_defect: bool,
    ) -> MutatedMessage {
        let dictionary = self.synth.dictionary();
        let mut rng = StdRng::seed_from_u64(SEED_OFFSET + ordinal as u64);
        let mut fields = template.clone();

        self.apply_envelope(&mut fields, ordinal, sequence);
        self.apply_transport_wrapper(&mut fields);
        if fields.contains(tag::SYMBOL) {
            self.apply_instrument(&mut fields, ordinal);
        }
        self.apply_order_fields(&mut fields, ordinal);

        let payload_tag = if fields.contains(tag::TEST_REQ_ID) {
            tag::TEST_REQ_ID
        } else {
            tag::TEXT
        };
        fields.set_or_append(payload_tag, payload_for(ordinal));

        let msg_type = fields.first_value(tag::MSG_TYPE).unwrap_or_default().to_string();
        let members = dictionary.message(&msg_type);

        self.complete_required(&mut fields, members, sequence, ordinal, &mut rng, &mut HashSet::new());

        let mut defect = None;
        if GROUP_MESSAGE_TYPES.contains(&msg_type.as_str()) {
            defect = self.enrich_with_group(&mut fields, members, sequence, ordinal, &mut rng, wants_defect);
        }

        if wants_defect && defect.is_none() {
            defect = Some(apply_semantic_defect(&mut fields, dictionary, members));
        }
        if let Some(defect) = &defect {
            debug!(variant = %self.variant, ordinal, %defect, "semantic defect introduced");
        }

        MutatedMessage { fields, defect }
    }

    fn apply_envelope(&self, fields: &mut FieldSequence, ordinal: usize, sequence: u64) {
        let refdata = self.synth.reference();
        fields.set_or_append(tag::MSG_SEQ_NUM, sequence.to_string());
        fields.set_or_append(
            tag::SENDER_COMP_ID,
            sanitize(refdata.fund(ordinal), COMP_ID_MAX_LEN),
        );
        fields.set_or_append(
            tag::TARGET_COMP_ID,
            sanitize(refdata.bank(ordinal + TARGET_OFFSET), COMP_ID_MAX_LEN),
        );
        fields.set_or_append(tag::SENDING_TIME, sending_time(sequence));
    }

    fn apply_transport_wrapper(&self, fields: &mut FieldSequence) {
        let Some(code) = self.variant.appl_ver_id() else {
            return;
        };
        fields.set_or_append(tag::BEGIN_STRING, TRANSPORT_BEGIN_STRING);
        fields.set_or_append(tag::APPL_VER_ID, code);
        if fields.first_value(tag::MSG_TYPE) == Some(LOGON) {
            fields.set_or_append(tag::DEFAULT_APPL_VER_ID, code);
        }
    }

    /// Rotates the instrument. The mode for `ordinal` is tried first; modes
    /// without reference data pass to the next one. With no data at all the
    /// default equity symbol is used.
    fn apply_instrument(&self, fields: &mut FieldSequence, ordinal: usize) {
        let refdata = self.synth.reference();
        let start = ordinal % InstrumentMode::CYCLE.len();
        let modes = InstrumentMode::CYCLE.iter().cycle().skip(start).take(InstrumentMode::CYCLE.len());

        for mode in modes {
            match mode {
                InstrumentMode::Equity => {
                    if let Some(equity) = refdata.equity(ordinal) {
                        fields.set_or_append(tag::SYMBOL, wire_safe(&equity.symbol, DEFAULT_SYMBOL));
                        fields.set_or_append(tag::SECURITY_TYPE, "CS");
                        return;
                    }
                }
                InstrumentMode::FxPair => {
                    if let Some(pair) = refdata.fx_pair(ordinal) {
                        fields.set_or_append(tag::SYMBOL, wire_safe(pair, DEFAULT_FX_PAIR));
                        fields.set_or_append(tag::SECURITY_TYPE, "FOR");
                        fields.set_or_append(tag::CURRENCY, "USD");
                        return;
                    }
                }
                InstrumentMode::Bond => {
                    if let Some(bond) = refdata.bond(ordinal) {
                        let cusip = wire_safe(&bond.cusip, DEFAULT_CUSIP);
                        fields.set_or_append(tag::SYMBOL, cusip.clone());
                        fields.set_or_append(tag::SECURITY_ID, cusip);
                        fields.set_or_append(tag::SECURITY_ID_SOURCE, "1");
                        fields.set_or_append(tag::SECURITY_TYPE, "TBOND");
                        return;
                    }
                }
                InstrumentMode::Future => {
                    if let Some(code) = refdata.future_code(ordinal) {
                        let code = wire_safe(code, DEFAULT_FUTURE_CODE);
                        fields.set_or_append(tag::SYMBOL, format!("FUT{code}"));
                        fields.set_or_append(tag::SECURITY_TYPE, "FUT");
                        fields.set_or_append(tag::SECURITY_EXCHANGE, "CME");
                        fields.set_or_append(tag::MATURITY_MONTH_YEAR, "202603");
                        return;
                    }
                }
                InstrumentMode::Benchmark => {
                    if let Some(code) = refdata.benchmark(ordinal) {
                        fields.set_or_append(tag::SYMBOL, wire_safe(code, DEFAULT_BENCHMARK));
                        fields.set_or_append(tag::SECURITY_TYPE, "REPO");
                        fields.set_or_append(tag::CURRENCY, "USD");
                        return;
                    }
                }
            }
        }

        debug!(ordinal, "no instrument reference data, using default symbol");
        fields.set_or_append(tag::SYMBOL, DEFAULT_SYMBOL);
        fields.set_or_append(tag::SECURITY_TYPE, "CS");
    }

    fn apply_order_fields(&self, fields: &mut FieldSequence, ordinal: usize) {
        if fields.contains(tag::CL_ORD_ID) {
            fields.set_or_append(tag::CL_ORD_ID, format!("{}-ORD-{:05}", self.variant, ordinal + 1));
        }
        if fields.contains(tag::ORDER_QTY) {
            fields.set_or_append(tag::ORDER_QTY, (100 + (ordinal % 25) * 25).to_string());
        }
        if fields.contains(tag::PRICE) {
            fields.set_or_append(tag::PRICE, format_cents(2_000 + (ordinal % 70) * 137));
        }
    }

    /// Appends missing required fields and inserts a one-entry block for
    /// each missing required group, expanding required components.
    fn complete_required(
        &self,
        fields: &mut FieldSequence,
        members: &'a [Member],
        sequence: u64,
        ordinal: usize,
        rng: &mut StdRng,
        visiting: &mut HashSet<&'a str>,
    ) {
        let dictionary: &'a Dictionary = self.synth.dictionary();
        for member in members.iter().filter(|m| m.is_required()) {
            match member {
                Member::Field { name, .. } => {
                    let Some(number) = dictionary.tag_of(name) else {
                        continue;
                    };
                    let field_tag = number.to_string();
                    if !fields.contains(&field_tag) {
                        let value = self.synth.value_for(name, sequence, ordinal, rng);
                        fields.push(field_tag, value);
                    }
                }
                Member::Group { name, .. } => {
                    let Some(number) = dictionary.tag_of(name) else {
                        continue;
                    };
                    if fields.contains(&number.to_string()) {
                        continue;
                    }
                    if let Some(block) =
                        build_group_block(&self.synth, member, sequence, ordinal, rng, 1, false)
                    {
                        insert_group_block(fields, dictionary, members, member, block.fields);
                    }
                }
                Member::Component { name, .. } => {
                    if visiting.insert(name.as_str()) {
                        let nested = dictionary.component(name);
                        self.complete_required(fields, nested, sequence, ordinal, rng, visiting);
                        visiting.remove(name.as_str());
                    }
                }
            }
        }
    }

    /// Inserts an extra group block. With `wants_defect` the block is
    /// corrupted and the resulting defect returned.
    fn enrich_with_group(
        &self,
        fields: &mut FieldSequence,
        members: &'a [Member],
        sequence: u64,
        ordinal: usize,
        rng: &mut StdRng,
        wants_defect: bool,
    ) -> Option<SemanticDefect> {
        let dictionary = self.synth.dictionary();
        let direct: Vec<&Member> = dictionary.direct_usable_groups(members);
        let pool = if direct.is_empty() {
            dictionary.collect_groups(members)
        } else {
            direct
        };
        if pool.is_empty() {
            return None;
        }

        let group = pool[ordinal % pool.len()];
        let count_tag = dictionary.tag_of(group.name())?.to_string();
        if fields.contains(&count_tag) {
            debug!(group = group.name(), ordinal, "group already present, not enriching");
            return None;
        }

        let entries = if wants_defect { 2 } else { 1 + ordinal % 2 };
        let block = build_group_block(&self.synth, group, sequence, ordinal, rng, entries, wants_defect)?;
        let omitted = block.omitted;
        let at = insert_group_block(fields, dictionary, members, group, block.fields);
        debug!(group = group.name(), entries, position = at, "group block inserted");

        if !wants_defect {
            return None;
        }
        let group_name = group.name().to_string();
        Some(match omitted {
            Some(field) => SemanticDefect::IncompleteGroupEntry {
                group: group_name,
                field,
            },
            None => {
                let declared = entries + 1;
                fields.set_value_at(at, declared.to_string());
                SemanticDefect::GroupCountMismatch {
                    group: group_name,
                    declared,
                    actual: entries,
                }
            }
        })
    }
}
