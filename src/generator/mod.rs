//! Message synthesis.
//!
//! Templates are mutated into compliant and semantically invalid messages,
//! and compliant output is garbled into framing-broken messages.
//!
//! # Pipeline
//!
//! ```text
//! template ─► MessageMutator::mutate ─► compliant ──► garble ─► garbled
//!                     │
//!                     └─(wants_defect)─► semantically invalid + SemanticDefect
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`values`] | Field values from names, types and reference data |
//! | [`payload`] | Free-text payloads in three length buckets |
//! | [`groups`] | Repeating-group blocks and their placement |
//! | [`mutate`] | Per-message mutation and protocol variants |
//! | [`semantic`] | One-defect semantic corruption |
//! | [`garble`] | Framing-level corruption |
//! | [`batch`] | Per-variant corpus orchestration |
//!
//! All randomness is drawn from an RNG seeded from the message ordinal, so
//! message `i` of a variant is byte-identical across runs given the same
//! inputs.

pub mod batch;
pub mod garble;
pub mod groups;
pub mod mutate;
pub mod payload;
pub mod semantic;
pub mod values;

pub use batch::{BatchPlan, CorpusCounts, VariantCorpus, generate_variant};
pub use garble::{GarbleMode, garble};
pub use mutate::{MessageMutator, MutatedMessage, Variant};
pub use semantic::SemanticDefect;
pub use values::ValueSynthesizer;
