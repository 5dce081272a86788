//! Batch orchestration for one variant.
//!
//! Produces the compliant, semantically invalid and garbled message lists
//! in that order. Sequence numbers run continuously across the first two
//! lists; semantic ordinals continue after the compliant ones.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dictionary::Dictionary;
use crate::error::GeneratorError;
use crate::wire::{FieldSequence, tag};

use super::garble::garble;
use super::mutate::{GROUP_MESSAGE_TYPES, MessageMutator, Variant};
use super::semantic::SemanticDefect;

/// Messages to produce per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusCounts {
    /// Compliant messages.
    pub correct: usize,
    /// Semantically invalid messages.
    pub semantic_invalid: usize,
    /// Garbled messages.
    pub garbled: usize,
}

impl Default for CorpusCounts {
    fn default() -> Self {
        Self {
            correct: 850,
            semantic_invalid: 100,
            garbled: 50,
        }
    }
}

impl CorpusCounts {
    /// Messages across all three kinds.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.correct + self.semantic_invalid + self.garbled
    }
}

/// Everything that shapes a batch besides its inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchPlan {
    /// Per-kind counts.
    pub counts: CorpusCounts,
    /// When set to `n > 0`, every `n`-th compliant message is drawn from the
    /// group-bearing templates.
    pub group_heavy_interval: Option<usize>,
}

/// The generated corpus of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCorpus {
    /// Variant the corpus was generated for.
    pub variant: Variant,
    /// Compliant messages.
    pub correct: Vec<String>,
    /// Semantically invalid messages.
    pub semantic_invalid: Vec<String>,
    /// Defect carried by each semantically invalid message, same order.
    pub defects: Vec<SemanticDefect>,
    /// Garbled messages.
    pub garbled: Vec<String>,
}

impl VariantCorpus {
    /// Messages across all three kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.correct.len() + self.semantic_invalid.len() + self.garbled.len()
    }

    /// All messages, compliant first, garbled last.
    pub fn combined(&self) -> impl Iterator<Item = &str> {
        self.correct
            .iter()
            .chain(&self.semantic_invalid)
            .chain(&self.garbled)
            .map(String::as_str)
    }
}

/// Generates the corpus for the mutator's variant.
///
/// # Errors
///
/// Returns [`GeneratorError::EmptyTemplatePool`] if `templates` is empty.
pub fn generate_variant(
    mutator: &MessageMutator<'_>,
    templates: &[FieldSequence],
    plan: &BatchPlan,
) -> Result<VariantCorpus, GeneratorError> {
    let variant = mutator.variant();
    let dictionary = mutator.dictionary();
    if templates.is_empty() {
        return Err(GeneratorError::EmptyTemplatePool(variant.to_string()));
    }
    let counts = plan.counts;
    let mut sequence: u64 = 1;

    let heavy = group_heavy_templates(dictionary, templates);
    let interval = plan.group_heavy_interval.filter(|n| *n > 0);
    let mut correct = Vec::with_capacity(counts.correct);
    for ordinal in 0..counts.correct {
        let template = match interval {
            Some(n) if (ordinal + 1) % n == 0 && !heavy.is_empty() => {
                heavy[(ordinal / n) % heavy.len()]
            }
            _ => &templates[ordinal % templates.len()],
        };
        correct.push(mutator.mutate(template, ordinal, sequence, false).render());
        sequence += 1;
    }

    let pool = semantic_templates(dictionary, templates);
    debug!(%variant, templates = templates.len(), semantic_pool = pool.len(), "template pools ready");
    let mut semantic_invalid = Vec::with_capacity(counts.semantic_invalid);
    let mut defects = Vec::with_capacity(counts.semantic_invalid);
    for i in 0..counts.semantic_invalid {
        let ordinal = i + counts.correct;
        let template = pool[ordinal % pool.len()];
        let message = mutator.mutate(template, ordinal, sequence, true);
        semantic_invalid.push(message.render());
        if let Some(defect) = message.defect {
            defects.push(defect);
        }
        sequence += 1;
    }

    let sources: Vec<String> = if correct.is_empty() {
        templates.iter().map(FieldSequence::render).collect()
    } else {
        correct.clone()
    };
    let garbled = (0..counts.garbled)
        .map(|ordinal| garble(&sources[ordinal % sources.len()], ordinal))
        .collect();

    Ok(VariantCorpus {
        variant,
        correct,
        semantic_invalid,
        defects,
        garbled,
    })
}

/// Templates preferred for semantic corruption: those whose message type
/// has groups, else those with groups or required fields, else all.
fn semantic_templates<'t>(dictionary: &Dictionary, templates: &'t [FieldSequence]) -> Vec<&'t FieldSequence> {
    let mut with_groups = Vec::new();
    let mut with_rules = Vec::new();
    for template in templates {
        let members = dictionary.message(template.first_value(tag::MSG_TYPE).unwrap_or_default());
        let has_groups = !dictionary.collect_groups(members).is_empty();
        if has_groups {
            with_groups.push(template);
        }
        if has_groups || !dictionary.required_field_names(members).is_empty() {
            with_rules.push(template);
        }
    }
    if !with_groups.is_empty() {
        with_groups
    } else if !with_rules.is_empty() {
        with_rules
    } else {
        templates.iter().collect()
    }
}

/// Templates that receive group enrichment.
fn group_heavy_templates<'t>(dictionary: &Dictionary, templates: &'t [FieldSequence]) -> Vec<&'t FieldSequence> {
    templates
        .iter()
        .filter(|template| {
            let msg_type = template.first_value(tag::MSG_TYPE).unwrap_or_default();
            GROUP_MESSAGE_TYPES.contains(&msg_type)
                && !dictionary.collect_groups(dictionary.message(msg_type)).is_empty()
        })
        .collect()
}
