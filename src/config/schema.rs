//! Run configuration schema.
//!
//! These types are deserialized from YAML configuration files. Every field
//! has a default, so an empty mapping is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generator::{BatchPlan, CorpusCounts, Variant};

/// Default template directory.
pub const DEFAULT_TEMPLATES_DIR: &str = "data/samples/valid";

/// Default dictionary directory.
pub const DEFAULT_DICTIONARY_DIR: &str = "data/quickfix";

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "data/samples/realistic";

// ============================================================================
// Generation Configuration
// ============================================================================

/// Configuration of a `generate` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct GenerationConfig {
    /// Directory holding `FIX*.messages` template files.
    pub templates_dir: PathBuf,

    /// Directory holding `<VARIANT>.xml` dictionaries.
    pub dictionary_dir: PathBuf,

    /// Persisted reference data bundle; the built-in bundle when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_file: Option<PathBuf>,

    /// Directory receiving the corpus files.
    pub output_dir: PathBuf,

    /// Messages per kind and variant.
    pub counts: CorpusCounts,

    /// Variants to generate; every discovered variant when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<String>>,

    /// Draw every n-th compliant message from group-bearing templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_heavy_interval: Option<usize>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            dictionary_dir: PathBuf::from(DEFAULT_DICTIONARY_DIR),
            reference_file: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            counts: CorpusCounts::default(),
            variants: None,
            group_heavy_interval: None,
        }
    }
}

impl GenerationConfig {
    /// The variant allow-list, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown identifier.
    pub fn variant_filter(&self) -> Result<Option<Vec<Variant>>, ConfigError> {
        self.variants
            .as_ref()
            .map(|names| {
                names
                    .iter()
                    .map(|name| {
                        name.parse::<Variant>().map_err(|_| ConfigError::InvalidValue {
                            field: "variants".to_string(),
                            value: name.clone(),
                            expected: format!(
                                "one of {}",
                                Variant::ALL.map(Variant::name).join(", ")
                            ),
                        })
                    })
                    .collect()
            })
            .transpose()
    }

    /// Batch plan derived from the counts and interval.
    #[must_use]
    pub const fn plan(&self) -> BatchPlan {
        BatchPlan {
            counts: self.counts,
            group_heavy_interval: self.group_heavy_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mapping_is_default() {
        let config: GenerationConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, GenerationConfig::default());
        assert_eq!(config.counts.correct, 850);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn test_partial_counts_keep_other_defaults() {
        let config: GenerationConfig = serde_yaml::from_str("counts:\n  garbled: 4\n").unwrap();
        assert_eq!(config.counts.garbled, 4);
        assert_eq!(config.counts.semantic_invalid, 100);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<GenerationConfig, _> = serde_yaml::from_str("output: x\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_variant_filter() {
        let config = GenerationConfig {
            variants: Some(vec!["FIX44".to_string(), "fix50sp2".to_string()]),
            ..GenerationConfig::default()
        };
        assert_eq!(
            config.variant_filter().unwrap(),
            Some(vec![Variant::Fix44, Variant::Fix50Sp2])
        );
        assert_eq!(GenerationConfig::default().variant_filter().unwrap(), None);
    }

    #[test]
    fn test_variant_filter_rejects_unknown() {
        let config = GenerationConfig {
            variants: Some(vec!["FIX99".to_string()]),
            ..GenerationConfig::default()
        };
        let err = config.variant_filter().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref value, .. } if value == "FIX99"));
        assert!(err.to_string().contains("FIX50SP1"));
    }

    #[test]
    fn test_plan() {
        let config = GenerationConfig {
            group_heavy_interval: Some(10),
            ..GenerationConfig::default()
        };
        let plan = config.plan();
        assert_eq!(plan.group_heavy_interval, Some(10));
        assert_eq!(plan.counts, CorpusCounts::default());
    }
}
