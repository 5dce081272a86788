//! `generate` command handler.
//!
//! Resolves the run configuration, acquires reference data once, then
//! generates and writes one corpus per discovered variant. A variant whose
//! dictionary or templates cannot be used is skipped; the run goes on.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::cli::args::GenerateArgs;
use crate::config::{GenerationConfig, load_config};
use crate::corpus::{
    CorpusArtifacts, TemplateSource, dictionary_path, discover_templates, load_templates,
    write_corpus,
};
use crate::dictionary::Dictionary;
use crate::error::{FixCorpusError, GeneratorError};
use crate::generator::{
    BatchPlan, MessageMutator, ValueSynthesizer, Variant, VariantCorpus, generate_variant,
};
use crate::observability::events::{Event, EventEmitter};
use crate::observability::{init_metrics, metrics};
use crate::reference::{
    BuiltinReferenceData, CachedReferenceData, REFERENCE_FILE_NAME, ReferenceData,
    ReferenceDataProvider,
};

use super::write_metrics_snapshot;

/// What a generation run produced.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Variants with a written corpus.
    pub generated: Vec<CorpusArtifacts>,
    /// Skipped variants and the reason.
    pub skipped: Vec<(Variant, String)>,
}

/// Run `generate`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the reference data
/// cannot be acquired, or the template or output directory is unusable.
/// Per-variant failures are reported in [`GenerateReport::skipped`].
pub fn run(args: &GenerateArgs, quiet: bool) -> Result<GenerateReport, FixCorpusError> {
    let started = Instant::now();
    let config = resolve_config(args)?;
    if args.metrics_file.is_some() {
        init_metrics()?;
    }
    let events = EventEmitter::for_path(args.events_file.as_deref())?;

    let reference = acquire_reference(&config)?;
    std::fs::create_dir_all(&config.output_dir)?;
    persist_reference(&reference, &config.output_dir)?;

    let sources = select_sources(discover_templates(&config.templates_dir)?, &config)?;
    if sources.is_empty() {
        warn!(dir = %config.templates_dir.display(), "no template files found");
    }
    events.emit(Event::RunStarted {
        timestamp: Utc::now(),
        variants: sources.iter().map(|s| s.variant.to_string()).collect(),
        output_dir: config.output_dir.display().to_string(),
    });

    let plan = config.plan();
    let mut report = GenerateReport::default();
    for source in &sources {
        let variant = source.variant;
        match generate_source(source, &config, &reference, &plan) {
            Ok((corpus, artifacts)) => {
                record_corpus(&corpus);
                info!(
                    %variant,
                    correct = corpus.correct.len(),
                    semantic_invalid = corpus.semantic_invalid.len(),
                    garbled = corpus.garbled.len(),
                    "variant generated"
                );
                if !quiet {
                    println!(
                        "{variant}: {} correct, {} semantic-invalid, {} garbled -> {}",
                        corpus.correct.len(),
                        corpus.semantic_invalid.len(),
                        corpus.garbled.len(),
                        artifacts.combined.display()
                    );
                }
                events.emit(Event::VariantGenerated {
                    timestamp: Utc::now(),
                    variant: variant.to_string(),
                    correct: corpus.correct.len(),
                    semantic_invalid: corpus.semantic_invalid.len(),
                    garbled: corpus.garbled.len(),
                    combined_file: artifacts.combined.display().to_string(),
                });
                report.generated.push(artifacts);
            }
            Err(e) => {
                warn!(%variant, error = %e, "skipping variant");
                metrics::record_variant_skipped(variant.name());
                events.emit(Event::VariantSkipped {
                    timestamp: Utc::now(),
                    variant: variant.to_string(),
                    reason: e.to_string(),
                });
                report.skipped.push((variant, e.to_string()));
            }
        }
    }

    events.emit(Event::RunCompleted {
        timestamp: Utc::now(),
        generated: report.generated.len(),
        skipped: report.skipped.len(),
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    });
    write_metrics_snapshot(args.metrics_file.as_deref())?;
    Ok(report)
}

/// Loads the configuration file, if any, and applies flag overrides.
///
/// # Errors
///
/// Returns a configuration error if the file cannot be loaded.
pub fn resolve_config(args: &GenerateArgs) -> Result<GenerationConfig, FixCorpusError> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "loading configuration");
            load_config(path)?
        }
        None => GenerationConfig::default(),
    };
    if let Some(dir) = &args.templates_dir {
        config.templates_dir.clone_from(dir);
    }
    if let Some(dir) = &args.dictionary_dir {
        config.dictionary_dir.clone_from(dir);
    }
    if let Some(file) = &args.reference {
        config.reference_file = Some(file.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir.clone_from(dir);
    }
    if let Some(n) = args.num_correct {
        config.counts.correct = n;
    }
    if let Some(n) = args.num_semantic_incorrect {
        config.counts.semantic_invalid = n;
    }
    if let Some(n) = args.num_garbled {
        config.counts.garbled = n;
    }
    if !args.variants.is_empty() {
        config.variants = Some(args.variants.iter().map(ToString::to_string).collect());
    }
    if args.group_heavy_interval.is_some() {
        config.group_heavy_interval = args.group_heavy_interval;
    }
    Ok(config)
}

fn acquire_reference(config: &GenerationConfig) -> Result<ReferenceData, FixCorpusError> {
    let reference = match &config.reference_file {
        Some(path) => {
            info!(path = %path.display(), "loading reference data cache");
            CachedReferenceData::new(path.clone()).fetch()?
        }
        None => {
            info!("using built-in reference data");
            BuiltinReferenceData.fetch()?
        }
    };
    if reference.equities.is_empty() {
        warn!("reference data has no equities, instruments fall back to defaults");
    }
    Ok(reference)
}

/// Writes the bundle used for this run next to the corpora.
fn persist_reference(reference: &ReferenceData, output_dir: &Path) -> Result<(), FixCorpusError> {
    let mut persisted = reference.clone();
    if persisted.generated_at.is_none() {
        persisted.generated_at = Some(Utc::now().to_rfc3339());
    }
    persisted.save(&output_dir.join(REFERENCE_FILE_NAME))?;
    Ok(())
}

fn select_sources(
    sources: Vec<TemplateSource>,
    config: &GenerationConfig,
) -> Result<Vec<TemplateSource>, FixCorpusError> {
    Ok(match config.variant_filter()? {
        Some(allowed) => sources
            .into_iter()
            .filter(|s| allowed.contains(&s.variant))
            .collect(),
        None => sources,
    })
}

fn generate_source(
    source: &TemplateSource,
    config: &GenerationConfig,
    reference: &ReferenceData,
    plan: &BatchPlan,
) -> Result<(VariantCorpus, CorpusArtifacts), FixCorpusError> {
    let variant = source.variant;
    let path = dictionary_path(&config.dictionary_dir, variant);
    if !path.is_file() {
        return Err(GeneratorError::MissingDictionary {
            variant: variant.to_string(),
            path,
        }
        .into());
    }
    let dictionary = Dictionary::load(&path)?;
    let templates = load_templates(&source.path)?;
    let mutator = MessageMutator::new(ValueSynthesizer::new(&dictionary, reference), variant);
    let corpus = generate_variant(&mutator, &templates, plan)?;
    let artifacts = write_corpus(&config.output_dir, &corpus)?;
    Ok((corpus, artifacts))
}

fn record_corpus(corpus: &VariantCorpus) {
    let variant = corpus.variant.name();
    metrics::record_messages(variant, metrics::KIND_CORRECT, corpus.correct.len());
    metrics::record_messages(
        variant,
        metrics::KIND_SEMANTIC_INVALID,
        corpus.semantic_invalid.len(),
    );
    metrics::record_messages(variant, metrics::KIND_GARBLED, corpus.garbled.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const DICTIONARY: &str = r#"<fix major="4" minor="2">
  <messages>
    <message name="Heartbeat" msgtype="0" msgcat="admin">
      <field name="TestReqID" required="N"/>
    </message>
  </messages>
  <fields>
    <field number="112" name="TestReqID" type="STRING"/>
  </fields>
</fix>"#;

    fn workspace() -> (tempfile::TempDir, GenerateArgs) {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        let dictionaries = dir.path().join("dicts");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::create_dir_all(&dictionaries).unwrap();
        std::fs::write(
            templates.join("FIX42.messages"),
            "8=FIX.4.2|35=0|34=1|49=A|56=B|52=X|\n",
        )
        .unwrap();
        std::fs::write(
            templates.join("FIX43.messages"),
            "8=FIX.4.3|35=0|34=1|49=A|56=B|52=X|\n",
        )
        .unwrap();
        std::fs::write(dictionaries.join("FIX42.xml"), DICTIONARY).unwrap();
        let args = GenerateArgs {
            templates_dir: Some(templates),
            dictionary_dir: Some(dictionaries),
            output_dir: Some(dir.path().join("out")),
            num_correct: Some(4),
            num_semantic_incorrect: Some(2),
            num_garbled: Some(3),
            ..GenerateArgs::default()
        };
        (dir, args)
    }

    #[test]
    fn flags_override_defaults() {
        let args = GenerateArgs {
            output_dir: Some(PathBuf::from("elsewhere")),
            num_garbled: Some(7),
            variants: vec![Variant::Fix44],
            ..GenerateArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.counts.garbled, 7);
        assert_eq!(config.counts.correct, 850);
        assert_eq!(config.variants, Some(vec!["FIX44".to_string()]));
    }

    #[test]
    fn missing_dictionary_skips_variant_only() {
        let (dir, args) = workspace();
        let report = run(&args, true).unwrap();
        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, Variant::Fix43);
        assert!(report.skipped[0].1.contains("missing dictionary"));

        let out = dir.path().join("out");
        assert!(out.join("FIX42_realistic_correct_4.messages").is_file());
        assert!(out.join("FIX42_realistic_9.messages").is_file());
        assert!(out.join(REFERENCE_FILE_NAME).is_file());
    }

    #[test]
    fn persisted_reference_is_stamped() {
        let (dir, args) = workspace();
        run(&args, true).unwrap();
        let text = std::fs::read_to_string(dir.path().join("out").join(REFERENCE_FILE_NAME)).unwrap();
        let persisted = ReferenceData::from_json(&text).unwrap();
        assert!(persisted.generated_at.is_some());
        assert!(!persisted.equities.is_empty());
    }

    #[test]
    fn variant_filter_limits_run() {
        let (_dir, mut args) = workspace();
        args.variants = vec![Variant::Fix43];
        let report = run(&args, true).unwrap();
        assert!(report.generated.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn events_are_written() {
        let (dir, mut args) = workspace();
        let events = dir.path().join("events.jsonl");
        args.events_file = Some(events.clone());
        run(&args, true).unwrap();
        let types: Vec<String> = std::fs::read_to_string(&events)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["type"].to_string())
            .collect();
        assert_eq!(
            types,
            vec![
                "\"RunStarted\"",
                "\"VariantGenerated\"",
                "\"VariantSkipped\"",
                "\"RunCompleted\""
            ]
        );
    }
}
