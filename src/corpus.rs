//! Template pools and corpus artifacts.
//!
//! Templates live in `FIX*.messages` files, one wire message per line,
//! where the file stem names the variant. Generated corpora are written as
//! one file per message kind plus a combined file, all newline-terminated.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::FixCorpusError;
use crate::generator::{Variant, VariantCorpus};
use crate::wire::FieldSequence;

/// Extension of template and corpus files.
pub const MESSAGES_EXTENSION: &str = "messages";

/// Extension of dictionary files.
pub const DICTIONARY_EXTENSION: &str = "xml";

const TEMPLATE_PREFIX: &str = "FIX";
const COMMENT_PREFIX: char = '#';

/// A template file and the variant it seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    /// Variant named by the file stem.
    pub variant: Variant,
    /// Path to the file.
    pub path: PathBuf,
}

/// Finds `FIX*.messages` files in `dir`, sorted by variant.
///
/// Files whose stem is not a known variant are skipped with a warning.
///
/// # Errors
///
/// Returns an I/O error if `dir` cannot be listed.
pub fn discover_templates(dir: &Path) -> Result<Vec<TemplateSource>, FixCorpusError> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(MESSAGES_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !stem.starts_with(TEMPLATE_PREFIX) {
            continue;
        }
        match stem.parse::<Variant>() {
            Ok(variant) => sources.push(TemplateSource { variant, path }),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping template file"),
        }
    }
    sources.sort_by_key(|s| s.variant);
    Ok(sources)
}

/// Parses template text. Blank lines, `#` comments and lines without a
/// single `tag=value` token are ignored.
#[must_use]
pub fn parse_templates(text: &str) -> Vec<FieldSequence> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_PREFIX))
        .map(FieldSequence::parse)
        .filter(|fields| !fields.is_empty())
        .collect()
}

/// Reads and parses a template file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn load_templates(path: &Path) -> Result<Vec<FieldSequence>, FixCorpusError> {
    let text = fs::read_to_string(path)?;
    let templates = parse_templates(&text);
    debug!(path = %path.display(), count = templates.len(), "templates loaded");
    Ok(templates)
}

/// Dictionary path for `variant` under `dir`.
#[must_use]
pub fn dictionary_path(dir: &Path, variant: Variant) -> PathBuf {
    dir.join(format!("{variant}.{DICTIONARY_EXTENSION}"))
}

/// Paths of the files written for one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusArtifacts {
    /// Compliant messages.
    pub correct: PathBuf,
    /// Semantically invalid messages.
    pub semantic_invalid: PathBuf,
    /// Garbled messages.
    pub garbled: PathBuf,
    /// All messages.
    pub combined: PathBuf,
}

impl CorpusArtifacts {
    /// File names for `variant` with the given per-kind sizes, under `dir`.
    #[must_use]
    pub fn for_variant(dir: &Path, corpus: &VariantCorpus) -> Self {
        let v = corpus.variant;
        let file = |label: &str, n: usize| dir.join(format!("{v}_realistic_{label}{n}.{MESSAGES_EXTENSION}"));
        Self {
            correct: file("correct_", corpus.correct.len()),
            semantic_invalid: file("semantic_incorrect_", corpus.semantic_invalid.len()),
            garbled: file("garbled_", corpus.garbled.len()),
            combined: file("", corpus.total()),
        }
    }
}

/// Writes the four corpus files for one variant, creating `dir` if needed.
///
/// # Errors
///
/// Returns an I/O error if a file cannot be written.
pub fn write_corpus(dir: &Path, corpus: &VariantCorpus) -> Result<CorpusArtifacts, FixCorpusError> {
    fs::create_dir_all(dir)?;
    let artifacts = CorpusArtifacts::for_variant(dir, corpus);
    write_lines(&artifacts.correct, corpus.correct.iter().map(String::as_str))?;
    write_lines(
        &artifacts.semantic_invalid,
        corpus.semantic_invalid.iter().map(String::as_str),
    )?;
    write_lines(&artifacts.garbled, corpus.garbled.iter().map(String::as_str))?;
    write_lines(&artifacts.combined, corpus.combined())?;
    debug!(variant = %corpus.variant, dir = %dir.display(), "corpus written");
    Ok(artifacts)
}

/// Reads a corpus file back, one message per non-empty line.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn read_corpus(path: &Path) -> Result<Vec<String>, FixCorpusError> {
    Ok(fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a str>) -> Result<(), FixCorpusError> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for line in lines {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> VariantCorpus {
        VariantCorpus {
            variant: Variant::Fix44,
            correct: vec!["8=FIX.4.4|35=0|".to_string(), "8=FIX.4.4|35=1|".to_string()],
            semantic_invalid: vec!["8=FIX.4.4|35=ZZ|".to_string()],
            defects: vec![],
            garbled: vec!["X=FIX.4.4|35=0|".to_string()],
        }
    }

    #[test]
    fn parse_templates_skips_blank_and_comments() {
        let text = "# header\n\n8=FIX.4.4|35=0|\n   \n#8=FIX.4.4|35=1|\ngarbage\n8=FIX.4.4|35=A|98=0|\n";
        let templates = parse_templates(text);
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[1].first_value("35"), Some("A"));
    }

    #[test]
    fn discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "FIX50SP2.messages",
            "FIX42.messages",
            "FIX99.messages",
            "notes.messages",
            "FIX44.txt",
        ] {
            fs::write(dir.path().join(name), "8=FIX.4.2|35=0|\n").unwrap();
        }
        let found: Vec<_> = discover_templates(dir.path())
            .unwrap()
            .into_iter()
            .map(|s| s.variant)
            .collect();
        assert_eq!(found, vec![Variant::Fix42, Variant::Fix50Sp2]);
    }

    #[test]
    fn discover_missing_dir_is_io_error() {
        let err = discover_templates(Path::new("/nonexistent/templates")).unwrap_err();
        assert!(matches!(err, FixCorpusError::Io(_)));
    }

    #[test]
    fn dictionary_path_uses_variant_name() {
        assert_eq!(
            dictionary_path(Path::new("dicts"), Variant::Fix50Sp1),
            PathBuf::from("dicts/FIX50SP1.xml")
        );
    }

    #[test]
    fn artifact_names() {
        let artifacts = CorpusArtifacts::for_variant(Path::new("out"), &corpus());
        assert_eq!(artifacts.correct, PathBuf::from("out/FIX44_realistic_correct_2.messages"));
        assert_eq!(
            artifacts.semantic_invalid,
            PathBuf::from("out/FIX44_realistic_semantic_incorrect_1.messages")
        );
        assert_eq!(artifacts.garbled, PathBuf::from("out/FIX44_realistic_garbled_1.messages"));
        assert_eq!(artifacts.combined, PathBuf::from("out/FIX44_realistic_4.messages"));
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let artifacts = write_corpus(&out, &corpus()).unwrap();

        let combined = fs::read_to_string(&artifacts.combined).unwrap();
        assert!(combined.ends_with('\n'));
        assert_eq!(combined.lines().count(), 4);
        assert_eq!(read_corpus(&artifacts.correct).unwrap(), corpus().correct);
        assert_eq!(
            read_corpus(&artifacts.garbled).unwrap(),
            vec!["X=FIX.4.4|35=0|".to_string()]
        );
    }
}
