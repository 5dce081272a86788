//! Configuration loading.
//!
//! Pipeline: size check, read, BOM strip, environment substitution, YAML
//! parse, variant validation.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::error::ConfigError;

use super::schema::GenerationConfig;

/// Environment variable overriding [`DEFAULT_MAX_CONFIG_SIZE`].
pub const MAX_CONFIG_SIZE_VAR: &str = "FIXCORPUS_MAX_CONFIG_SIZE";

/// Largest configuration file accepted by default (1 MiB).
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// `${VAR}` or `${VAR:-default}`.
static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid regex")
});

/// Loads and validates a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::MissingFile`] if the file cannot be read,
/// [`ConfigError::InvalidValue`] if it is too large or names an unknown
/// variant, and [`ConfigError::ParseError`] if it is empty or not valid
/// YAML for [`GenerationConfig`].
pub fn load_config(path: &Path) -> Result<GenerationConfig, ConfigError> {
    let max_size = env_or(MAX_CONFIG_SIZE_VAR, DEFAULT_MAX_CONFIG_SIZE);
    let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
        path: path.to_path_buf(),
    })?;
    let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if file_size > max_size {
        return Err(ConfigError::InvalidValue {
            field: "file_size".to_string(),
            value: format!("{file_size} bytes"),
            expected: format!("at most {max_size} bytes"),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
        path: path.to_path_buf(),
    })?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    let config = parse_config(&substitute_env(raw), path)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parses configuration text; `path` is used in error messages only.
///
/// # Errors
///
/// See [`load_config`].
pub fn parse_config(text: &str, path: &Path) -> Result<GenerationConfig, ConfigError> {
    if text.trim().is_empty() {
        return Err(ConfigError::ParseError {
            path: path.to_path_buf(),
            message: "Configuration file is empty".to_string(),
        });
    }
    let config: GenerationConfig = serde_yaml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.variant_filter()?;
    Ok(config)
}

/// Expands `${VAR}` and `${VAR:-default}` references.
///
/// An unset variable without a default expands to the empty string.
#[must_use]
pub fn substitute_env(text: &str) -> String {
    ENV_REFERENCE
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            match (std::env::var(name), caps.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(default)) => default.as_str().to_string(),
                (Err(_), None) => {
                    warn!(var = name, "environment variable not set, using empty string");
                    String::new()
                }
            }
        })
        .into_owned()
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(
            &path,
            "\u{feff}templates_dir: t\noutput_dir: out\ncounts:\n  correct: 10\nvariants: [FIX44]\ngroup_heavy_interval: 5\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.templates_dir, PathBuf::from("t"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.counts.correct, 10);
        assert_eq!(config.counts.garbled, 50);
        assert_eq!(config.group_heavy_interval, Some(5));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/run.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_empty_file() {
        let err = parse_config("  \n", Path::new("run.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_bad_yaml() {
        let err = parse_config("counts: [", Path::new("run.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_unknown_variant() {
        let err = parse_config("variants: [FIX44, FIX99]\n", Path::new("run.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "variants"));
    }

    #[test]
    fn test_env_substitution_default() {
        let out = substitute_env("output_dir: ${FIXCORPUS_TEST_SURELY_UNSET:-fallback/dir}");
        assert_eq!(out, "output_dir: fallback/dir");
    }

    #[test]
    fn test_env_substitution_set_variable() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(substitute_env("${PATH:-x}"), path);
    }

    #[test]
    fn test_env_substitution_unset_is_empty() {
        assert_eq!(substitute_env("a${FIXCORPUS_TEST_SURELY_UNSET}b"), "ab");
    }

    #[test]
    fn test_env_substitution_leaves_plain_dollars() {
        assert_eq!(substitute_env("cost: $5 ${ not a ref"), "cost: $5 ${ not a ref");
    }

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("FIXCORPUS_TEST_SURELY_UNSET", 7_usize), 7);
    }
}
