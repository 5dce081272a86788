//! Shared integration-test helpers: running the `fixcorpus` binary,
//! locating fixtures, and a strict tokenizer with the framing rules a
//! downstream FIX parser applies.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use fixcorpus::dictionary::Dictionary;

/// Runs the binary with `args` and waits for it.
#[allow(clippy::missing_panics_doc)]
pub fn fixcorpus(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fixcorpus"))
        .args(args)
        .env_remove("FIXCORPUS_LOG_LEVEL")
        .env_remove("FIXCORPUS_CONFIG")
        .output()
        .expect("failed to spawn fixcorpus")
}

/// Path under `tests/fixtures`.
pub fn fixture(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

/// Loads a fixture dictionary.
#[allow(clippy::missing_panics_doc)]
pub fn dictionary(name: &str) -> Dictionary {
    Dictionary::load(&fixture(&format!("dictionaries/{name}.xml"))).expect("fixture dictionary")
}

/// Tokenizes like a strict parser: `|` stands for SOH, empty tokens are
/// skipped, every token needs `=` and a positive numeric tag, and the
/// message needs tags 8 and 35.
pub fn strict_parse(message: &str) -> Result<Vec<(u32, String)>, String> {
    let normalized = message.replace('|', "\u{1}");
    let mut fields = Vec::new();
    for (i, token) in normalized.split('\u{1}').filter(|t| !t.is_empty()).enumerate() {
        let Some((tag, value)) = token.split_once('=') else {
            return Err(format!("Token {} is malformed: missing '=' delimiter.", i + 1));
        };
        if tag.is_empty() {
            return Err(format!("Token {} has an empty tag.", i + 1));
        }
        let tag: u32 = tag
            .parse()
            .map_err(|_| format!("Token {} has a non-numeric tag.", i + 1))?;
        if tag == 0 {
            return Err(format!("Token {} has a non-positive tag.", i + 1));
        }
        fields.push((tag, value.to_string()));
    }
    if fields.is_empty() {
        return Err("Message contains no fields.".to_string());
    }
    if !fields.iter().any(|(t, _)| *t == 8) {
        return Err("Missing required FIX BeginString field (tag 8).".to_string());
    }
    if !fields.iter().any(|(t, _)| *t == 35) {
        return Err("Missing required FIX MsgType field (tag 35).".to_string());
    }
    Ok(fields)
}

/// First value of `tag`.
pub fn value_of(fields: &[(u32, String)], tag: u32) -> Option<&str> {
    fields.iter().find(|(t, _)| *t == tag).map(|(_, v)| v.as_str())
}

/// Position of the first `tag`.
pub fn position_of(fields: &[(u32, String)], tag: u32) -> Option<usize> {
    fields.iter().position(|(t, _)| *t == tag)
}
