//! `fixcorpus` - Dictionary-driven FIX test corpus synthesizer
//!
//! Turns template messages and a FIX dictionary into compliant,
//! semantically invalid and garbled message corpora for exercising FIX
//! parsers and validators.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod generator;
pub mod observability;
pub mod reference;
pub mod verify;
pub mod wire;
