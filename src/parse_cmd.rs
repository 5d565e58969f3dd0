//! `caselens parse`: run the annotation parser offline.
//!
//! Reads raw annotation text from a file, or from stdin when no path is
//! given, and prints the parsed summary and facts as JSON. Useful for
//! checking what the summarizer produced without a running backend.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use caselens_core::annotation::ParsedAnnotation;

pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read annotation from stdin")?;
            Ok(raw)
        }
    }
}

pub fn run_parse(path: Option<&Path>) -> Result<()> {
    let raw = read_input(path)?;
    let parsed = ParsedAnnotation::parse(&raw);
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
