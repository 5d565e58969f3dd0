//! Annotation parser.
//!
//! Turns the tagged text produced by the upstream summarization step into
//! a [`ParsedAnnotation`]. The text is untrusted: tags may be missing,
//! duplicated, or wrap malformed JSON, and every one of those cases
//! degrades to empty output instead of an error.
//!
//! # Format
//!
//! ```text
//! ... free text ...
//! <CASE_SUMMARY>
//! - statement one
//! - statement two
//! </CASE_SUMMARY>
//! <FACTS_JSON>
//! [{"date_of_visit": "2023-01-01", "provider": "Dr. X", "diagnoses": ["..."]}]
//! </FACTS_JSON>
//! ```
//!
//! # Rules
//!
//! - Tags are matched case-insensitively and may span lines.
//! - Matching is a lexical scan, not a parser: the first *non-greedy*
//!   open/close pair of each tag wins and any later occurrence of the same
//!   tag is ignored.
//! - The two tags are independent; text outside them is ignored.
//!
//! # Example
//!
//! ```rust
//! use caselens_core::annotation::ParsedAnnotation;
//!
//! let parsed = ParsedAnnotation::parse(
//!     "<CASE_SUMMARY>\n- Patient stable\n- Follow-up required\n</CASE_SUMMARY>",
//! );
//! assert_eq!(parsed.summary, vec!["Patient stable", "Follow-up required"]);
//! assert!(parsed.facts.is_empty());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

static SUMMARY_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<CASE_SUMMARY>(.*?)</CASE_SUMMARY>").unwrap());

static FACTS_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<FACTS_JSON>(.*?)</FACTS_JSON>").unwrap());

/// Structured form of one raw annotation.
///
/// A pure function of the raw text: parsing the same input twice yields
/// equal values, and nothing here is mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedAnnotation {
    /// Summary statements in source order, bullets stripped.
    pub summary: Vec<String>,
    /// Fact records in source order. Elements are normally JSON objects,
    /// but non-object list elements are passed through untouched.
    pub facts: Vec<Value>,
}

impl ParsedAnnotation {
    /// Parse raw annotation text. Shorthand for [`parse_annotation`].
    pub fn parse(raw: &str) -> Self {
        parse_annotation(Some(raw))
    }

    /// True when neither a summary nor any fact was recovered.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.facts.is_empty()
    }

    /// Record views over the facts that are JSON objects.
    pub fn fact_records(&self) -> impl Iterator<Item = FactRecord<'_>> {
        self.facts.iter().filter_map(FactRecord::from_value)
    }
}

/// Parse raw annotation text into summary statements and fact records.
///
/// `None` and the empty string both mean "no annotation yet" and produce
/// an empty [`ParsedAnnotation`]; callers should render that as pending,
/// not as a failure.
pub fn parse_annotation(raw: Option<&str>) -> ParsedAnnotation {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return ParsedAnnotation::default(),
    };

    ParsedAnnotation {
        summary: extract_summary(raw),
        facts: FactsPayload::extract(raw).into_facts(),
    }
}

fn extract_summary(raw: &str) -> Vec<String> {
    let Some(caps) = SUMMARY_BLOCK.captures(raw) else {
        return Vec::new();
    };
    caps[1]
        .lines()
        .map(|line| strip_bullet(line).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove one leading `-` or `*` marker when it is followed by whitespace
/// (or ends the line).
fn strip_bullet(line: &str) -> &str {
    let line = line.trim_start();
    match line.strip_prefix('-').or_else(|| line.strip_prefix('*')) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest,
        _ => line,
    }
}

/// Decoded contents of a `FACTS_JSON` block, before normalization.
///
/// Each variant maps to exactly one normalization rule in
/// [`FactsPayload::into_facts`].
#[derive(Debug, Clone, PartialEq)]
pub enum FactsPayload {
    /// No `FACTS_JSON` block in the text.
    Missing,
    /// A JSON array; every element becomes one fact.
    List(Vec<Value>),
    /// A single JSON object; becomes a one-element list.
    Record(Map<String, Value>),
    /// A string, number, or boolean; dropped.
    Scalar(Value),
    /// JSON `null`; dropped.
    Null,
    /// The block body is not valid JSON. Carries the decoder message.
    Malformed(String),
}

impl FactsPayload {
    /// Locate the first `FACTS_JSON` block in `raw` and decode it.
    pub fn extract(raw: &str) -> Self {
        match FACTS_BLOCK.captures(raw) {
            Some(caps) => Self::decode(&caps[1]),
            None => FactsPayload::Missing,
        }
    }

    /// Decode a block body.
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(Value::Array(items)) => FactsPayload::List(items),
            Ok(Value::Object(record)) => FactsPayload::Record(record),
            Ok(Value::Null) => FactsPayload::Null,
            Ok(scalar) => FactsPayload::Scalar(scalar),
            Err(e) => FactsPayload::Malformed(e.to_string()),
        }
    }

    /// Normalize to the ordered fact list.
    pub fn into_facts(self) -> Vec<Value> {
        match self {
            FactsPayload::List(items) => items,
            FactsPayload::Record(record) => vec![Value::Object(record)],
            FactsPayload::Malformed(reason) => {
                debug!(%reason, "discarding malformed FACTS_JSON block");
                Vec::new()
            }
            FactsPayload::Missing | FactsPayload::Scalar(_) | FactsPayload::Null => Vec::new(),
        }
    }
}

/// Read-only view over one fact that is a JSON object.
///
/// Gives typed access to the fields the summarizer is asked to emit
/// (`date_of_visit`, `provider`, `doc_type`, `diagnoses`, `treatments`)
/// without assuming any of them are present or well-typed.
#[derive(Debug, Clone, Copy)]
pub struct FactRecord<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> FactRecord<'a> {
    /// `None` for facts that are not JSON objects.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(|fields| FactRecord { fields })
    }

    /// A string field, ignoring `null` and non-string values.
    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// A list-of-strings field. A bare string counts as a one-element
    /// list; non-string elements are skipped.
    pub fn list(&self, key: &str) -> Vec<&'a str> {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn date_of_visit(&self) -> Option<&'a str> {
        self.text("date_of_visit")
    }

    pub fn provider(&self) -> Option<&'a str> {
        self.text("provider")
    }

    pub fn doc_type(&self) -> Option<&'a str> {
        self.text("doc_type")
    }

    pub fn diagnoses(&self) -> Vec<&'a str> {
        self.list("diagnoses")
    }

    pub fn treatments(&self) -> Vec<&'a str> {
        self.list("treatments")
    }

    /// All fields, in the map's iteration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
