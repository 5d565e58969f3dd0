//! Chronological grouping of a case's documents.
//!
//! [`build_timeline`] buckets documents by their `date_str`, orders the
//! buckets, and attaches each document's parsed annotation.
//!
//! # Ordering
//!
//! Bucket keys are compared as **plain strings**, not as dates. ISO
//! `YYYY-MM-DD` values therefore sort chronologically, while anything else
//! the pipeline emits (`03/04/2023`, `2023-3-4`) sorts by its characters.
//!
//! Documents without a date share one bucket keyed by
//! [`TimelineOptions::undated_label`]. With
//! [`UndatedPlacement::Lexicographic`] that label takes part in the string
//! sort like any other key, so the default `"Undated"` lands after every
//! digit-leading date. [`UndatedPlacement::Last`] always moves it to the end.
//! A document whose `date_str` is literally the undated label joins the
//! undated bucket.
//!
//! Within a bucket, documents keep the relative order they were given in.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::annotation::{parse_annotation, ParsedAnnotation};
use crate::models::{Document, DocumentId};

pub const DEFAULT_UNDATED_LABEL: &str = "Undated";

/// Where the undated bucket goes relative to dated buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndatedPlacement {
    /// Sort the undated label as an ordinary string key.
    #[default]
    Lexicographic,
    /// Always place the undated bucket after all dated buckets.
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineOptions {
    pub undated_label: String,
    pub undated_placement: UndatedPlacement,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            undated_label: DEFAULT_UNDATED_LABEL.to_string(),
            undated_placement: UndatedPlacement::default(),
        }
    }
}

/// One document with its parsed annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineDocument {
    pub document: Document,
    pub annotation: ParsedAnnotation,
}

/// One date bucket of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    /// The date string, or the undated label.
    pub label: String,
    pub undated: bool,
    pub documents: Vec<TimelineDocument>,
}

/// Build the timeline with [`TimelineOptions::default`].
pub fn build_timeline(
    documents: &[Document],
    annotations_by_doc_id: &HashMap<DocumentId, String>,
) -> Vec<TimelineEntry> {
    build_timeline_with(documents, annotations_by_doc_id, &TimelineOptions::default())
}

/// Group `documents` by date and attach parsed annotations.
///
/// A document whose id has no entry in `annotations_by_doc_id` gets an
/// empty annotation. Documents sharing an id are all kept.
pub fn build_timeline_with(
    documents: &[Document],
    annotations_by_doc_id: &HashMap<DocumentId, String>,
    options: &TimelineOptions,
) -> Vec<TimelineEntry> {
    let mut buckets: BTreeMap<&str, Vec<TimelineDocument>> = BTreeMap::new();

    for doc in documents {
        let key = doc.date().unwrap_or(options.undated_label.as_str());
        let annotation =
            parse_annotation(annotations_by_doc_id.get(&doc.id).map(String::as_str));
        buckets.entry(key).or_default().push(TimelineDocument {
            document: doc.clone(),
            annotation,
        });
    }

    let mut undated_entry = None;
    let mut entries = Vec::with_capacity(buckets.len());
    for (label, docs) in buckets {
        let undated = label == options.undated_label;
        let entry = TimelineEntry {
            label: label.to_string(),
            undated,
            documents: docs,
        };
        if undated && options.undated_placement == UndatedPlacement::Last {
            undated_entry = Some(entry);
        } else {
            entries.push(entry);
        }
    }
    entries.extend(undated_entry);

    entries
}
