//! Case and document data models.
//!
//! Field names on the wire follow the backend service's JSON shapes
//! (`docs`, `highlightsRaw`, `caseSummaryRaw`, `doc_count`), so these types
//! deserialize directly from its responses.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a case, assigned by the backend store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub i64);

/// Identifier of a document, assigned by the backend store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CaseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(CaseId)
    }
}

impl FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(DocumentId)
    }
}

/// One uploaded and processed file.
///
/// `doc_type`, `provider`, and `date_str` are filled in by the processing
/// pipeline after upload and may be absent for a while (or forever).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Original file name. Display only, not unique.
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    /// Document date as produced upstream, normally `YYYY-MM-DD`.
    #[serde(default)]
    pub date_str: Option<String>,
}

impl Document {
    pub fn new(id: DocumentId, filename: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            slug: None,
            page_count: None,
            doc_type: None,
            provider: None,
            date_str: None,
        }
    }

    /// Page count, or `None` when unknown. The backend reports `0` for
    /// documents it has not counted.
    pub fn page_count(&self) -> Option<u32> {
        self.page_count.filter(|n| *n > 0)
    }

    /// The date string, treating an empty value as absent.
    pub fn date(&self) -> Option<&str> {
        self.date_str.as_deref().filter(|d| !d.is_empty())
    }
}

/// Case header as returned with a case query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMeta {
    pub id: CaseId,
    pub name: String,
    pub created_at: String,
}

/// One row of the case list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseListing {
    pub id: CaseId,
    pub name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(rename = "doc_count", default)]
    pub document_count: usize,
}

/// Full result of the case/document query: header, documents in insertion
/// order, raw per-document annotations, and the raw case-level summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub meta: CaseMeta,
    #[serde(rename = "docs")]
    pub documents: Vec<Document>,
    #[serde(rename = "highlightsRaw", default)]
    pub annotations_by_doc_id: HashMap<DocumentId, String>,
    #[serde(rename = "caseSummaryRaw", default)]
    pub case_summary_raw: String,
}
