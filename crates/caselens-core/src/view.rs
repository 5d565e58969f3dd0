//! Display-ready projection of a case, and its JSON export shape.

use serde::Serialize;

use crate::annotation::ParsedAnnotation;
use crate::models::{CaseMeta, CaseRecord, DocumentId};
use crate::timeline::{build_timeline_with, TimelineEntry, TimelineOptions};

/// State of the case-level summary panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum SummaryState {
    /// No summary text yet; summarization is still running.
    Pending,
    /// Tagged text that yielded summary statements and/or facts.
    Parsed(ParsedAnnotation),
    /// Text without any recognizable tagged content, shown as-is.
    Unstructured(String),
}

impl SummaryState {
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return SummaryState::Pending;
        }
        let parsed = ParsedAnnotation::parse(raw);
        if parsed.is_empty() {
            SummaryState::Unstructured(trimmed.to_string())
        } else {
            SummaryState::Parsed(parsed)
        }
    }
}

/// Everything needed to render one case page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseView {
    pub meta: CaseMeta,
    pub summary: SummaryState,
    pub timeline: Vec<TimelineEntry>,
}

impl CaseView {
    pub fn build(record: &CaseRecord, options: &TimelineOptions) -> Self {
        Self {
            meta: record.meta.clone(),
            summary: SummaryState::from_raw(&record.case_summary_raw),
            timeline: build_timeline_with(
                &record.documents,
                &record.annotations_by_doc_id,
                options,
            ),
        }
    }

    pub fn document_count(&self) -> usize {
        self.timeline.iter().map(|e| e.documents.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseExport {
    pub case: CaseMeta,
    pub docs: Vec<ExportDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub id: DocumentId,
    pub filename: String,
    pub date: Option<String>,
    pub provider: Option<String>,
    pub doc_type: Option<String>,
}

impl CaseExport {
    /// Documents are exported in store order, without annotations.
    pub fn from_record(record: &CaseRecord) -> Self {
        Self {
            case: record.meta.clone(),
            docs: record
                .documents
                .iter()
                .map(|d| ExportDocument {
                    id: d.id,
                    filename: d.filename.clone(),
                    date: d.date_str.clone(),
                    provider: d.provider.clone(),
                    doc_type: d.doc_type.clone(),
                })
                .collect(),
        }
    }
}
