//! In-memory [`CaseStore`] implementation for tests and offline use.
//!
//! Uses `HashMap`/`BTreeMap` behind `std::sync::RwLock`. Ids are assigned
//! from monotonically increasing counters, so cases list in creation order.
//!
//! The store plays the role of the processing pipeline too:
//! [`set_document_annotation`](InMemoryCaseStore::set_document_annotation),
//! [`set_case_summary`](InMemoryCaseStore::set_case_summary), and
//! [`set_document_metadata`](InMemoryCaseStore::set_document_metadata)
//! fill in what the summarizer would produce after an upload.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::{CaseId, CaseListing, CaseMeta, CaseRecord, Document, DocumentId};
use crate::upload::UploadRequest;

use super::CaseStore;

struct StoredCase {
    meta: CaseMeta,
    document_ids: Vec<DocumentId>,
    summary_raw: String,
}

#[derive(Default)]
struct State {
    cases: BTreeMap<CaseId, StoredCase>,
    documents: HashMap<DocumentId, Document>,
    annotations: HashMap<DocumentId, String>,
}

/// Classification metadata reported by the pipeline for one document.
#[derive(Debug, Clone, Default)]
pub struct PipelineMetadata {
    pub page_count: Option<u32>,
    pub doc_type: Option<String>,
    pub provider: Option<String>,
    pub date_str: Option<String>,
}

/// In-memory store for testing and offline rendering.
pub struct InMemoryCaseStore {
    state: RwLock<State>,
    next_case_id: AtomicI64,
    next_document_id: AtomicI64,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            next_case_id: AtomicI64::new(1),
            next_document_id: AtomicI64::new(1),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| anyhow!("case store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| anyhow!("case store lock poisoned"))
    }

    /// Store (or replace) the raw annotation text for a document.
    pub fn set_document_annotation(&self, id: DocumentId, raw: impl Into<String>) -> Result<()> {
        let mut state = self.write()?;
        if !state.documents.contains_key(&id) {
            bail!("document {} not found", id);
        }
        state.annotations.insert(id, raw.into());
        Ok(())
    }

    /// Store (or replace) the raw case-level summary.
    pub fn set_case_summary(&self, id: CaseId, raw: impl Into<String>) -> Result<()> {
        let mut state = self.write()?;
        match state.cases.get_mut(&id) {
            Some(case) => {
                case.summary_raw = raw.into();
                Ok(())
            }
            None => bail!("case {} not found", id),
        }
    }

    /// Fill in classification metadata. Each field is write-once: values
    /// already set on the document are kept.
    pub fn set_document_metadata(&self, id: DocumentId, metadata: PipelineMetadata) -> Result<()> {
        let mut state = self.write()?;
        let Some(doc) = state.documents.get_mut(&id) else {
            bail!("document {} not found", id);
        };
        if doc.page_count.is_none() {
            doc.page_count = metadata.page_count;
        }
        if doc.doc_type.is_none() {
            doc.doc_type = metadata.doc_type;
        }
        if doc.provider.is_none() {
            doc.provider = metadata.provider;
        }
        if doc.date_str.is_none() {
            doc.date_str = metadata.date_str;
        }
        Ok(())
    }

    fn insert_documents(&self, state: &mut State, case_id: CaseId, request: &UploadRequest) {
        for file in &request.files {
            let id = DocumentId(self.next_document_id.fetch_add(1, Ordering::SeqCst));
            let mut doc = Document::new(id, file.name.clone());
            doc.slug = Some(slugify(&file.name));
            state.documents.insert(id, doc);
            if let Some(case) = state.cases.get_mut(&case_id) {
                case.document_ids.push(id);
            }
        }
    }
}

impl Default for InMemoryCaseStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase ASCII alphanumerics joined by single dashes, at most 60 chars.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    slug.chars().take(60).collect()
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn list_cases(&self) -> Result<Vec<CaseListing>> {
        let state = self.read()?;
        Ok(state
            .cases
            .values()
            .map(|c| CaseListing {
                id: c.meta.id,
                name: c.meta.name.clone(),
                created_at: c.meta.created_at.clone(),
                document_count: c.document_ids.len(),
            })
            .collect())
    }

    async fn get_case(&self, id: CaseId) -> Result<Option<CaseRecord>> {
        let state = self.read()?;
        let Some(case) = state.cases.get(&id) else {
            return Ok(None);
        };

        let documents: Vec<Document> = case
            .document_ids
            .iter()
            .filter_map(|doc_id| state.documents.get(doc_id).cloned())
            .collect();
        let annotations_by_doc_id = case
            .document_ids
            .iter()
            .filter_map(|doc_id| {
                state
                    .annotations
                    .get(doc_id)
                    .map(|raw| (*doc_id, raw.clone()))
            })
            .collect();

        Ok(Some(CaseRecord {
            meta: case.meta.clone(),
            documents,
            annotations_by_doc_id,
            case_summary_raw: case.summary_raw.clone(),
        }))
    }

    async fn upload(&self, request: &UploadRequest) -> Result<CaseId> {
        let mut state = self.write()?;
        let case_id = match request.target {
            Some(id) => {
                if !state.cases.contains_key(&id) {
                    bail!("case {} not found", id);
                }
                id
            }
            None => {
                if request.case_name.trim().is_empty() {
                    bail!("case name is required for a new case");
                }
                let id = CaseId(self.next_case_id.fetch_add(1, Ordering::SeqCst));
                state.cases.insert(
                    id,
                    StoredCase {
                        meta: CaseMeta {
                            id,
                            name: request.case_name.clone(),
                            created_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                        },
                        document_ids: Vec::new(),
                        summary_raw: String::new(),
                    },
                );
                id
            }
        };
        self.insert_documents(&mut state, case_id, request);
        Ok(case_id)
    }

    async fn rename_case(&self, id: CaseId, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("case name must not be empty");
        }
        let mut state = self.write()?;
        match state.cases.get_mut(&id) {
            Some(case) => {
                case.meta.name = name.to_string();
                Ok(())
            }
            None => bail!("case {} not found", id),
        }
    }

    async fn delete_case(&self, id: CaseId) -> Result<()> {
        let mut state = self.write()?;
        let Some(case) = state.cases.remove(&id) else {
            bail!("case {} not found", id);
        };
        for doc_id in &case.document_ids {
            state.documents.remove(doc_id);
            state.annotations.remove(doc_id);
        }
        Ok(())
    }
}
