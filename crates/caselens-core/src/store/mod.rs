//! Case storage abstraction.
//!
//! The [`CaseStore`] trait is the boundary to the service that owns cases
//! and documents, runs the processing pipeline, and produces annotations.
//! caselens never persists anything itself; it reads snapshots through this
//! trait and hands upload batches to it.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CaseId, CaseListing, CaseRecord};
use crate::upload::UploadRequest;

/// Abstract case backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_cases`](CaseStore::list_cases) | All known cases with document counts |
/// | [`get_case`](CaseStore::get_case) | One case with documents and raw annotations |
/// | [`upload`](CaseStore::upload) | Create a case from a batch, or append a batch to one |
/// | [`rename_case`](CaseStore::rename_case) | Change a case's display name |
/// | [`delete_case`](CaseStore::delete_case) | Destroy a case and all of its documents |
///
/// Error messages are treated as opaque text by callers.
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn list_cases(&self) -> Result<Vec<CaseListing>>;

    /// Returns `None` when no case has this id.
    async fn get_case(&self, id: CaseId) -> Result<Option<CaseRecord>>;

    /// Submit one batch. Returns the id of the created case, or of
    /// `request.target` when appending.
    async fn upload(&self, request: &UploadRequest) -> Result<CaseId>;

    async fn rename_case(&self, id: CaseId, name: &str) -> Result<()>;

    /// Irreversible.
    async fn delete_case(&self, id: CaseId) -> Result<()>;
}
