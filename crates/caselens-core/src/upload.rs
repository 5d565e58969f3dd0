//! Upload session state machine.
//!
//! An [`UploadSession`] tracks one batch of files on its way into a case,
//! either as a brand-new case or appended to an existing one.
//!
//! ```text
//!            begin_submit (files non-empty)
//!   Idle ─────────────────────────────────▶ Submitting
//!    ▲                                         │ resolve(Ok(id))  resolve(Err(msg))
//!    │ reset / retry                           ▼                  ▼
//!    └─────────────────────────────── Succeeded            Failed
//! ```
//!
//! The batch is all-or-nothing: one external upload call governs every
//! file, so per-file statuses move together (`Processing` on submit, then
//! all `Succeeded` or all `Failed`).
//!
//! Files and the target case can only change while `Idle`. Mutation in
//! any other phase is rejected with [`UploadError::NotIdle`] and leaves the
//! session untouched.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::models::CaseId;
use crate::store::CaseStore;

/// One file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub size: u64,
    pub bytes: Arc<[u8]>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// De-duplication key.
    pub fn key(&self) -> FileKey {
        FileKey {
            name: self.name.clone(),
            size: self.size,
        }
    }

    fn matches(&self, key: &FileKey) -> bool {
        self.name == key.name && self.size == key.size
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Identity of a file within a session. Two files with the same name and
/// byte size are the same logical file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileKey {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadPhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Submitting => "submitting",
            UploadPhase::Succeeded => "succeeded",
            UploadPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ready,
    Processing,
    Succeeded,
    Failed,
}

impl FileStatus {
    /// Short human label.
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Ready => "Ready",
            FileStatus::Processing => "Processing...",
            FileStatus::Succeeded => "Processed",
            FileStatus::Failed => "Failed",
        }
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum UploadOutcome {
    /// The batch landed in this case (new or appended).
    Case { case_id: CaseId },
    /// The batch failed as a whole. The message is whatever the upload
    /// collaborator reported, unmodified.
    Failure { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("upload session is {phase}; files and target can only change while idle")]
    NotIdle { phase: UploadPhase },
    #[error("an upload is in flight and cannot be abandoned")]
    InFlight,
}

/// Which files a session accepts, by extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Lowercase extensions without the dot. Empty accepts every file.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["pdf".to_string()],
        }
    }
}

impl UploadPolicy {
    /// Accept every file regardless of extension.
    pub fn any() -> Self {
        Self {
            allowed_extensions: Vec::new(),
        }
    }

    pub fn accepts(&self, name: &str) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        let Some((_, ext)) = name.rsplit_once('.') else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// What [`UploadSession::add_files`] did with its input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddFilesReport {
    /// New entries appended to the session.
    pub added: usize,
    /// Inputs that matched an existing entry and replaced it in place.
    pub replaced: usize,
    /// Names of files refused by the [`UploadPolicy`].
    pub rejected: Vec<String>,
}

/// Everything the upload collaborator needs for one batch.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Name for a new case. Empty when appending to `target`.
    pub case_name: String,
    pub files: Vec<UploadFile>,
    pub target: Option<CaseId>,
}

#[derive(Debug, Clone)]
struct SessionFile {
    file: UploadFile,
    status: FileStatus,
}

/// One batch submission, from file selection to its terminal outcome.
///
/// A session is owned by a single caller; it is `Send` but holds no locks.
#[derive(Debug, Clone)]
pub struct UploadSession {
    policy: UploadPolicy,
    phase: UploadPhase,
    files: Vec<SessionFile>,
    target: Option<CaseId>,
    outcome: Option<UploadOutcome>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    /// An idle session accepting PDFs only.
    pub fn new() -> Self {
        Self::with_policy(UploadPolicy::default())
    }

    pub fn with_policy(policy: UploadPolicy) -> Self {
        Self {
            policy,
            phase: UploadPhase::Idle,
            files: Vec::new(),
            target: None,
            outcome: None,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<&UploadOutcome> {
        self.outcome.as_ref()
    }

    pub fn target(&self) -> Option<CaseId> {
        self.target
    }

    /// True when the batch will be appended to an existing case.
    pub fn is_append_mode(&self) -> bool {
        self.target.is_some()
    }

    pub fn files(&self) -> impl Iterator<Item = &UploadFile> {
        self.files.iter().map(|f| &f.file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn status_of(&self, key: &FileKey) -> Option<FileStatus> {
        self.files.iter().find(|f| f.file.matches(key)).map(|f| f.status)
    }

    /// Files with their current status, in selection order.
    pub fn statuses(&self) -> impl Iterator<Item = (&UploadFile, FileStatus)> {
        self.files.iter().map(|f| (&f.file, f.status))
    }

    fn ensure_idle(&self) -> Result<(), UploadError> {
        match self.phase {
            UploadPhase::Idle => Ok(()),
            phase => Err(UploadError::NotIdle { phase }),
        }
    }

    /// Add files, collapsing duplicates by name and size.
    ///
    /// A file whose key is already present replaces the stored entry
    /// without moving it, so repeated drops of the same file are harmless.
    pub fn add_files<I>(&mut self, files: I) -> Result<AddFilesReport, UploadError>
    where
        I: IntoIterator<Item = UploadFile>,
    {
        self.ensure_idle()?;

        let mut report = AddFilesReport::default();
        for file in files {
            if !self.policy.accepts(&file.name) {
                report.rejected.push(file.name);
                continue;
            }
            let key = file.key();
            match self.files.iter_mut().find(|f| f.file.matches(&key)) {
                Some(existing) => {
                    existing.file = file;
                    report.replaced += 1;
                }
                None => {
                    self.files.push(SessionFile {
                        file,
                        status: FileStatus::Ready,
                    });
                    report.added += 1;
                }
            }
        }
        Ok(report)
    }

    /// Remove a file. Returns whether it was present.
    pub fn remove_file(&mut self, key: &FileKey) -> Result<bool, UploadError> {
        self.ensure_idle()?;
        let before = self.files.len();
        self.files.retain(|f| !f.file.matches(key));
        Ok(self.files.len() != before)
    }

    /// Choose the case to append to, or `None` to create a new case.
    pub fn set_target(&mut self, target: Option<CaseId>) -> Result<(), UploadError> {
        self.ensure_idle()?;
        self.target = target;
        Ok(())
    }

    /// Start submitting: `Idle -> Submitting`.
    ///
    /// Returns the request to hand to the upload collaborator, or `None`
    /// when nothing should happen: the session is not idle, it has no
    /// files, or it would create a new case with a blank name. In append
    /// mode `case_name` is ignored.
    pub fn begin_submit(&mut self, case_name: &str) -> Option<UploadRequest> {
        if self.phase != UploadPhase::Idle || self.files.is_empty() {
            return None;
        }
        let case_name = match self.target {
            Some(_) => String::new(),
            None if case_name.trim().is_empty() => return None,
            None => case_name.trim().to_string(),
        };

        self.set_all(FileStatus::Processing);
        self.phase = UploadPhase::Submitting;
        info!(
            files = self.files.len(),
            target = ?self.target,
            "upload session submitting"
        );

        Some(UploadRequest {
            case_name,
            files: self.files.iter().map(|f| f.file.clone()).collect(),
            target: self.target,
        })
    }

    /// Record the collaborator's answer: `Submitting -> Succeeded | Failed`.
    ///
    /// Ignored (returns `false`) unless the session is submitting.
    pub fn resolve(&mut self, result: Result<CaseId, String>) -> bool {
        if self.phase != UploadPhase::Submitting {
            return false;
        }
        match result {
            Ok(case_id) => {
                self.set_all(FileStatus::Succeeded);
                self.phase = UploadPhase::Succeeded;
                self.outcome = Some(UploadOutcome::Case { case_id });
                info!(%case_id, "upload session succeeded");
            }
            Err(message) => {
                self.set_all(FileStatus::Failed);
                self.phase = UploadPhase::Failed;
                info!(%message, "upload session failed");
                self.outcome = Some(UploadOutcome::Failure { message });
            }
        }
        true
    }

    /// Drive a whole submission through `store`.
    ///
    /// This is the only point where a session waits. Returns the outcome,
    /// or `None` when [`begin_submit`](Self::begin_submit) declined to start.
    pub async fn submit<S>(&mut self, store: &S, case_name: &str) -> Option<&UploadOutcome>
    where
        S: CaseStore + ?Sized,
    {
        let request = self.begin_submit(case_name)?;
        let result = store
            .upload(&request)
            .await
            .map_err(|e| format!("{:#}", e));
        self.resolve(result);
        self.outcome.as_ref()
    }

    /// `Failed -> Idle`, keeping files and target so the same batch can be
    /// submitted again. Returns whether the session was failed.
    pub fn retry(&mut self) -> bool {
        if self.phase != UploadPhase::Failed {
            return false;
        }
        self.set_all(FileStatus::Ready);
        self.phase = UploadPhase::Idle;
        self.outcome = None;
        true
    }

    /// Start over with an empty idle session under the same policy.
    pub fn reset(&mut self) -> Result<(), UploadError> {
        if self.phase == UploadPhase::Submitting {
            return Err(UploadError::InFlight);
        }
        *self = Self::with_policy(self.policy.clone());
        Ok(())
    }

    fn set_all(&mut self, status: FileStatus) {
        for f in &mut self.files {
            f.status = status;
        }
    }
}
