//! `caselens upload`: read files from disk and submit them as one batch.
//!
//! The batch either creates a new case (named by `--name`, falling back to
//! `[upload].default_case_name`) or is appended to the case given with
//! `--case`. A `--case` id that is not in the current case list is treated
//! as no selection, so the batch creates a new case instead.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use caselens_core::models::CaseId;
use caselens_core::registry::CaseRegistry;
use caselens_core::store::CaseStore;
use caselens_core::upload::{UploadFile, UploadOutcome, UploadSession};
use tracing::{info, warn};

use crate::config::UploadConfig;
use crate::progress::{UploadProgressEvent, UploadProgressReporter};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Read `paths` into upload blobs.
///
/// With `pdf_only`, files whose contents do not start with the PDF
/// signature are skipped with a warning. Unreadable paths are errors.
pub async fn load_files(
    paths: &[PathBuf],
    pdf_only: bool,
    reporter: &dyn UploadProgressReporter,
) -> Result<Vec<UploadFile>> {
    let total = paths.len() as u64;
    let mut files = Vec::with_capacity(paths.len());

    for (i, path) in paths.iter().enumerate() {
        let name = display_name(path);
        reporter.report(UploadProgressEvent::Reading {
            name: name.clone(),
            n: i as u64 + 1,
            total,
        });

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        if pdf_only && !bytes.starts_with(PDF_MAGIC) {
            warn!(file = %path.display(), "skipping file without a PDF signature");
            reporter.report(UploadProgressEvent::Skipped {
                name,
                reason: "not a PDF".to_string(),
            });
            continue;
        }
        files.push(UploadFile::new(name, bytes));
    }
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Resolve `--case` against the live case list.
pub async fn resolve_target(
    store: &dyn CaseStore,
    requested: Option<CaseId>,
) -> Result<Option<CaseId>> {
    let Some(id) = requested else {
        return Ok(None);
    };
    let mut registry = CaseRegistry::new(store.list_cases().await?);
    registry.select(Some(id));
    match registry.selected_case() {
        Some(case) => {
            info!(%id, name = %case.name, "appending to existing case");
            Ok(Some(case.id))
        }
        None => {
            warn!(%id, "case no longer exists; creating a new case instead");
            Ok(None)
        }
    }
}

/// Upload `files` as one batch and report every phase transition.
///
/// Returns the session in its terminal phase. Only problems that stop the
/// batch from being submitted at all are errors here.
pub async fn upload_batch(
    store: &dyn CaseStore,
    upload: &UploadConfig,
    files: Vec<UploadFile>,
    name: Option<&str>,
    target: Option<CaseId>,
    reporter: &dyn UploadProgressReporter,
) -> Result<UploadSession> {
    let mut session = UploadSession::with_policy(upload.policy());
    let added = session.add_files(files)?;
    for rejected in &added.rejected {
        warn!(file = %rejected, "skipping file with a disallowed extension");
        reporter.report(UploadProgressEvent::Skipped {
            name: rejected.clone(),
            reason: "extension not allowed".to_string(),
        });
    }
    if session.is_empty() {
        bail!("no files to upload");
    }
    session.set_target(target)?;

    let case_name = name.unwrap_or(upload.default_case_name.as_str());
    let Some(request) = session.begin_submit(case_name) else {
        bail!("a case name is required to create a new case");
    };
    reporter.report(UploadProgressEvent::phase_of(&session));

    let result = store.upload(&request).await.map_err(|e| format!("{:#}", e));
    session.resolve(result);
    reporter.report(UploadProgressEvent::phase_of(&session));
    Ok(session)
}

/// The case a finished session landed in. A failed batch is an error
/// carrying the store's message unchanged.
pub fn finished_case(session: &UploadSession) -> Result<CaseId> {
    match session.outcome() {
        Some(UploadOutcome::Case { case_id }) => Ok(*case_id),
        Some(UploadOutcome::Failure { message }) => bail!("upload failed: {}", message),
        None => bail!("upload did not complete"),
    }
}

pub async fn run_upload(
    store: &dyn CaseStore,
    upload: &UploadConfig,
    paths: &[PathBuf],
    name: Option<&str>,
    case: Option<CaseId>,
    reporter: &dyn UploadProgressReporter,
) -> Result<CaseId> {
    let files = load_files(paths, upload.pdf_only(), reporter).await?;
    let target = resolve_target(store, case).await?;
    let session = upload_batch(store, upload, files, name, target, reporter).await?;

    for (file, status) in session.statuses() {
        println!("{:<12}  {}", status.label(), file.name);
    }
    let case_id = finished_case(&session)?;
    if session.is_append_mode() {
        println!("Appended to case {}.", case_id);
    } else {
        println!("Created case {}.", case_id);
    }
    Ok(case_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use caselens_core::store::memory::InMemoryCaseStore;
    use caselens_core::upload::UploadRequest;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<UploadProgressEvent>>);

    impl UploadProgressReporter for Recorder {
        fn report(&self, event: UploadProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn load_files_skips_non_pdf_content() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("note.pdf");
        let bad = dir.path().join("fake.pdf");
        std::fs::write(&good, b"%PDF-1.7 body").unwrap();
        std::fs::write(&bad, b"<html>").unwrap();

        let recorder = Recorder::default();
        let files = load_files(&[good.clone(), bad.clone()], true, &recorder)
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "note.pdf");
        assert_eq!(files[0].size, 13);

        let events = recorder.0.lock().unwrap();
        assert!(events.contains(&UploadProgressEvent::Skipped {
            name: "fake.pdf".to_string(),
            reason: "not a PDF".to_string(),
        }));

        let all = load_files(&[good, bad], false, &NoProgress).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn load_files_fails_on_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_files(&[dir.path().join("nope.pdf")], true, &NoProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn stale_case_selection_creates_new_case() {
        let store = InMemoryCaseStore::new();
        assert_eq!(resolve_target(&store, Some(CaseId(7))).await.unwrap(), None);

        let id = store
            .upload(&UploadRequest {
                case_name: "Doe".to_string(),
                files: vec![UploadFile::new("a.pdf", b"%PDF-".to_vec())],
                target: None,
            })
            .await
            .unwrap();
        assert_eq!(resolve_target(&store, Some(id)).await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn batch_reports_submitting_then_succeeded() {
        let store = InMemoryCaseStore::new();
        let recorder = Recorder::default();
        let files = vec![
            UploadFile::new("a.pdf", b"%PDF-a".to_vec()),
            UploadFile::new("b.txt", b"text".to_vec()),
        ];
        let session = upload_batch(&store, &UploadConfig::default(), files, None, None, &recorder)
            .await
            .unwrap();
        let id = finished_case(&session).unwrap();

        let record = store.get_case(id).await.unwrap().unwrap();
        assert_eq!(record.meta.name, "Demo Case");
        assert_eq!(record.documents.len(), 1);

        let phases: Vec<String> = recorder
            .0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                UploadProgressEvent::Phase { phase, .. } => Some(phase.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec!["submitting", "succeeded"]);
    }

    #[tokio::test]
    async fn batch_of_only_rejected_files_is_an_error() {
        let store = InMemoryCaseStore::new();
        let files = vec![UploadFile::new("b.txt", b"text".to_vec())];
        let err = upload_batch(&store, &UploadConfig::default(), files, None, None, &NoProgress)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no files to upload");
        assert!(store.list_cases().await.unwrap().is_empty());
    }
}
