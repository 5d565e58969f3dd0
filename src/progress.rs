//! Upload progress reporting.
//!
//! Reports what `caselens upload` is doing: which files are being read,
//! which were skipped, and the per-file status after every phase
//! transition of the upload session. Progress is emitted on **stderr** so
//! stdout remains parseable for scripts.

use std::io::Write;

use caselens_core::upload::{FileStatus, UploadPhase, UploadSession};

/// A single progress event for an upload.
#[derive(Clone, Debug, PartialEq)]
pub enum UploadProgressEvent {
    /// Reading file `n` of `total` from disk.
    Reading { name: String, n: u64, total: u64 },
    /// A file was left out of the batch.
    Skipped { name: String, reason: String },
    /// The session entered `phase`; statuses are in selection order.
    Phase {
        phase: UploadPhase,
        files: Vec<(String, FileStatus)>,
    },
}

impl UploadProgressEvent {
    /// Snapshot of the session's current phase and file statuses.
    pub fn phase_of(session: &UploadSession) -> Self {
        UploadProgressEvent::Phase {
            phase: session.phase(),
            files: session
                .statuses()
                .map(|(file, status)| (file.name.clone(), status))
                .collect(),
        }
    }
}

/// Reports upload progress. Implementations write to stderr (human or JSON).
pub trait UploadProgressReporter: Send + Sync {
    fn report(&self, event: UploadProgressEvent);
}

/// Human-friendly progress on stderr: "upload  submitting  a.pdf  Processing...".
pub struct StderrProgress;

impl UploadProgressReporter for StderrProgress {
    fn report(&self, event: UploadProgressEvent) {
        let text = match &event {
            UploadProgressEvent::Reading { name, n, total } => {
                format!("upload  reading  {} / {}  {}\n", n, total, name)
            }
            UploadProgressEvent::Skipped { name, reason } => {
                format!("upload  skipped  {}  ({})\n", name, reason)
            }
            UploadProgressEvent::Phase { phase, files } => {
                let mut text = String::new();
                for (name, status) in files {
                    text.push_str(&format!(
                        "upload  {}  {}  {}\n",
                        phase,
                        name,
                        status.label()
                    ));
                }
                text
            }
        };
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(text.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &UploadProgressEvent) -> serde_json::Value {
        match event {
            UploadProgressEvent::Reading { name, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "reading",
                "file": name,
                "n": n,
                "total": total
            }),
            UploadProgressEvent::Skipped { name, reason } => serde_json::json!({
                "event": "skipped",
                "file": name,
                "reason": reason
            }),
            UploadProgressEvent::Phase { phase, files } => serde_json::json!({
                "event": "progress",
                "phase": phase,
                "files": files
                    .iter()
                    .map(|(name, status)| serde_json::json!({ "file": name, "status": status }))
                    .collect::<Vec<_>>()
            }),
        }
    }
}

impl UploadProgressReporter for JsonProgress {
    fn report(&self, event: UploadProgressEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl UploadProgressReporter for NoProgress {
    fn report(&self, _event: UploadProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn UploadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

/// JSON lines when requested, otherwise the TTY default.
pub fn reporter_for(json: bool) -> Box<dyn UploadProgressReporter> {
    if json {
        ProgressMode::Json.reporter()
    } else {
        ProgressMode::default_for_tty().reporter()
    }
}
