//! The observable state of one import, and the only transitions it allows.

use import_client::{ImportFile, JobId};
use progress_tracking::ProcessingSnapshot;
use serde_json::Value;
use ulid::Ulid;

/// Where an import stands.  Phases only move forward along
/// `Idle → Uploading → Processing → {Succeeded | Failed}` (an upload may also fail directly);
/// returning to `Idle` always creates a new session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Processing,
    Succeeded,
    Failed,
}

impl Phase {
    /// Whether a session in this phase blocks a new one from starting.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Uploading | Phase::Processing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Processing => "processing",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One submission-to-completion lifecycle.
///
/// The transition methods return whether they changed anything; a transition that does not
/// apply to the current phase leaves the session untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportSession {
    /// Fresh for every session; callbacks carrying another id are stale.
    pub id: Ulid,
    pub file: Option<ImportFile>,
    pub phase: Phase,
    /// 0..=100, never decreasing.
    pub upload_percent: u8,
    /// Latest server-side progress; set only once processing has started.
    pub processing_snapshot: Option<ProcessingSnapshot>,
    /// Assigned by the server when the upload is accepted; never changes afterwards.
    pub job_id: Option<JobId>,
    /// Why the session failed; present only in `Phase::Failed`.
    pub error_detail: Option<String>,
    /// The server's result summary; present only in `Phase::Succeeded`, when the server sent one.
    pub result: Option<Value>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::idle(None)
    }
}

impl ImportSession {
    pub fn idle(file: Option<ImportFile>) -> Self {
        Self {
            id: Ulid::new(),
            file,
            phase: Phase::Idle,
            upload_percent: 0,
            processing_snapshot: None,
            job_id: None,
            error_detail: None,
            result: None,
        }
    }

    /// A fresh session that is uploading `file`.
    pub fn uploading(file: ImportFile) -> Self {
        Self {
            phase: Phase::Uploading,
            ..Self::idle(Some(file))
        }
    }

    pub fn record_upload_percent(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if self.phase != Phase::Uploading || percent <= self.upload_percent {
            return false;
        }
        self.upload_percent = percent;
        true
    }

    pub fn enter_processing(&mut self, job_id: JobId) -> bool {
        if self.phase != Phase::Uploading || self.job_id.is_some() {
            return false;
        }
        self.phase = Phase::Processing;
        self.upload_percent = 100;
        self.job_id = Some(job_id);
        self.processing_snapshot = None;
        true
    }

    pub fn record_progress(&mut self, snapshot: ProcessingSnapshot) -> bool {
        if self.phase != Phase::Processing {
            return false;
        }
        self.processing_snapshot = Some(snapshot);
        true
    }

    pub fn succeed(&mut self, result: Option<Value>) -> bool {
        if self.phase != Phase::Processing {
            return false;
        }
        self.phase = Phase::Succeeded;
        self.result = result;
        true
    }

    pub fn fail(&mut self, cause: impl Into<String>) -> bool {
        if !self.phase.is_active() {
            return false;
        }
        self.phase = Phase::Failed;
        self.error_detail = Some(cause.into());
        true
    }
}
