//! One-line progress reports for the terminal.

use import_client::JobId;
use import_session::{ImportSession, Phase};
use progress_tracking::ProcessingSnapshot;
use serde_json::Value;

pub(super) fn upload_line(file_name: &str, percent: u8) -> String {
    format!("Uploading {file_name}: {percent}%")
}

pub(super) fn processing_line(job_id: &JobId, snapshot: Option<&ProcessingSnapshot>) -> String {
    let Some(snapshot) = snapshot else {
        return format!("Processing job {job_id}: waiting for progress");
    };

    let mut line = format!("Processing job {job_id}: {}%", snapshot.percent);
    if snapshot.total > 0 {
        line.push_str(&format!(" ({}/{} records)", snapshot.current, snapshot.total));
    }
    let status = snapshot.status.trim();
    if !status.is_empty() {
        line.push(' ');
        line.push_str(status);
    }
    line
}

pub(super) fn success_line(job_id: Option<&JobId>, result: Option<&Value>) -> String {
    let mut line = match job_id {
        Some(job_id) => format!("Import succeeded (job {job_id})"),
        None => "Import succeeded".to_owned(),
    };
    if let Some(result) = result {
        line.push_str(&format!(": {result}"));
    }
    line
}

pub(super) fn failure_line(cause: &str) -> String {
    format!("Import failed: {cause}")
}

/// The line describing `session`, or `None` while idle.
pub(super) fn session_line(session: &ImportSession) -> Option<String> {
    match session.phase {
        Phase::Idle => None,
        Phase::Uploading => {
            let name = session.file.as_ref().map(|f| f.name.as_str()).unwrap_or("file");
            Some(upload_line(name, session.upload_percent))
        },
        Phase::Processing => {
            let job_id = session.job_id.as_ref()?;
            Some(processing_line(job_id, session.processing_snapshot.as_ref()))
        },
        Phase::Succeeded => Some(success_line(session.job_id.as_ref(), session.result.as_ref())),
        Phase::Failed => Some(failure_line(session.error_detail.as_deref().unwrap_or("unknown error"))),
    }
}
