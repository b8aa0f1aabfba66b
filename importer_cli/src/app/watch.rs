use std::sync::Arc;

use import_client::{ImportClientError, JobId, ProgressCallbacks, ProgressSource, ProgressSubscriber};
use importer_config::ImporterConfig;
use parking_lot::Mutex;
use progress_tracking::ProcessingSnapshot;
use serde_json::Value;

use super::render::{failure_line, processing_line, success_line};
use crate::errors::{CliError, Result};

/// Prints a job's progress as it arrives and remembers how it ended.
struct TerminalReporter {
    job_id: JobId,
    last_line: Mutex<Option<String>>,
    outcome: Mutex<Option<std::result::Result<Option<Value>, String>>>,
}

impl TerminalReporter {
    fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            last_line: Mutex::new(None),
            outcome: Mutex::new(None),
        }
    }

    fn print(&self, line: String) {
        let mut last_line = self.last_line.lock();
        if last_line.as_ref() != Some(&line) {
            eprintln!("{line}");
            *last_line = Some(line);
        }
    }

    fn take_outcome(&self) -> Option<std::result::Result<Option<Value>, String>> {
        self.outcome.lock().take()
    }
}

impl ProgressCallbacks for TerminalReporter {
    fn on_progress(&self, snapshot: ProcessingSnapshot) {
        self.print(processing_line(&self.job_id, Some(&snapshot)));
    }

    fn on_success(&self, result: Option<Value>) {
        self.print(success_line(Some(&self.job_id), result.as_ref()));
        *self.outcome.lock() = Some(Ok(result));
    }

    fn on_failure(&self, error: ImportClientError) {
        let cause = error.cause();
        self.print(failure_line(&cause));
        *self.outcome.lock() = Some(Err(cause));
    }
}

pub(super) async fn watch_command(config: &ImporterConfig, job_id: String) -> Result<()> {
    let job_id = JobId::new(job_id).ok_or_else(|| CliError::InvalidArgument("the job id is empty".to_owned()))?;
    let subscriber = ProgressSubscriber::from_config(config)?;

    let reporter = Arc::new(TerminalReporter::new(job_id.clone()));
    subscriber.subscribe(&job_id, reporter.clone()).join().await;

    match reporter.take_outcome() {
        Some(Ok(_)) => Ok(()),
        Some(Err(cause)) => Err(CliError::ImportFailed(cause)),
        None => Err(CliError::ImportFailed(format!("progress of job {job_id} ended without an outcome"))),
    }
}
