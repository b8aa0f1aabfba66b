use std::sync::Arc;

use progress_tracking::{PercentCallback, ProcessingSnapshot};
use serde_json::Value;

use crate::error::{ImportClientError, Result};
use crate::subscriber::SubscriptionHandle;
use crate::types::{ImportFile, JobId, UploadPolicy, UploadReceipt};

/// Submits a file for processing.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// The local preconditions this uploader enforces before touching the network.
    fn policy(&self) -> &UploadPolicy;

    /// Uploads `file`, passing every increase of the upload percentage to `on_percent`.
    /// 100 is always reported before a successful return.
    async fn upload(&self, file: &ImportFile, on_percent: PercentCallback) -> Result<UploadReceipt>;
}

/// Receives the events of one subscription.  Calls are strictly sequential, and after the
/// first call to `on_success` or `on_failure` nothing else is delivered.
pub trait ProgressCallbacks: Send + Sync {
    fn on_progress(&self, snapshot: ProcessingSnapshot);

    /// `result` is the server's result summary, if the terminal event carried one.
    fn on_success(&self, result: Option<Value>);

    fn on_failure(&self, error: ImportClientError);
}

/// Opens progress subscriptions for jobs.
pub trait ProgressSource: Send + Sync {
    /// Must be called from within a tokio runtime; the subscription runs on a spawned task.
    fn subscribe(&self, job_id: &JobId, callbacks: Arc<dyn ProgressCallbacks>) -> SubscriptionHandle;
}
