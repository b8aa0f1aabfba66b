use std::time::Duration;

use error_printer::ErrorPrinter;
use importer_config::ImporterConfig;
use progress_tracking::{PercentCallback, UploadPercentReporter};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ImportClientError, Result, GENERIC_UPLOAD_FAILURE, MISSING_JOB_ID};
use crate::http_client::{build_http_client, endpoint_url};
use crate::interface::Uploader;
use crate::progress_tracked_streams::UploadProgressStream;
use crate::types::{ErrorResponse, ImportFile, JobId, UploadPolicy, UploadReceipt, UploadResponse};

const CSV_MIME: &str = "text/csv";

/// Streams a file to the submission endpoint as a multipart form, reporting whole-percent
/// progress as the body is consumed, and returns the job id the server assigns.
pub struct TransferReporter {
    client: ClientWithMiddleware,
    upload_url: Url,
    policy: UploadPolicy,
    form_field: String,
    block_size: usize,
    timeout: Duration,
}

impl TransferReporter {
    pub fn new(client: ClientWithMiddleware, config: &ImporterConfig) -> Result<Self> {
        let upload_url = endpoint_url(&config.client.endpoint, &config.client.upload_path)?;
        Ok(Self {
            client,
            upload_url,
            policy: UploadPolicy::from_config(config),
            form_field: config.upload.form_field.clone(),
            block_size: config.client.upload_reporting_block_size,
            timeout: config.client.upload_timeout,
        })
    }

    /// Builds its own HTTP client from `config`.
    pub fn from_config(config: &ImporterConfig) -> Result<Self> {
        Self::new(build_http_client(config)?, config)
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    fn multipart_form(&self, file: &ImportFile, reporter: UploadPercentReporter) -> Result<Form> {
        let stream = UploadProgressStream::new(file.content.clone(), self.block_size, reporter);
        let part = Part::stream_with_length(Body::wrap_stream(stream), file.len())
            .file_name(file.name.clone())
            .mime_str(CSV_MIME)?;
        Ok(Form::new().part(self.form_field.clone(), part))
    }
}

#[async_trait::async_trait]
impl Uploader for TransferReporter {
    fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    async fn upload(&self, file: &ImportFile, on_percent: PercentCallback) -> Result<UploadReceipt> {
        self.policy.validate(file)?;

        let reporter = UploadPercentReporter::new(file.len(), on_percent);
        let form = self.multipart_form(file, reporter.clone())?;

        info!(file = %file.name, bytes = file.len(), url = %self.upload_url, "uploading file");

        let response = self
            .client
            .post(self.upload_url.clone())
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .warn_error(format!("upload of {} failed", file.name))
            .map_err(|_| ImportClientError::upload(GENERIC_UPLOAD_FAILURE))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .debug_error("failed to read upload rejection body")
                .unwrap_or_default();
            let cause = serde_json::from_slice::<ErrorResponse>(&body)
                .ok()
                .and_then(|r| r.detail_message())
                .unwrap_or_else(|| GENERIC_UPLOAD_FAILURE.to_owned());
            warn!(file = %file.name, status = status.as_u16(), %cause, "upload rejected");
            return Err(ImportClientError::upload(cause));
        }

        // The server has the whole body once it answers with success.
        reporter.report_complete();

        let body = response
            .bytes()
            .await
            .warn_error("failed to read upload response")
            .map_err(|_| ImportClientError::upload(GENERIC_UPLOAD_FAILURE))?;

        let parsed: UploadResponse = serde_json::from_slice(&body)
            .debug_error("upload response is not the expected json")
            .unwrap_or_default();

        let Some(job_id) = parsed.job_id.and_then(JobId::new) else {
            warn!(file = %file.name, "upload response carried no job id");
            return Err(ImportClientError::upload(MISSING_JOB_ID));
        };

        debug!(file = %file.name, %job_id, message = ?parsed.message, "upload accepted");

        Ok(UploadReceipt {
            job_id,
            message: parsed.message,
        })
    }
}
