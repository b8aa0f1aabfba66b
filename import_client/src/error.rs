use thiserror::Error;

/// Cause reported when an upload fails without a server-supplied detail message.
pub const GENERIC_UPLOAD_FAILURE: &str = "Upload failed";

/// Cause reported when the server accepts an upload but names no job.
pub const MISSING_JOB_ID: &str = "missing job id";

/// Local precondition failures; these never reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a file first")]
    NoFileSelected,

    #[error("File name is empty")]
    EmptyFileName,

    #[error("Please select a valid {expected} file (got {file_name:?})")]
    InvalidFileType { file_name: String, expected: String },

    #[error("File {file_name:?} is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge { file_name: String, size: u64, limit: u64 },
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ImportClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The upload failed in transport or was rejected by the server.
    #[error("Upload Error: {cause}")]
    Upload { cause: String },

    /// The server reported that processing the job failed.
    #[error("Import Error: {cause}")]
    JobFailed { cause: String },

    /// A progress event could not be decoded.
    #[error("failed to decode progress event: {0}")]
    SubscriptionDecode(String),

    /// The progress stream could not be opened, dropped, or ended early.
    #[error("progress stream error: {0}")]
    SubscriptionTransport(String),

    #[error("Configuration Error: {0}")]
    ConfigurationError(String),

    #[error("Parse Error: {0}")]
    ParseError(#[from] url::ParseError),

    #[error("ReqwestMiddleware Error: {0}")]
    ReqwestMiddlewareError(#[from] reqwest_middleware::Error),

    #[error("Reqwest Error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

// Define our own result type here (this seems to be the standard).
pub type Result<T> = std::result::Result<T, ImportClientError>;

impl ImportClientError {
    pub fn upload(cause: impl Into<String>) -> Self {
        ImportClientError::Upload { cause: cause.into() }
    }

    /// The human-readable cause shown to the user when this error ends a session.
    ///
    /// Upload and job failures surface the bare cause (e.g. the server's `detail` message);
    /// every other error uses its display form.
    pub fn cause(&self) -> String {
        match self {
            ImportClientError::Upload { cause } | ImportClientError::JobFailed { cause } => cause.clone(),
            e => e.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ImportClientError::Validation(_))
    }
}

impl PartialEq for ImportClientError {
    fn eq(&self, other: &ImportClientError) -> bool {
        match (self, other) {
            (ImportClientError::Validation(a), ImportClientError::Validation(b)) => a == b,
            (ImportClientError::Upload { cause: a }, ImportClientError::Upload { cause: b }) => a == b,
            (ImportClientError::JobFailed { cause: a }, ImportClientError::JobFailed { cause: b }) => a == b,
            (e1, e2) => std::mem::discriminant(e1) == std::mem::discriminant(e2),
        }
    }
}
