#![cfg_attr(feature = "strict", deny(warnings))]

pub use error::{ImportClientError, ValidationError, GENERIC_UPLOAD_FAILURE, MISSING_JOB_ID};
pub use event_source::{ChannelEventSender, ChannelEventSource, EventConnection, EventSourceConnector, HttpEventSource};
pub use http_client::{build_http_client, RequestLoggingMiddleware};
pub use interface::{ProgressCallbacks, ProgressSource, Uploader};
pub use progress_tracked_streams::UploadProgressStream;
pub use sse_parser::{SseEvent, SseParser};
pub use subscriber::{ProgressSubscriber, SubscriptionHandle};
pub use transfer::TransferReporter;
pub use types::{ImportFile, JobId, Outcome, ProgressEvent, TaskState, UploadPolicy, UploadReceipt};

pub mod error;
mod event_source;
mod http_client;
mod interface;
mod progress_tracked_streams;
mod sse_parser;
mod subscriber;
mod transfer;
mod types;
