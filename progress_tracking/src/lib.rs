mod progress_info;
pub mod upload_tracking;

pub use progress_info::ProcessingSnapshot;
pub use upload_tracking::{percent_of, PercentCallback, UploadPercentReporter};
