#![cfg_attr(feature = "strict", deny(warnings))]

mod config;
mod constants;
mod logging;

pub use config::{LoggingConfig, LoggingMode};
pub use logging::{init_logging, log_file_in_dir, parse_log_file_name};
