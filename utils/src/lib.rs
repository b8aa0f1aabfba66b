#![cfg_attr(feature = "strict", deny(warnings))]

pub mod configuration_utils;
pub use configuration_utils::{ParsableConfigValue, ENV_PREFIX};

mod file_paths;
pub use file_paths::normalized_path_from_user_string;

mod guards;
pub use guards::EnvVarGuard;
