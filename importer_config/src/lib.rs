pub mod macros;
pub mod importer_config;

pub mod groups;

// Re-exported for use inside the config_group! macro.
pub use utils::configuration_utils::{ParsableConfigValue, ENV_PREFIX};
pub use importer_config::ImporterConfig;
