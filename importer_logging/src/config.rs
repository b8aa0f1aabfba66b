use std::path::PathBuf;

use importer_config::ImporterConfig;
use utils::normalized_path_from_user_string;

#[derive(Clone, Debug, PartialEq)]
pub enum LoggingMode {
    Directory(PathBuf),
    File(PathBuf),
    Console,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub logging_mode: LoggingMode,
    pub use_json: bool,
    pub version: String,
    /// Base name of log files created in a log directory.
    pub prefix: String,
    /// Filter directive used in place of the default level when `RUST_LOG` is unset.
    pub level_override: Option<String>,
}

impl LoggingConfig {
    /// Chooses where and how to log from the `log` config group.  Without a destination the
    /// importer logs to the console.
    pub fn from_config(config: &ImporterConfig, version: impl Into<String>) -> LoggingConfig {
        let logging_mode = match config.log.dest.as_deref() {
            None | Some("") => LoggingMode::Console,
            Some(log_dest) => {
                let path = normalized_path_from_user_string(log_dest);

                if log_dest.ends_with('/') || log_dest.ends_with('\\') || path.is_dir() {
                    LoggingMode::Directory(path)
                } else {
                    LoggingMode::File(path)
                }
            },
        };

        let use_json = match &config.log.format {
            Some(format) => format.to_ascii_lowercase().trim() == "json",
            None => logging_mode != LoggingMode::Console,
        };

        Self {
            logging_mode,
            use_json,
            version: version.into(),
            prefix: config.log.prefix.clone(),
            level_override: None,
        }
    }

    /// Raises the level for `-v` style flags: 1 is `info`, 2 is `debug`, more is `trace`.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        self.level_override = match verbose {
            0 => None,
            1 => Some("info".to_owned()),
            2 => Some("debug".to_owned()),
            _ => Some("trace".to_owned()),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(dest: Option<&str>, format: Option<&str>) -> ImporterConfig {
        let mut config = ImporterConfig::default();
        config.log.dest = dest.map(str::to_owned);
        config.log.format = format.map(str::to_owned);
        config
    }

    #[test]
    fn test_console_by_default() {
        let cfg = LoggingConfig::from_config(&config_with(None, None), "1.0");
        assert_eq!(cfg.logging_mode, LoggingMode::Console);
        assert!(!cfg.use_json);
        assert_eq!(cfg.prefix, "product-import");

        let cfg = LoggingConfig::from_config(&config_with(Some(""), None), "1.0");
        assert_eq!(cfg.logging_mode, LoggingMode::Console);
    }

    #[test]
    fn test_directory_and_file_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();

        let cfg = LoggingConfig::from_config(&config_with(Some(dir_str), None), "1.0");
        assert_eq!(cfg.logging_mode, LoggingMode::Directory(dir.path().to_path_buf()));
        assert!(cfg.use_json);

        let not_yet = format!("{dir_str}/not-yet-created/");
        let cfg = LoggingConfig::from_config(&config_with(Some(&not_yet), None), "1.0");
        assert!(matches!(cfg.logging_mode, LoggingMode::Directory(_)));

        let file = format!("{dir_str}/import.log");
        let cfg = LoggingConfig::from_config(&config_with(Some(&file), Some("text")), "1.0");
        assert_eq!(cfg.logging_mode, LoggingMode::File(dir.path().join("import.log")));
        assert!(!cfg.use_json);
    }

    #[test]
    fn test_verbosity_levels() {
        let cfg = LoggingConfig::from_config(&config_with(None, None), "1.0");
        assert_eq!(cfg.clone().with_verbosity(0).level_override, None);
        assert_eq!(cfg.clone().with_verbosity(1).level_override.as_deref(), Some("info"));
        assert_eq!(cfg.clone().with_verbosity(2).level_override.as_deref(), Some("debug"));
        assert_eq!(cfg.with_verbosity(5).level_override.as_deref(), Some("trace"));
    }

    #[test]
    fn test_json_console_on_request() {
        let cfg = LoggingConfig::from_config(&config_with(None, Some(" JSON ")), "1.0");
        assert_eq!(cfg.logging_mode, LoggingMode::Console);
        assert!(cfg.use_json);
    }
}
