use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use import_client::ImportFile;
use importer_config::ImporterConfig;
use importer_logging::{init_logging, LoggingConfig};
use tracing::info;

use crate::constants::{CURRENT_VERSION, PROGRAM_NAME};
use crate::errors::{CliError, Result};

mod render;
mod upload;
mod watch;

#[derive(Subcommand, Debug)]
#[non_exhaustive]
enum Command {
    /// Upload a CSV file and follow the import until the server finishes processing it.
    #[clap(long_about = r#"Upload a CSV file and follow the import until it finishes.

Upload progress is printed while the file is sent, then the server's processing
progress once it has accepted the file and assigned a job. Exits with a non-zero
status if the file is rejected, the upload fails or the server reports that
processing failed."#)]
    Upload(UploadArg),

    /// Follow the processing progress of a job that was already submitted.
    Watch(WatchArg),
}

#[derive(Args, Debug)]
struct UploadArg {
    /// The CSV file to import.
    file: PathBuf,
}

#[derive(Args, Debug)]
struct WatchArg {
    /// The job id the server returned for the upload.
    job_id: String,
}

#[derive(Args, Debug)]
struct CliOverrides {
    /// Increase verbosity of output (-v, -vv, etc.)
    #[clap(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Set the output log file or directory. Writes to stderr if not provided.
    #[clap(long, short, global = true)]
    pub log: Option<PathBuf>,

    /// Base URL of the import server, e.g. http://localhost:8000.
    #[clap(long, global = true)]
    pub endpoint: Option<String>,
}

impl CliOverrides {
    fn apply(&self, config: &mut ImporterConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.client.endpoint = endpoint.clone();
        }
        if let Some(log) = &self.log {
            config.log.dest = Some(log.to_string_lossy().into_owned());
        }
    }
}

/// Product-import uploads product catalogs in CSV form to an import server and reports the
/// progress of the upload and of the server-side processing.
///
/// Every setting can also be given through the environment as PRODUCT_IMPORTER_{GROUP}_{FIELD},
/// e.g. PRODUCT_IMPORTER_CLIENT_ENDPOINT; command line flags take precedence.
#[derive(Parser, Debug)]
#[clap(name = PROGRAM_NAME, version = CURRENT_VERSION, propagate_version = true, verbatim_doc_comment)]
pub struct ImporterApp {
    #[clap(flatten)]
    overrides: CliOverrides,

    #[clap(subcommand)]
    command: Command,
}

impl ImporterApp {
    pub async fn run(self) -> Result<()> {
        let mut config = ImporterConfig::new();
        self.overrides.apply(&mut config);

        init_logging(LoggingConfig::from_config(&config, CURRENT_VERSION).with_verbosity(self.overrides.verbose));

        info!(command = self.command.name(), endpoint = %config.client.endpoint, "running");
        self.command.run(&config).await
    }
}

impl Command {
    pub async fn run(self, config: &ImporterConfig) -> Result<()> {
        match self {
            Command::Upload(args) => upload::upload_command(config, &args.file).await,
            Command::Watch(args) => watch::watch_command(config, args.job_id).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Upload(_) => "upload",
            Command::Watch(_) => "watch",
        }
    }
}

/// Loads `path` as an import payload named after the file.
fn read_import_file(path: &Path) -> Result<ImportFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidArgument(format!("{path:?} does not name a file")))?;

    let content = std::fs::read(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ImportFile::new(name, content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_with_overrides() {
        let app = ImporterApp::try_parse_from([
            "product-import",
            "-vv",
            "--endpoint",
            "http://imports.internal:9000",
            "upload",
            "products.csv",
        ])
        .unwrap();

        assert_eq!(app.overrides.verbose, 2);
        assert_eq!(app.command.name(), "upload");
        let Command::Upload(args) = &app.command else {
            panic!("expected the upload command");
        };
        assert_eq!(args.file, PathBuf::from("products.csv"));

        let mut config = ImporterConfig::default();
        app.overrides.apply(&mut config);
        assert_eq!(config.client.endpoint, "http://imports.internal:9000");
        assert_eq!(config.log.dest, None);
    }

    #[test]
    fn test_flags_after_subcommand() {
        let app = ImporterApp::try_parse_from(["product-import", "watch", "abc123", "--log", "/tmp/import.log", "-v"])
            .unwrap();

        assert_eq!(app.overrides.verbose, 1);
        let Command::Watch(args) = &app.command else {
            panic!("expected the watch command");
        };
        assert_eq!(args.job_id, "abc123");

        let mut config = ImporterConfig::default();
        app.overrides.apply(&mut config);
        assert_eq!(config.log.dest.as_deref(), Some("/tmp/import.log"));
        assert_eq!(config.client.endpoint, "http://localhost:8000");
    }

    #[test]
    fn test_missing_arguments_are_rejected() {
        assert!(ImporterApp::try_parse_from(["product-import"]).is_err());
        assert!(ImporterApp::try_parse_from(["product-import", "upload"]).is_err());
        assert!(ImporterApp::try_parse_from(["product-import", "delete", "abc"]).is_err());
    }

    #[test]
    fn test_read_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        std::fs::write(&path, "sku,name\n1,widget\n").unwrap();

        let file = read_import_file(&path).unwrap();
        assert_eq!(file.name, "products.csv");
        assert_eq!(&file.content[..], b"sku,name\n1,widget\n");

        let err = read_import_file(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, CliError::ReadFile { .. }));

        let err = read_import_file(Path::new("..")).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }
}
