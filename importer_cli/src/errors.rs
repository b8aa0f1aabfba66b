use std::path::PathBuf;

use import_client::ImportClientError;
use import_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Client(#[from] ImportClientError),

    #[error("Import failed: {0}")]
    ImportFailed(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
