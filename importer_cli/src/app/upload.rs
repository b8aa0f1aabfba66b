use std::path::Path;

use import_session::{ImportSessionController, Phase};
use importer_config::ImporterConfig;
use tracing::{error, info};

use super::render::{session_line, success_line};
use super::read_import_file;
use crate::errors::{CliError, Result};

pub(super) async fn upload_command(config: &ImporterConfig, path: &Path) -> Result<()> {
    let file = read_import_file(path)?;
    let controller = ImportSessionController::from_config(config)?;

    let mut rx = controller.watch();
    let id = controller.start_with(file)?;

    let mut last_line = None;
    let failure = loop {
        let session = rx.borrow_and_update().clone();

        // Only the automatic reset after a success replaces a finished session.
        if session.id != id {
            eprintln!("{}", success_line(None, None));
            break None;
        }

        if let Some(line) = session_line(&session) {
            if last_line.as_ref() != Some(&line) {
                eprintln!("{line}");
                last_line = Some(line);
            }
        }

        match session.phase {
            Phase::Succeeded => break None,
            Phase::Failed => break Some(session.error_detail.unwrap_or_else(|| "unknown error".to_owned())),
            _ => {},
        }

        if rx.changed().await.is_err() {
            break Some("import controller shut down".to_owned());
        }
    };

    match failure {
        None => {
            info!(session = %id, "import finished");
            Ok(())
        },
        Some(cause) => {
            error!(session = %id, "import failed: {cause}");
            Err(CliError::ImportFailed(cause))
        },
    }
}
