//! # import_session
//!
//! Drives one product import from upload to its final outcome:
//! - `ImportSessionController` - the single-flight state machine
//! - `ImportSession` - the observable value it publishes on every change
//!
//! ## Example
//!
//! ```rust,no_run
//! use import_client::ImportFile;
//! use import_session::{ImportSessionController, Phase};
//! use importer_config::ImporterConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = ImportSessionController::from_config(&ImporterConfig::new())?;
//! controller.start_with(ImportFile::new("products.csv", std::fs::read("products.csv")?))?;
//!
//! let session = controller.wait_for_terminal().await;
//! if session.phase == Phase::Failed {
//!     eprintln!("import failed: {}", session.error_detail.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
#![cfg_attr(feature = "strict", deny(warnings))]

mod controller;
mod errors;
mod session;

pub use controller::{ImportSessionController, CANCELLED_CAUSE};
pub use errors::{Result, SessionError};
pub use session::{ImportSession, Phase};
