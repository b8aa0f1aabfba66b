//! Extension traits that log an error (or a missing value) at a chosen level
//! and hand the original value back, so call sites can keep using `?`.
//!
//! ```ignore
//! let body = response.json().await.log_error("error decoding upload response")?;
//! let auth = maybe_auth.info_none("upload auth disabled");
//! ```

use std::fmt::{Debug, Display};
use std::panic::Location;

use tracing::{debug, error, info, warn};

/// Logs the `Err` branch of a `Result` and passes the result through unchanged.
pub trait ErrorPrinter {
    #[track_caller]
    fn log_error<M: Display>(self, message: M) -> Self;

    #[track_caller]
    fn warn_error<M: Display>(self, message: M) -> Self;

    #[track_caller]
    fn info_error<M: Display>(self, message: M) -> Self;

    #[track_caller]
    fn debug_error<M: Display>(self, message: M) -> Self;
}

impl<T, E: Debug> ErrorPrinter for Result<T, E> {
    #[track_caller]
    fn log_error<M: Display>(self, message: M) -> Self {
        if let Err(e) = &self {
            let caller = Location::caller();
            error!(caller = %caller, "{message}, error: {e:?}");
        }
        self
    }

    #[track_caller]
    fn warn_error<M: Display>(self, message: M) -> Self {
        if let Err(e) = &self {
            let caller = Location::caller();
            warn!(caller = %caller, "{message}, error: {e:?}");
        }
        self
    }

    #[track_caller]
    fn info_error<M: Display>(self, message: M) -> Self {
        if let Err(e) = &self {
            let caller = Location::caller();
            info!(caller = %caller, "{message}, error: {e:?}");
        }
        self
    }

    #[track_caller]
    fn debug_error<M: Display>(self, message: M) -> Self {
        if let Err(e) = &self {
            let caller = Location::caller();
            debug!(caller = %caller, "{message}, error: {e:?}");
        }
        self
    }
}

/// Logs when an `Option` is `None` and passes the option through unchanged.
pub trait OptionPrinter {
    #[track_caller]
    fn error_none<M: Display>(self, message: M) -> Self;

    #[track_caller]
    fn warn_none<M: Display>(self, message: M) -> Self;

    #[track_caller]
    fn info_none<M: Display>(self, message: M) -> Self;

    #[track_caller]
    fn debug_none<M: Display>(self, message: M) -> Self;
}

impl<T> OptionPrinter for Option<T> {
    #[track_caller]
    fn error_none<M: Display>(self, message: M) -> Self {
        if self.is_none() {
            let caller = Location::caller();
            error!(caller = %caller, "{message}");
        }
        self
    }

    #[track_caller]
    fn warn_none<M: Display>(self, message: M) -> Self {
        if self.is_none() {
            let caller = Location::caller();
            warn!(caller = %caller, "{message}");
        }
        self
    }

    #[track_caller]
    fn info_none<M: Display>(self, message: M) -> Self {
        if self.is_none() {
            let caller = Location::caller();
            info!(caller = %caller, "{message}");
        }
        self
    }

    #[track_caller]
    fn debug_none<M: Display>(self, message: M) -> Self {
        if self.is_none() {
            let caller = Location::caller();
            debug!(caller = %caller, "{message}");
        }
        self
    }
}
