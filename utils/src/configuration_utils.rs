use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info, warn};

/// Every environment override read by the importer starts with this prefix.
pub const ENV_PREFIX: &str = "PRODUCT_IMPORTER";

/// How a config value is read from its environment string.
pub trait ParsableConfigValue: std::fmt::Debug + Sized {
    fn parse_user_value(value: &str) -> Option<Self>;

    /// `value` if it parses, `default` otherwise.  A value that is present but unparseable is
    /// warned about.
    fn parse(variable_name: &str, value: Option<String>, default: Self) -> Self {
        let Some(raw) = value else {
            debug!("{variable_name} = {default:?} (default)");
            return default;
        };

        match Self::parse_user_value(&raw) {
            Some(parsed) => {
                info!("{variable_name} = {parsed:?} (from environment)");
                parsed
            },
            None => {
                warn!("{variable_name}: cannot parse {raw:?}; using the default {default:?}");
                default
            },
        }
    }
}

/// Numeric values go through `FromStr`, ignoring surrounding whitespace.
pub trait FromStrParseable: FromStr + std::fmt::Debug {}

impl<T: FromStrParseable> ParsableConfigValue for T {
    fn parse_user_value(value: &str) -> Option<Self> {
        value.trim().parse::<T>().ok()
    }
}

impl FromStrParseable for usize {}
impl FromStrParseable for u32 {}
impl FromStrParseable for u64 {}

// Strings are taken verbatim; surrounding whitespace may be meaningful.
impl ParsableConfigValue for String {
    fn parse_user_value(value: &str) -> Option<Self> {
        Some(value.to_owned())
    }
}

/// Accepts 1/0, true/false, yes/no, y/n and on/off in any case.
impl ParsableConfigValue for bool {
    fn parse_user_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Some(true),
            "0" | "false" | "no" | "n" | "off" => Some(false),
            _ => None,
        }
    }
}

/// `None` unless the variable is set.
impl<T: ParsableConfigValue> ParsableConfigValue for Option<T> {
    fn parse_user_value(value: &str) -> Option<Self> {
        T::parse_user_value(value).map(Some)
    }
}

/// Durations accept the duration_str suffixes, e.g. "2s", "500ms", "10m".
impl ParsableConfigValue for Duration {
    fn parse_user_value(value: &str) -> Option<Self> {
        duration_str::parse(value.trim()).ok()
    }
}
