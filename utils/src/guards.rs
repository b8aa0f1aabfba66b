use std::env;
use std::ffi::OsStr;

/// Guard that temporarily sets an environment variable and restores the previous value on drop.
///
/// Environment mutation is process-global, so tests using this guard should also be
/// marked `#[serial]`.
///
/// ```no_run
/// use utils::EnvVarGuard;
///
/// let _guard = EnvVarGuard::set("PRODUCT_IMPORTER_CLIENT_ENDPOINT", "http://127.0.0.1:9000");
/// // ... the previous value (or absence) is restored when `_guard` drops.
/// ```
pub struct EnvVarGuard {
    key: &'static str,
    prev: Option<String>,
}

impl EnvVarGuard {
    pub fn set(key: &'static str, value: impl AsRef<OsStr>) -> Self {
        let prev = env::var(key).ok();
        unsafe {
            env::set_var(key, value);
        }
        Self { key, prev }
    }

    pub fn remove(key: &'static str) -> Self {
        let prev = env::var(key).ok();
        unsafe {
            env::remove_var(key);
        }
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.prev {
            unsafe {
                env::set_var(self.key, v);
            }
        } else {
            unsafe {
                env::remove_var(self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_env_var_guard_restores_absence() {
        const KEY: &str = "PRODUCT_IMPORTER_TEST_GUARD_ABSENT";
        assert!(env::var(KEY).is_err());
        {
            let _guard = EnvVarGuard::set(KEY, "1");
            assert_eq!(env::var(KEY).unwrap(), "1");
        }
        assert!(env::var(KEY).is_err());
    }

    #[test]
    #[serial]
    fn test_env_var_guard_restores_previous_value() {
        const KEY: &str = "PRODUCT_IMPORTER_TEST_GUARD_PREVIOUS";
        let _outer = EnvVarGuard::set(KEY, "outer");
        {
            let _inner = EnvVarGuard::remove(KEY);
            assert!(env::var(KEY).is_err());
        }
        assert_eq!(env::var(KEY).unwrap(), "outer");
    }
}
