use std::path::{Path, PathBuf};

/// Turns a path typed by a user (or read from the environment) into an absolute path,
/// expanding a leading `~` to the home directory.
pub fn normalized_path_from_user_string(path: impl AsRef<str>) -> PathBuf {
    let path = path.as_ref();

    let expanded = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            match dirs::home_dir() {
                Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
                None => PathBuf::from(path),
            }
        },
        _ => PathBuf::from(path),
    };

    if expanded.is_absolute() {
        return expanded;
    }

    match std::env::current_dir() {
        Ok(cwd) => cwd.join(expanded),
        Err(_) => Path::new(".").join(expanded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_is_unchanged() {
        let p = normalized_path_from_user_string("/var/log/importer.log");
        assert_eq!(p, PathBuf::from("/var/log/importer.log"));
    }

    #[test]
    fn test_relative_path_becomes_absolute() {
        let p = normalized_path_from_user_string("logs/importer.log");
        assert!(p.is_absolute());
        assert!(p.ends_with("logs/importer.log"));
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(normalized_path_from_user_string("~/logs"), home.join("logs"));
        assert_eq!(normalized_path_from_user_string("~"), home);
        // Only a bare leading tilde is expanded.
        assert!(normalized_path_from_user_string("~other/logs").ends_with("~other/logs"));
    }
}
