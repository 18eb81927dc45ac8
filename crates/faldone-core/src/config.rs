//! Configuration: where the store file lives.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable that overrides the default store location.
pub const STORE_PATH_ENV: &str = "FALDONE_PATH";

/// File name of the store inside the home directory.
pub const DEFAULT_FILE_NAME: &str = ".faldone.db";

/// Top-level Faldone configuration.
#[derive(Debug, Clone)]
pub struct FaldoneConfig {
    /// Path to the single-file store.
    pub store_path: PathBuf,
}

impl FaldoneConfig {
    /// Resolve configuration from an explicit override, the environment and defaults.
    ///
    /// Precedence: `explicit` (the `-f` flag), then `FALDONE_PATH`, then `~/.faldone.db`.
    pub fn from_env(explicit: Option<PathBuf>) -> Result<Self> {
        let env_path = std::env::var_os(STORE_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::resolve(explicit, env_path, dirs::home_dir())
    }

    fn resolve(
        explicit: Option<PathBuf>,
        env_path: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Result<Self> {
        let store_path = match explicit.or(env_path) {
            Some(p) => p,
            None => default_store_path(
                home.as_deref()
                    .ok_or_else(|| Error::Config("cannot determine home directory".into()))?,
            ),
        };
        tracing::debug!("Using store at {}", store_path.display());
        Ok(Self { store_path })
    }
}

/// Default store location under a home directory.
pub fn default_store_path(home: &Path) -> PathBuf {
    home.join(DEFAULT_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let cfg = FaldoneConfig::resolve(
            Some(PathBuf::from("/tmp/a.db")),
            Some(PathBuf::from("/tmp/b.db")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("/tmp/a.db"));
    }

    #[test]
    fn test_env_path_before_home() {
        let cfg = FaldoneConfig::resolve(
            None,
            Some(PathBuf::from("/tmp/b.db")),
            Some(PathBuf::from("/home/u")),
        )
        .unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("/tmp/b.db"));
    }

    #[test]
    fn test_home_default() {
        let cfg = FaldoneConfig::resolve(None, None, Some(PathBuf::from("/home/u"))).unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("/home/u/.faldone.db"));
    }

    #[test]
    fn test_no_home_is_config_error() {
        let err = FaldoneConfig::resolve(None, None, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
