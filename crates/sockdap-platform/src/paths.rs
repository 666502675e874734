use std::path::PathBuf;

use crate::error::PlatformError;

/// Standard directory locations used by sockdap.
pub trait PlatformPaths: Send + Sync {
    /// Settings directory (`~/.config/sockdap` on Linux).
    fn config_dir(&self) -> PathBuf;
    /// Root under which the scratch directory is created.
    fn temp_root(&self) -> PathBuf;
}

/// [`PlatformPaths`] backed by the `dirs` crate.
#[derive(Debug, Clone)]
pub struct DefaultPaths {
    home: PathBuf,
}

impl DefaultPaths {
    /// Resolve the home directory.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Path` if the home directory cannot be
    /// determined.
    pub fn new() -> Result<Self, PlatformError> {
        let home = dirs::home_dir()
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .ok_or_else(|| PlatformError::Path("could not determine home directory".into()))?;
        Ok(Self { home })
    }
}

impl PlatformPaths for DefaultPaths {
    fn config_dir(&self) -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| self.home.join(".config"))
            .join("sockdap")
    }

    fn temp_root(&self) -> PathBuf {
        std::env::temp_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_paths() -> DefaultPaths {
        DefaultPaths::new().expect("should resolve home directory")
    }

    #[test]
    fn config_dir_ends_with_sockdap() {
        let config = make_paths().config_dir();
        assert!(config.ends_with("sockdap"), "got: {:?}", config);
    }

    #[test]
    fn temp_root_is_system_temp() {
        assert_eq!(make_paths().temp_root(), std::env::temp_dir());
    }

    #[test]
    fn default_paths_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DefaultPaths>();
    }
}
