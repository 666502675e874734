//! Process-wide scratch directory for transient debugger resources.
//!
//! The directory is created lazily, on the first [`ScratchDir::ensure`]
//! call, and then reused for the rest of the process. The composition root
//! owns one `ScratchDir` and shares it (behind an `Arc`) with everything
//! that needs transient paths.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::PlatformError;

/// Name prefix of the scratch directory under the temp root.
pub const SCRATCH_PREFIX: &str = "sockdap-";

/// A lazily created temporary directory with explicit, idempotent teardown.
///
/// Dropping a `ScratchDir` removes the directory too, so an early return
/// in the binary still cleans up.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
    prefix: String,
    dir: Mutex<Option<TempDir>>,
}

impl ScratchDir {
    /// Scratch directory under the system temp root.
    pub fn new() -> Self {
        Self::in_root(std::env::temp_dir())
    }

    /// Scratch directory under an explicit root.
    pub fn in_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: SCRATCH_PREFIX.to_string(),
            dir: Mutex::new(None),
        }
    }

    /// The directory the scratch directory is created in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the scratch directory, if it has been created.
    pub fn path(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|d| d.path().to_path_buf())
    }

    /// Return the scratch directory, creating it on first use.
    ///
    /// If the directory was removed from under us after creation it is
    /// recreated at the same path.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Scratch`] when the directory cannot be
    /// created. An already existing directory is not an error.
    pub fn ensure(&self) -> Result<PathBuf, PlatformError> {
        let mut slot = self.lock();

        if let Some(dir) = slot.as_ref() {
            let path = dir.path();
            match std::fs::create_dir(path) {
                Ok(()) => debug!(path = %path.display(), "recreated scratch directory"),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(PlatformError::Scratch(e)),
            }
            return Ok(path.to_path_buf());
        }

        let dir = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempdir_in(&self.root)
            .map_err(PlatformError::Scratch)?;
        let path = dir.path().to_path_buf();
        info!(path = %path.display(), "created scratch directory");
        *slot = Some(dir);
        Ok(path)
    }

    /// Path of `name` inside the scratch directory, creating the directory
    /// if needed. The file itself is not created.
    ///
    /// # Errors
    ///
    /// See [`ScratchDir::ensure`].
    pub fn file_path(&self, name: &str) -> Result<PathBuf, PlatformError> {
        Ok(self.ensure()?.join(name))
    }

    /// Recursively remove the scratch directory.
    ///
    /// Calling this before the directory exists, twice, or after something
    /// else already deleted it is fine; failures are logged and swallowed.
    pub fn teardown(&self) {
        let Some(dir) = self.lock().take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => info!(path = %path.display(), "removed scratch directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %path.display(), "scratch teardown failed: {}", e),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<TempDir>> {
        self.dir.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn not_created_until_first_ensure() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path());
        assert!(scratch.path().is_none());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn ensure_creates_prefixed_directory_once() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path());

        let first = scratch.ensure().unwrap();
        let second = scratch.ensure().unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
        assert!(first.starts_with(root.path()));
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(SCRATCH_PREFIX), "got: {name}");
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[test]
    fn ensure_recreates_deleted_directory_at_same_path() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path());
        let path = scratch.ensure().unwrap();

        fs::remove_dir(&path).unwrap();
        assert!(!path.exists());

        assert_eq!(scratch.ensure().unwrap(), path);
        assert!(path.is_dir());
    }

    #[test]
    fn file_path_joins_name_without_creating_file() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path());
        let file = scratch.file_path("debug-abc.socket").unwrap();
        assert_eq!(file.parent(), scratch.path().as_deref());
        assert!(!file.exists());
    }

    #[test]
    fn ensure_fails_when_root_is_missing() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path().join("does-not-exist"));
        let err = scratch.ensure().unwrap_err();
        assert!(matches!(err, PlatformError::Scratch(_)));
    }

    #[test]
    fn teardown_removes_nested_content() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path());
        let path = scratch.ensure().unwrap();
        fs::create_dir_all(path.join("nested").join("deeper")).unwrap();
        fs::write(path.join("nested").join("deeper").join("f.txt"), "x").unwrap();
        fs::write(path.join("debug-top.socket"), "").unwrap();

        scratch.teardown();

        assert!(!path.exists());
        assert!(scratch.path().is_none());
    }

    #[test]
    fn teardown_is_idempotent() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path());
        scratch.ensure().unwrap();
        scratch.teardown();
        scratch.teardown();
    }

    #[test]
    fn teardown_without_ensure_is_noop() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path());
        scratch.teardown();
        assert!(scratch.path().is_none());
    }

    #[test]
    fn teardown_tolerates_externally_removed_directory() {
        let root = tempfile::TempDir::new().unwrap();
        let scratch = ScratchDir::in_root(root.path());
        let path = scratch.ensure().unwrap();
        fs::remove_dir_all(&path).unwrap();
        scratch.teardown();
        assert!(scratch.path().is_none());
    }

    #[test]
    fn drop_removes_directory() {
        let root = tempfile::TempDir::new().unwrap();
        let path = {
            let scratch = ScratchDir::in_root(root.path());
            scratch.ensure().unwrap()
        };
        assert!(!path.exists());
    }
}
