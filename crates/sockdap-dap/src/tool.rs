//! Locating the debugger binary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::DapError;

/// A resolved debugger: where it is, what it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolInvocation {
    pub bin_path: PathBuf,
    /// Arguments that go before the transport flags.
    pub args: Vec<String>,
    /// Environment the binary needs to run.
    pub env: HashMap<String, String>,
}

/// Finds the debugger binary.
pub trait ToolLocator: Send + Sync {
    /// Locate the binary and the environment it should run with.
    ///
    /// # Errors
    ///
    /// [`DapError::ToolNotFound`] when no usable binary exists.
    fn resolve(&self) -> Result<ToolInvocation, DapError>;
}

/// Looks for a binary by name in the usual Go tool locations.
///
/// Search order: an explicit path if configured, otherwise `$PATH`,
/// `$GOBIN`, each `$GOPATH/bin`, then `$HOME/go/bin`.
#[derive(Debug, Clone)]
pub struct SearchPathLocator {
    name: String,
    explicit_path: Option<PathBuf>,
    args: Vec<String>,
    extra_env: HashMap<String, String>,
    base_env: HashMap<String, String>,
}

impl SearchPathLocator {
    /// Locator for `name`, seeded with the current process environment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            explicit_path: None,
            args: Vec::new(),
            extra_env: HashMap::new(),
            base_env: std::env::vars().collect(),
        }
    }

    /// Use this binary instead of searching.
    pub fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Variables added on top of the base environment.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.extra_env = env;
        self
    }

    /// Replace the environment used for searching and handed to the tool.
    pub fn with_base_env(mut self, env: HashMap<String, String>) -> Self {
        self.base_env = env;
        self
    }

    /// Directories searched, in order.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let env = &self.base_env;
        let mut dirs = Vec::new();
        if let Some(path) = env.get("PATH") {
            dirs.extend(std::env::split_paths(path));
        }
        if let Some(gobin) = env.get("GOBIN").filter(|v| !v.is_empty()) {
            dirs.push(PathBuf::from(gobin));
        }
        if let Some(gopath) = env.get("GOPATH") {
            dirs.extend(std::env::split_paths(gopath).map(|p| p.join("bin")));
        }
        if let Some(home) = env.get("HOME").filter(|v| !v.is_empty()) {
            dirs.push(Path::new(home).join("go").join("bin"));
        }
        dirs.retain(|d| !d.as_os_str().is_empty());
        dirs
    }

    fn invocation(&self, bin_path: PathBuf) -> ToolInvocation {
        let mut env = self.base_env.clone();
        env.extend(self.extra_env.clone());
        ToolInvocation {
            bin_path,
            args: self.args.clone(),
            env,
        }
    }
}

impl ToolLocator for SearchPathLocator {
    fn resolve(&self) -> Result<ToolInvocation, DapError> {
        if let Some(path) = &self.explicit_path {
            if is_executable(path) {
                return Ok(self.invocation(path.clone()));
            }
            return Err(DapError::ToolNotFound {
                name: path.display().to_string(),
                searched: 0,
            });
        }

        let dirs = self.search_dirs();
        let found = dirs
            .iter()
            .map(|dir| dir.join(&self.name))
            .find(|candidate| is_executable(candidate));
        match found {
            Some(bin_path) => {
                debug!(tool = %self.name, path = %bin_path.display(), "resolved debugger");
                Ok(self.invocation(bin_path))
            }
            None => Err(DapError::ToolNotFound {
                name: self.name.clone(),
                searched: dirs.len(),
            }),
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
