//! Supervisor error types.

use std::path::PathBuf;

use sockdap_platform::PlatformError;
use thiserror::Error;

use crate::stop::StopReason;

/// Errors from locating, launching or attaching to a debugger.
#[derive(Debug, Error)]
pub enum DapError {
    /// The debugger binary could not be found.
    #[error("cannot find debugger '{name}' (searched {searched} directories)")]
    ToolNotFound {
        /// Binary name that was looked up.
        name: String,
        /// Number of directories searched.
        searched: usize,
    },

    /// The debugger process could not be started.
    #[error("debugger failed to start ({binary}): {message}")]
    SpawnFailed {
        /// Binary that was executed.
        binary: PathBuf,
        /// The OS error text.
        message: String,
    },

    /// The debugger stopped before its transport endpoint appeared.
    #[error("debugger stopped before it was ready: {reason}")]
    PrematureExit {
        /// Why the process stopped.
        reason: StopReason,
    },

    /// Scratch directory or endpoint failure.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// I/O error while polling for readiness.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
