//! Log-file helpers.
//!
//! The `tracing-subscriber` setup lives in the binary crate; this module
//! only decides where the log file goes and keeps it from growing without
//! bound.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Size at which the current log file is rotated (5 MB).
pub const DEFAULT_MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Number of rotated log files kept next to the current one.
pub const DEFAULT_MAX_LOG_FILES: u32 = 3;

/// Platform default log file path.
///
/// * macOS: `$HOME/Library/Logs/sockdap/sockdap.log`
/// * Linux: `$XDG_STATE_HOME/sockdap/sockdap.log`, else
///   `$HOME/.local/state/sockdap/sockdap.log`
/// * Windows: `%LOCALAPPDATA%/sockdap/logs/sockdap.log`
/// * Fallback: `<temp>/sockdap/sockdap.log`
pub fn default_log_file_path() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Logs/sockdap/sockdap.log");
        }
    }
    #[cfg(target_os = "linux")]
    {
        if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
            return PathBuf::from(state).join("sockdap/sockdap.log");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".local/state/sockdap/sockdap.log");
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            return PathBuf::from(local).join("sockdap\\logs\\sockdap.log");
        }
    }
    std::env::temp_dir().join("sockdap").join("sockdap.log")
}

/// Get a log file ready for appending: create its parent directory and
/// rotate it if it has grown past `max_size`.
pub fn prepare_log_file(log_path: &Path, max_size: u64, max_files: u32) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    rotate_log_files(log_path, max_size, max_files)
}

/// Rotate `sockdap.log` → `sockdap.log.1` → … → `sockdap.log.<max_files>`,
/// dropping the oldest. No-op when the file is missing or still small.
pub fn rotate_log_files(log_path: &Path, max_size: u64, max_files: u32) -> io::Result<()> {
    let len = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if len < max_size {
        return Ok(());
    }

    if max_files == 0 {
        return fs::remove_file(log_path);
    }

    let oldest = rotated_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for i in (1..max_files).rev() {
        let from = rotated_path(log_path, i);
        if from.exists() {
            fs::rename(&from, rotated_path(log_path, i + 1))?;
        }
    }
    fs::rename(log_path, rotated_path(log_path, 1))
}

/// Map a level name (case-insensitive) onto an `EnvFilter` directive.
/// Unknown names fall back to `"info"`.
pub fn log_level_to_filter(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        "off" => "off",
        _ => "info",
    }
}

fn rotated_path(base: &Path, index: u32) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{index}"));
    base.with_file_name(name)
}
