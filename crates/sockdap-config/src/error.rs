use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading settings or resolving debug configurations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The specified config file was not found.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to create the default settings file.
    #[error("failed to create default config: {0}")]
    CreateDefault(String),

    /// TOML or JSON parsing failed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A settings value failed validation.
    #[error("validation error: {field}: {message}")]
    Validation {
        /// The dotted field path (e.g. `supervisor.poll_interval_ms`).
        field: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// A launch configuration was given but names no program.
    #[error("cannot find a program to debug")]
    NoProgram,

    /// No configuration was given and there is no suitable active file.
    #[error("select a .{extension} file to debug")]
    NoActiveSource {
        /// The source extension that would have been accepted.
        extension: String,
    },

    /// A configuration file has no entry with the requested name.
    #[error("no debug configuration named '{0}'")]
    ConfigurationNotFound(String),

    /// A `${...}` variable has no value in the current context.
    #[error("cannot resolve variable ${{{0}}}")]
    UnresolvedVariable(String),

    /// An I/O error occurred while reading or writing config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_contains_path() {
        let err = ConfigError::NotFound(PathBuf::from("/tmp/launch.json"));
        assert_eq!(err.to_string(), "config file not found: /tmp/launch.json");
    }

    #[test]
    fn parse_display_contains_details() {
        let err = ConfigError::Parse("expected `=`".into());
        assert_eq!(err.to_string(), "parse error: expected `=`");
    }

    #[test]
    fn validation_display_contains_field_and_message() {
        let err = ConfigError::Validation {
            field: "supervisor.poll_interval_ms".into(),
            message: "must be greater than 0".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("supervisor.poll_interval_ms"));
        assert!(msg.contains("must be greater than 0"));
    }

    #[test]
    fn no_program_display() {
        assert_eq!(
            ConfigError::NoProgram.to_string(),
            "cannot find a program to debug"
        );
    }

    #[test]
    fn no_active_source_names_extension() {
        let err = ConfigError::NoActiveSource {
            extension: "go".into(),
        };
        assert_eq!(err.to_string(), "select a .go file to debug");
    }

    #[test]
    fn unresolved_variable_display_keeps_braces() {
        let err = ConfigError::UnresolvedVariable("file".into());
        assert_eq!(err.to_string(), "cannot resolve variable ${file}");
    }

    #[test]
    fn io_error_converts() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = ConfigError::from(inner);
        assert!(err.to_string().contains("file missing"));
    }
}
