use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Log verbosity level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug messages.
    Debug,
    /// Informational messages (default).
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Where to find the debugger binary and how to invoke it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Binary name searched for on `PATH` and the Go bin directories.
    #[serde(default = "default_tool_name")]
    pub name: String,
    /// Explicit binary path; skips the search when set.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Arguments placed before the transport arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment the tool requires.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_tool_name() -> String {
    "yaegi-dap".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            name: default_tool_name(),
            path: None,
            args: Vec::new(),
            env: HashMap::new(),
        }
    }
}

/// Process supervisor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorSettings {
    /// Readiness poll interval in milliseconds. There is no overall
    /// readiness timeout.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Leave the debugger's stdout unread (stdio transport).
    #[serde(default)]
    pub pass_through_stdout: bool,
    /// Echo debugger output to stderr as it arrives instead of only on
    /// abnormal termination.
    #[serde(default)]
    pub verbose_output: bool,
}

fn default_poll_interval_ms() -> u64 {
    10
}

impl SupervisorSettings {
    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            pass_through_stdout: false,
            verbose_output: false,
        }
    }
}

/// Defaults for launching without an explicit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugSettings {
    /// Extension of files that can be launched directly ("launch current
    /// file").
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
}

fn default_source_extension() -> String {
    "go".to_string()
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            source_extension: default_source_extension(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Log verbosity level.
    #[serde(default)]
    pub level: LogLevel,
    /// Optional path to a log file; stderr when unset.
    pub file: Option<PathBuf>,
}

/// Top-level sockdap settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Debugger binary settings.
    #[serde(default)]
    pub tool: ToolSettings,
    /// Supervisor tuning.
    #[serde(default)]
    pub supervisor: SupervisorSettings,
    /// Configuration resolution defaults.
    #[serde(default)]
    pub debug: DebugSettings,
    /// Logging settings.
    #[serde(default)]
    pub log: LogSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_have_expected_values() {
        let s = Settings::default();
        assert_eq!(s.tool.name, "yaegi-dap");
        assert!(s.tool.path.is_none());
        assert!(s.tool.args.is_empty());
        assert!(s.tool.env.is_empty());
        assert_eq!(s.supervisor.poll_interval_ms, 10);
        assert_eq!(s.supervisor.poll_interval(), Duration::from_millis(10));
        assert!(!s.supervisor.pass_through_stdout);
        assert!(!s.supervisor.verbose_output);
        assert_eq!(s.debug.source_extension, "go");
        assert_eq!(s.log.level, LogLevel::Info);
        assert!(s.log.file.is_none());
    }

    #[test]
    fn serde_roundtrip_preserves_values() {
        let mut env = HashMap::new();
        env.insert("GOFLAGS".to_string(), "-mod=vendor".to_string());
        let settings = Settings {
            tool: ToolSettings {
                name: "dlv-dap".into(),
                path: Some(PathBuf::from("/opt/bin/dlv-dap")),
                args: vec!["--quiet".into()],
                env,
            },
            supervisor: SupervisorSettings {
                poll_interval_ms: 25,
                pass_through_stdout: true,
                verbose_output: true,
            },
            debug: DebugSettings {
                source_extension: "yg".into(),
            },
            log: LogSettings {
                level: LogLevel::Debug,
                file: Some(PathBuf::from("/tmp/sockdap.log")),
            },
        };

        let text = toml::to_string(&settings).expect("serialize");
        let back: Settings = toml::from_str(&text).expect("deserialize");
        assert_eq!(settings, back);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let input = r#"
[tool]
path = "/usr/local/bin/yaegi-dap"

[supervisor]
poll_interval_ms = 50
"#;
        let s: Settings = toml::from_str(input).expect("parse toml");
        assert_eq!(s.tool.name, "yaegi-dap");
        assert_eq!(s.tool.path, Some(PathBuf::from("/usr/local/bin/yaegi-dap")));
        assert_eq!(s.supervisor.poll_interval_ms, 50);
        assert!(!s.supervisor.pass_through_stdout);
        assert_eq!(s.debug.source_extension, "go");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let s: Settings = toml::from_str("").expect("parse empty toml");
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn log_level_filters() {
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
        let parsed: LogSettings = toml::from_str("level = \"error\"").unwrap();
        assert_eq!(parsed.level.as_filter(), "error");
    }
}
