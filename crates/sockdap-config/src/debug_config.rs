//! Debug configurations as written in a `launch.json`-style file.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name given to the configuration synthesized for "launch current file".
pub const CURRENT_FILE_NAME: &str = "Launch current file";

/// A single debug configuration, tagged by its `request` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "lowercase")]
pub enum DebugConfiguration {
    /// Spawn the debugger and have it run `program`.
    Launch(LaunchConfiguration),
    /// Connect to a debugger that is already listening.
    Attach(AttachConfiguration),
}

impl DebugConfiguration {
    /// The configuration's display name.
    pub fn name(&self) -> &str {
        match self {
            DebugConfiguration::Launch(c) => &c.name,
            DebugConfiguration::Attach(c) => &c.name,
        }
    }
}

/// Settings for launching a program under the debugger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfiguration {
    #[serde(default = "default_launch_name")]
    pub name: String,
    /// Debugger type, e.g. `"yaegi"`. Informational only.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub debug_type: Option<String>,
    /// Program to debug; may contain `${file}` style variables.
    pub program: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Arguments forwarded to the program after `--`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment overrides, applied on top of the tool's environment.
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub stop_at_entry: bool,
    /// Have the debugger log protocol traffic to its stderr.
    #[serde(default)]
    pub show_protocol_log: bool,
}

fn default_launch_name() -> String {
    "Launch".to_string()
}

impl LaunchConfiguration {
    /// Minimal launch configuration for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            name: default_launch_name(),
            debug_type: None,
            program: program.into(),
            cwd: None,
            args: Vec::new(),
            env: HashMap::new(),
            stop_at_entry: false,
            show_protocol_log: false,
        }
    }

    /// The configuration used when debugging starts with nothing configured.
    pub fn current_file() -> Self {
        Self {
            name: CURRENT_FILE_NAME.to_string(),
            ..Self::new("${file}")
        }
    }
}

/// Settings for attaching to a listening debugger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachConfiguration {
    #[serde(default = "default_attach_name")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub debug_type: Option<String>,
    /// Path of the socket the debugger listens on.
    pub socket: PathBuf,
}

fn default_attach_name() -> String {
    "Attach".to_string()
}
