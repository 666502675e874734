//! `${...}` variable expansion in debug configurations.
//!
//! Supported variables: `${file}`, `${fileDirname}`, `${workspaceFolder}`,
//! `${cwd}` and `${env:NAME}`. Unknown variables are left untouched.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::debug_config::DebugConfiguration;
use crate::error::ConfigError;

/// Values available for substitution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableContext {
    /// The file the user is looking at.
    pub file: Option<PathBuf>,
    /// Root of the project being debugged.
    pub workspace_folder: Option<PathBuf>,
    /// Working directory of the sockdap process.
    pub cwd: Option<PathBuf>,
}

fn variable_pattern() -> Result<&'static Regex, ConfigError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\$\{([^}]+)\}"))
        .as_ref()
        .map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Expand all variables in `text`.
///
/// # Errors
///
/// [`ConfigError::UnresolvedVariable`] when a known variable has no value
/// in `ctx` (e.g. `${file}` with no active file).
pub fn substitute_variables(text: &str, ctx: &VariableContext) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in variable_pattern()?.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        match lookup(name.as_str(), ctx)? {
            Some(value) => out.push_str(&value),
            None => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn lookup(name: &str, ctx: &VariableContext) -> Result<Option<String>, ConfigError> {
    let path_value = |p: Option<&Path>| {
        p.map(|p| p.display().to_string())
            .ok_or_else(|| ConfigError::UnresolvedVariable(name.to_string()))
    };
    let value = match name {
        "file" => path_value(ctx.file.as_deref())?,
        "fileDirname" => path_value(ctx.file.as_deref().and_then(Path::parent))?,
        "workspaceFolder" => path_value(ctx.workspace_folder.as_deref())?,
        "cwd" => path_value(ctx.cwd.as_deref())?,
        _ => match name.strip_prefix("env:") {
            Some(var) => std::env::var(var).unwrap_or_default(),
            None => return Ok(None),
        },
    };
    Ok(Some(value))
}

fn substitute_path(path: &Path, ctx: &VariableContext) -> Result<PathBuf, ConfigError> {
    Ok(PathBuf::from(substitute_variables(
        &path.to_string_lossy(),
        ctx,
    )?))
}

impl DebugConfiguration {
    /// Expand variables in every user-facing string field.
    ///
    /// # Errors
    ///
    /// See [`substitute_variables`].
    pub fn with_variables(self, ctx: &VariableContext) -> Result<Self, ConfigError> {
        match self {
            DebugConfiguration::Launch(mut launch) => {
                launch.program = substitute_variables(&launch.program, ctx)?;
                launch.cwd = launch
                    .cwd
                    .as_deref()
                    .map(|cwd| substitute_path(cwd, ctx))
                    .transpose()?;
                launch.args = launch
                    .args
                    .iter()
                    .map(|a| substitute_variables(a, ctx))
                    .collect::<Result<_, _>>()?;
                for value in launch.env.values_mut() {
                    *value = substitute_variables(value, ctx)?;
                }
                Ok(DebugConfiguration::Launch(launch))
            }
            DebugConfiguration::Attach(mut attach) => {
                attach.socket = substitute_path(&attach.socket, ctx)?;
                Ok(DebugConfiguration::Attach(attach))
            }
        }
    }
}
