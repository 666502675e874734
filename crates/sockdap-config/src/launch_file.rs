use std::path::Path;

use serde_json::Value;

use crate::error::ConfigError;

/// Read a `launch.json`-style file and pick one raw configuration.
///
/// The file is either `{"configurations": [...]}` or a single
/// configuration object. With `name` the entry with that `name` is
/// returned, otherwise the first one. The result still has to go through
/// [`resolve_debug_configuration`](crate::resolve_debug_configuration).
///
/// # Errors
///
/// [`ConfigError::NotFound`] if the file is missing, [`ConfigError::Parse`]
/// on invalid JSON, [`ConfigError::ConfigurationNotFound`] when no entry
/// matches.
pub fn load_launch_file(path: &Path, name: Option<&str>) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io(e)
        }
    })?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
    select_configuration(document, name)
}

fn select_configuration(document: Value, name: Option<&str>) -> Result<Value, ConfigError> {
    let mut entries = match document {
        Value::Object(mut map) => match map.remove("configurations") {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ConfigError::Parse(
                    "\"configurations\" must be an array".into(),
                ))
            }
            None => vec![Value::Object(map)],
        },
        _ => {
            return Err(ConfigError::Parse(
                "launch file must contain a JSON object".into(),
            ))
        }
    };

    let index = match name {
        Some(wanted) => entries
            .iter()
            .position(|e| e.get("name").and_then(Value::as_str) == Some(wanted)),
        None if entries.is_empty() => None,
        None => Some(0),
    };
    index
        .map(|i| entries.swap_remove(i))
        .ok_or_else(|| ConfigError::ConfigurationNotFound(name.unwrap_or("<first>").to_string()))
}
