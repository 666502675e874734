use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::debug_config::{DebugConfiguration, LaunchConfiguration};
use crate::error::ConfigError;

/// Turn a raw, possibly empty, debug configuration into one that can be
/// started.
///
/// * A configuration with a non-empty `program`, or with
///   `request: "attach"`, is used as given (`request` defaults to
///   `"launch"`).
/// * A non-empty configuration without a program is rejected.
/// * An empty configuration (`{}` or `null`) debugs the active file when
///   it has `source_extension`; otherwise the user has to pick one.
///
/// # Errors
///
/// [`ConfigError::NoProgram`], [`ConfigError::NoActiveSource`], or
/// [`ConfigError::Parse`] when the configuration is malformed.
pub fn resolve_debug_configuration(
    raw: &Value,
    active_file: Option<&Path>,
    source_extension: &str,
) -> Result<DebugConfiguration, ConfigError> {
    let fields = match raw {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        other => {
            return Err(ConfigError::Parse(format!(
                "debug configuration must be an object, got {other}"
            )))
        }
    };

    let has_program = fields
        .get("program")
        .and_then(Value::as_str)
        .is_some_and(|p| !p.is_empty());
    let is_attach = fields.get("request").and_then(Value::as_str) == Some("attach");

    if has_program || is_attach {
        let mut fields = fields;
        fields
            .entry("request")
            .or_insert_with(|| Value::String("launch".into()));
        return serde_json::from_value(Value::Object(fields))
            .map_err(|e| ConfigError::Parse(e.to_string()));
    }

    if !fields.is_empty() {
        return Err(ConfigError::NoProgram);
    }

    match active_file {
        Some(file) if file.extension().is_some_and(|e| e == source_extension) => {
            debug!(file = %file.display(), "no configuration given, debugging active file");
            Ok(DebugConfiguration::Launch(LaunchConfiguration::current_file()))
        }
        _ => Err(ConfigError::NoActiveSource {
            extension: source_extension.to_string(),
        }),
    }
}
