use crate::error::ConfigError;
use crate::settings::Settings;

/// Check settings for values the supervisor cannot work with.
///
/// Returns every violation found, not just the first.
pub fn validate(settings: &Settings) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if settings.supervisor.poll_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            field: "supervisor.poll_interval_ms".to_string(),
            message: "must be greater than 0".to_string(),
        });
    }

    if settings.tool.name.trim().is_empty() && settings.tool.path.is_none() {
        errors.push(ConfigError::Validation {
            field: "tool.name".to_string(),
            message: "must not be empty when tool.path is unset".to_string(),
        });
    }

    if settings.tool.name.contains(std::path::MAIN_SEPARATOR) {
        errors.push(ConfigError::Validation {
            field: "tool.name".to_string(),
            message: format!(
                "must be a bare binary name, got '{}' (use tool.path for paths)",
                settings.tool.name
            ),
        });
    }

    if settings.debug.source_extension.starts_with('.') {
        errors.push(ConfigError::Validation {
            field: "debug.source_extension".to_string(),
            message: "must not include the leading dot".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
