use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::merge::merge_settings;
use crate::settings::Settings;
use crate::validate::validate;

/// File name of both the global and the project settings file.
pub const SETTINGS_FILE: &str = "config.toml";

/// Directory holding project settings, looked up from the project dir
/// upward.
pub const PROJECT_DIR: &str = ".sockdap";

const DEFAULT_SETTINGS_CONTENT: &str = r#"# sockdap settings
# Uncomment and edit settings below to override defaults.

# [tool]
# name = "yaegi-dap"
# path = "/usr/local/bin/yaegi-dap"
# args = []
#
# [tool.env]
# GOFLAGS = "-mod=mod"

# [supervisor]
# poll_interval_ms = 10
# pass_through_stdout = false
# verbose_output = false

# [debug]
# source_extension = "go"

# [log]
# level = "info"
# file = "/tmp/sockdap.log"
"#;

/// Load and merge settings.
///
/// 1. Reads `config_dir/config.toml`, creating it with commented-out
///    defaults when missing.
/// 2. Looks for `.sockdap/config.toml` from `project_dir` upward.
/// 3. Merges `Settings::default() <- global <- project` and validates.
///
/// # Errors
///
/// Returns [`ConfigError`] on I/O failure, parse failure, or
/// validation failure.
pub fn load_settings(config_dir: &Path, project_dir: Option<&Path>) -> Result<Settings, ConfigError> {
    let global_path = config_dir.join(SETTINGS_FILE);

    std::fs::create_dir_all(config_dir)?;
    if !global_path.exists() {
        std::fs::write(&global_path, DEFAULT_SETTINGS_CONTENT)
            .map_err(|e| ConfigError::CreateDefault(e.to_string()))?;
        tracing::info!(path = %global_path.display(), "created default settings");
    }

    let mut settings = Settings::default();

    let global_content = std::fs::read_to_string(&global_path)?;
    if has_non_comment_content(&global_content) {
        settings = merge_settings(&settings, &global_content)?;
    }

    if let Some(project_path) = project_dir.and_then(find_project_settings) {
        tracing::debug!(path = %project_path.display(), "merging project settings");
        let project_content = std::fs::read_to_string(&project_path)?;
        settings = merge_settings(&settings, &project_content)?;
    }

    check(&settings)?;
    Ok(settings)
}

/// Parse a TOML string directly into validated [`Settings`].
///
/// # Errors
///
/// Returns [`ConfigError`] on parse or validation failure.
pub fn load_settings_from_str(toml_str: &str) -> Result<Settings, ConfigError> {
    let settings: Settings =
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
    check(&settings)?;
    Ok(settings)
}

fn check(settings: &Settings) -> Result<(), ConfigError> {
    validate(settings).map_err(|errors| {
        errors
            .into_iter()
            .next()
            .unwrap_or_else(|| ConfigError::Validation {
                field: "unknown".to_string(),
                message: "validation failed".to_string(),
            })
    })
}

fn find_project_settings(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_DIR).join(SETTINGS_FILE))
        .find(|candidate| candidate.is_file())
}

fn has_non_comment_content(content: &str) -> bool {
    content.lines().any(|l| {
        let trimmed = l.trim();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    })
}
