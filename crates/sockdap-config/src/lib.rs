pub mod debug_config;
pub mod error;
pub mod launch_file;
pub mod load;
pub mod merge;
pub mod resolve;
pub mod settings;
pub mod substitute;
pub mod validate;

pub use debug_config::{AttachConfiguration, DebugConfiguration, LaunchConfiguration};
pub use error::ConfigError;
pub use launch_file::load_launch_file;
pub use load::{load_settings, load_settings_from_str};
pub use resolve::resolve_debug_configuration;
pub use settings::{DebugSettings, LogLevel, LogSettings, Settings, SupervisorSettings, ToolSettings};
pub use substitute::{substitute_variables, VariableContext};
