//! Debugger command-line construction.

use std::fmt;

use sockdap_platform::TransportEndpoint;

/// Per-launch switches that change the debugger's command line or how its
/// output is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Pause at the program's first statement.
    pub stop_at_entry: bool,
    /// Ask the debugger to log protocol traffic to its stderr.
    pub show_protocol_log: bool,
    /// Leave the process's stdout to the caller instead of forwarding it to
    /// the diagnostic sink.
    pub pass_through_stdout: bool,
}

/// The full argument vector passed to the debugger binary.
///
/// Order: base arguments, transport mode and address, optional
/// `--stop-at-entry`, optional `--log -`, the program, `--`, then the
/// program's own arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArguments(Vec<String>);

impl LaunchArguments {
    /// Build the argument vector for one launch.
    pub fn build(
        base_args: &[String],
        endpoint: &TransportEndpoint,
        options: &LaunchOptions,
        program: &str,
        program_args: &[String],
    ) -> Self {
        let mut args = Vec::with_capacity(base_args.len() + program_args.len() + 8);
        args.extend(base_args.iter().cloned());
        args.push("--mode".to_string());
        args.push("net".to_string());
        args.push("--addr".to_string());
        args.push(endpoint.address());
        if options.stop_at_entry {
            args.push("--stop-at-entry".to_string());
        }
        if options.show_protocol_log {
            args.push("--log".to_string());
            args.push("-".to_string());
        }
        args.push(program.to_string());
        args.push("--".to_string());
        args.extend(program_args.iter().cloned());
        Self(args)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for LaunchArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}
