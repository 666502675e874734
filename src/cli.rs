use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Launch and supervise socket-transport debug adapters.
#[derive(Debug, Parser)]
#[command(name = "sockdap", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error, off). Overrides settings.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log to the default log file instead of stderr.
    #[arg(long, global = true)]
    pub log_to_file: bool,

    /// Echo debugger output to stderr as it arrives.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Spawn the debugger for a program and wait until its socket is ready.
    Launch(LaunchArgs),
    /// Use a debugger that is already listening on a socket.
    Attach(AttachArgs),
}

#[derive(Debug, Args)]
pub struct LaunchArgs {
    /// launch.json-style file to read the configuration from.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration name inside --config (default: the first one).
    #[arg(long, requires = "config")]
    pub name: Option<String>,

    /// Program to debug.
    #[arg(long)]
    pub program: Option<String>,

    /// Working directory for the debugger.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Extra environment variable for the debugger (repeatable).
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    #[arg(long)]
    pub stop_at_entry: bool,

    /// Have the debugger log protocol traffic to stderr.
    #[arg(long)]
    pub show_protocol_log: bool,

    /// File to debug when nothing else names a program.
    #[arg(long, value_name = "FILE")]
    pub active_file: Option<PathBuf>,

    /// Connect to the debugger and relay the protocol over stdin/stdout.
    #[arg(long)]
    pub bridge: bool,

    /// Arguments passed to the program.
    #[arg(last = true)]
    pub program_args: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AttachArgs {
    /// Socket the debugger listens on.
    #[arg(long, value_name = "PATH")]
    pub socket: PathBuf,

    /// Connect and relay the protocol over stdin/stdout.
    #[arg(long)]
    pub bridge: bool,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
