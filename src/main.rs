mod bridge;
mod cli;

use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sockdap_config::{
    load_launch_file, load_settings, resolve_debug_configuration, AttachConfiguration,
    DebugConfiguration, Settings, VariableContext,
};
use sockdap_core::logging::{
    default_log_file_path, log_level_to_filter, prepare_log_file, DEFAULT_MAX_LOG_FILES,
    DEFAULT_MAX_LOG_SIZE,
};
use sockdap_core::StderrSink;
use sockdap_dap::{
    AdapterDescriptor, DescriptorFactory, LoggingHost, SearchPathLocator, StopReason, Supervisor,
};
use sockdap_platform::{DefaultPaths, EndpointAllocator, PlatformPaths, ScratchDir};

use crate::bridge::bridge_stdio;
use crate::cli::{Cli, Command, LaunchArgs};

fn init_tracing(cli: &Cli, settings: &Settings) -> Result<()> {
    let level = cli
        .log_level
        .as_deref()
        .map(log_level_to_filter)
        .unwrap_or_else(|| settings.log.level.as_filter());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_path = settings
        .log
        .file
        .clone()
        .or_else(|| cli.log_to_file.then(default_log_file_path));

    // Never log to stdout: with --bridge it carries protocol bytes.
    match log_path {
        Some(path) => {
            prepare_log_file(&path, DEFAULT_MAX_LOG_SIZE, DEFAULT_MAX_LOG_FILES)
                .with_context(|| format!("failed to prepare log file {}", path.display()))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Build the launch configuration from `--config`, `--program`, the
/// active file and the remaining command-line overrides.
fn launch_configuration(
    args: &LaunchArgs,
    settings: &Settings,
    cwd: &Path,
) -> Result<DebugConfiguration> {
    let mut raw = match &args.config {
        Some(path) => load_launch_file(path, args.name.as_deref())?,
        None => Value::Object(serde_json::Map::new()),
    };
    if let (Some(program), Some(map)) = (&args.program, raw.as_object_mut()) {
        map.insert("program".to_string(), Value::String(program.clone()));
    }

    let active_file = args.active_file.as_ref().map(|f| cwd.join(f));
    let config = resolve_debug_configuration(
        &raw,
        active_file.as_deref(),
        &settings.debug.source_extension,
    )?;
    let workspace_folder = args
        .config
        .as_deref()
        .and_then(launch_file_workspace)
        .unwrap_or(cwd)
        .to_path_buf();
    let ctx = VariableContext {
        file: active_file,
        workspace_folder: Some(workspace_folder),
        cwd: Some(cwd.to_path_buf()),
    };

    match config.with_variables(&ctx)? {
        DebugConfiguration::Launch(mut launch) => {
            if let Some(dir) = &args.cwd {
                launch.cwd = Some(dir.clone());
            }
            launch.env.extend(args.env.iter().cloned());
            launch.stop_at_entry |= args.stop_at_entry;
            launch.show_protocol_log |= args.show_protocol_log;
            if !args.program_args.is_empty() {
                launch.args = args.program_args.clone();
            }
            Ok(DebugConfiguration::Launch(launch))
        }
        attach => Ok(attach),
    }
}

/// `.vscode/launch.json` lives one level below the workspace folder.
fn launch_file_workspace(config: &Path) -> Option<&Path> {
    let dir = config.parent()?;
    if dir.file_name().is_some_and(|n| n == ".vscode") {
        dir.parent()
    } else {
        Some(dir)
    }
}

/// Wait for the session to end on its own or for Ctrl-C.
async fn wait_for_end(descriptor: &mut AdapterDescriptor) -> Result<()> {
    let Some(session) = descriptor.session_mut() else {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
        return Ok(());
    };

    let interrupted = tokio::select! {
        reason = session.stopped() => {
            info!(%reason, "debugger stopped");
            match reason {
                StopReason::Exited(Some(0)) | StopReason::Exited(None) => return Ok(()),
                other => bail!("debugger {other}"),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            true
        }
    };
    if interrupted {
        info!("interrupted, terminating debugger");
        session.terminate();
        let reason = session.stopped().await;
        info!(%reason, "debugger stopped");
    }
    Ok(())
}

async fn run_session(
    cli: Cli,
    settings: Settings,
    scratch: Arc<ScratchDir>,
    cwd: PathBuf,
) -> Result<()> {
    let sink = Arc::new(StderrSink::new(
        cli.verbose || settings.supervisor.verbose_output,
    ));
    let supervisor = Supervisor::new(
        Arc::new(EndpointAllocator::new(scratch)),
        sink,
        Arc::new(LoggingHost),
    )
    .with_poll_interval(settings.supervisor.poll_interval());
    let locator = SearchPathLocator::new(settings.tool.name.as_str())
        .with_path(settings.tool.path.clone())
        .with_args(settings.tool.args.clone())
        .with_env(settings.tool.env.clone());
    let factory = DescriptorFactory::new(supervisor, Box::new(locator))
        .with_pass_through_stdout(settings.supervisor.pass_through_stdout);

    let (config, bridge) = match &cli.command {
        Command::Launch(args) => (launch_configuration(args, &settings, &cwd)?, args.bridge),
        Command::Attach(args) => (
            DebugConfiguration::Attach(AttachConfiguration {
                name: "Attach".to_string(),
                debug_type: None,
                socket: cwd.join(&args.socket),
            }),
            args.bridge,
        ),
    };

    let mut descriptor = factory
        .create(&config)
        .await
        .with_context(|| format!("failed to start '{}'", config.name()))?;
    let endpoint = descriptor.handle().path().to_path_buf();
    let pid = descriptor.session_mut().and_then(|session| {
        // Socket transport: a passed-through stdout has no reader here.
        session.discard_stdout();
        session.pid()
    });
    info!(endpoint = %endpoint.display(), pid = ?pid, "transport ready");

    if bridge {
        let result = bridge_stdio(descriptor.handle()).await;
        if let AdapterDescriptor::Launched(session) = descriptor {
            let reason = session.shutdown().await;
            info!(%reason, "debugger stopped");
        }
        result
    } else {
        println!("{}", endpoint.display());
        wait_for_end(&mut descriptor).await
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = DefaultPaths::new().context("failed to detect platform paths")?;
    let cwd = env::current_dir().context("failed to read current directory")?;
    let settings =
        load_settings(&paths.config_dir(), Some(&cwd)).context("failed to load settings")?;
    init_tracing(&cli, &settings)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let scratch = Arc::new(ScratchDir::in_root(paths.temp_root()));
    let result = runtime.block_on(run_session(cli, settings, scratch.clone(), cwd));
    // Dropping the child-watcher tasks kills any debugger still running.
    runtime.shutdown_background();
    scratch.teardown();
    if let Err(e) = &result {
        warn!("session failed: {:#}", e);
    }
    result
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("sockdap: {:#}", e);
        std::process::exit(1);
    }
}
