//! Spawns a debugger and waits for its socket to appear.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use sockdap_core::{DiagnosticSink, OutputKind};
use sockdap_platform::{EndpointAllocator, TransportEndpoint};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command as TokioCommand};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::args::{LaunchArguments, LaunchOptions};
use crate::error::DapError;
use crate::host::DebugHost;
use crate::monitor::{ProcessEvent, ProcessMonitor};
use crate::session::{DebugSession, SessionId, TransportHandle};
use crate::stop::StopSignal;

/// Default interval between endpoint existence checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const PUMP_BUF_SIZE: usize = 4096;

/// Everything needed to spawn one debugger process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Debugger binary.
    pub binary: PathBuf,
    /// Arguments placed before the transport flags.
    pub base_args: Vec<String>,
    /// The complete environment of the child; nothing is inherited.
    pub env: HashMap<String, String>,
    /// Working directory, passed through unchanged.
    pub cwd: Option<PathBuf>,
    /// Program to debug.
    pub program: String,
    /// Arguments for the program, placed after `--`.
    pub program_args: Vec<String>,
    pub options: LaunchOptions,
}

/// Launches debugger processes and supervises them until they stop.
pub struct Supervisor {
    allocator: Arc<EndpointAllocator>,
    sink: Arc<dyn DiagnosticSink>,
    host: Arc<dyn DebugHost>,
    poll_interval: Duration,
}

impl Supervisor {
    pub fn new(
        allocator: Arc<EndpointAllocator>,
        sink: Arc<dyn DiagnosticSink>,
        host: Arc<dyn DebugHost>,
    ) -> Self {
        Self {
            allocator,
            sink,
            host,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Change how often the endpoint is checked during a launch.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn allocator(&self) -> &Arc<EndpointAllocator> {
        &self.allocator
    }

    /// Spawn the debugger and wait until its endpoint exists.
    ///
    /// There is no timeout: a debugger that neither creates its socket nor
    /// exits keeps this future pending.
    ///
    /// # Errors
    ///
    /// - [`DapError::Platform`] if the scratch directory cannot be created.
    /// - [`DapError::SpawnFailed`] if the process cannot be started.
    /// - [`DapError::PrematureExit`] if the process stops first.
    /// - [`DapError::Io`] if the endpoint cannot be checked.
    pub async fn launch(&self, request: &LaunchRequest) -> Result<DebugSession, DapError> {
        let endpoint = self.allocator.allocate()?;
        let args = LaunchArguments::build(
            &request.base_args,
            &endpoint,
            &request.options,
            &request.program,
            &request.program_args,
        );
        let id = SessionId::next();
        let stop = StopSignal::new();
        let monitor = Arc::new(ProcessMonitor::new(
            id,
            endpoint.clone(),
            stop.clone(),
            self.sink.clone(),
            self.host.clone(),
        ));

        self.sink.append_line(
            OutputKind::Command,
            &format!("$ {} {}", request.binary.display(), args),
        );
        info!(
            session = %id,
            binary = %request.binary.display(),
            endpoint = %endpoint,
            "spawning debugger"
        );

        let mut command = TokioCommand::new(&request.binary);
        command
            .args(args.iter())
            .env_clear()
            .envs(&request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &request.cwd {
            command.current_dir(cwd);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                monitor.handle(ProcessEvent::Error(e.to_string()));
                return Err(DapError::SpawnFailed {
                    binary: request.binary.clone(),
                    message: e.to_string(),
                });
            }
        };

        let pid = child.id();
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_output(stderr, OutputKind::Stderr, self.sink.clone()));
        }
        let stdout = child.stdout.take();
        let passed_stdout = match stdout {
            Some(stdout) if !request.options.pass_through_stdout => {
                tokio::spawn(pump_output(stdout, OutputKind::Stdout, self.sink.clone()));
                None
            }
            other => other,
        };

        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(watch_child(child, kill_rx, monitor));

        // On error kill_tx is dropped here, which kills the child.
        self.wait_until_ready(&endpoint, &stop).await?;
        debug!(session = %id, pid = ?pid, "debugger ready");

        Ok(DebugSession::new(
            id,
            TransportHandle::new(endpoint),
            stop,
            pid,
            kill_tx,
            passed_stdout,
        ))
    }

    /// Race the stop signal against the endpoint appearing.
    async fn wait_until_ready(
        &self,
        endpoint: &TransportEndpoint,
        stop: &StopSignal,
    ) -> Result<(), DapError> {
        loop {
            tokio::select! {
                biased;
                reason = stop.stopped() => {
                    return Err(DapError::PrematureExit { reason });
                }
                exists = endpoint.exists() => {
                    if exists? {
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("allocator", &self.allocator)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Forward a child stream to the sink chunk by chunk until EOF.
async fn pump_output<R>(mut stream: R, kind: OutputKind, sink: Arc<dyn DiagnosticSink>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; PUMP_BUF_SIZE];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => return,
            Ok(n) => sink.append(kind, &String::from_utf8_lossy(&buf[..n])),
            Err(e) => {
                debug!(%kind, "stopped reading debugger output: {}", e);
                return;
            }
        }
    }
}

/// Wait for the child to exit, killing it when asked (or when the session
/// is dropped), and report the outcome to the monitor.
async fn watch_child(mut child: Child, kill: oneshot::Receiver<()>, monitor: Arc<ProcessMonitor>) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = kill => {
            if let Err(e) = child.start_kill() {
                warn!("failed to kill debugger: {}", e);
            }
            child.wait().await
        }
    };
    let event = match status {
        Ok(status) => ProcessEvent::Exited(status.code()),
        Err(e) => ProcessEvent::Error(e.to_string()),
    };
    monitor.handle(event);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::stop::StopReason;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sockdap_core::OutputChannel;
    use sockdap_platform::ScratchDir;
    use std::sync::Mutex;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[derive(Default)]
    struct RecordingHost {
        stopped: Mutex<Vec<SessionId>>,
    }

    impl DebugHost for RecordingHost {
        fn stop_debugging(&self, session: SessionId) {
            self.stopped.lock().unwrap().push(session);
        }
    }

    struct Harness {
        _tmp: tempfile::TempDir,
        supervisor: Supervisor,
        sink: Arc<OutputChannel>,
        host: Arc<RecordingHost>,
    }

    fn harness() -> Harness {
        let tmp = tempfile::TempDir::new().unwrap();
        let scratch = Arc::new(ScratchDir::in_root(tmp.path()));
        let allocator = Arc::new(EndpointAllocator::with_rng(
            scratch,
            StdRng::seed_from_u64(7),
        ));
        let sink = Arc::new(OutputChannel::default());
        let host = Arc::new(RecordingHost::default());
        let supervisor = Supervisor::new(allocator, sink.clone(), host.clone());
        Harness {
            _tmp: tmp,
            supervisor,
            sink,
            host,
        }
    }

    fn sh_request(script: &str) -> LaunchRequest {
        let mut env = HashMap::new();
        env.insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        LaunchRequest {
            binary: PathBuf::from("/bin/sh"),
            base_args: vec!["-c".to_string(), script.to_string(), "stub".to_string()],
            env,
            program: "main.go".to_string(),
            ..LaunchRequest::default()
        }
    }

    #[tokio::test]
    async fn premature_exit_fails_launch() {
        let h = harness();
        let err = h.supervisor.launch(&sh_request("exit 3")).await.unwrap_err();
        assert!(matches!(
            err,
            DapError::PrematureExit {
                reason: StopReason::Exited(Some(3))
            }
        ));
        assert!(h.sink.contents().contains("Exited with code 3"));
        assert!(h.sink.was_shown());
        assert_eq!(h.host.stopped.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let h = harness();
        let request = LaunchRequest {
            binary: PathBuf::from("/nonexistent/sockdap-debugger"),
            program: "main.go".to_string(),
            ..LaunchRequest::default()
        };
        let err = h.supervisor.launch(&request).await.unwrap_err();
        assert!(matches!(err, DapError::SpawnFailed { .. }));
        assert!(h.sink.contents().contains("Exited with error"));
        assert!(h.sink.was_shown());
    }

    #[tokio::test]
    async fn command_line_is_written_to_sink() {
        let h = harness();
        let _ = h.supervisor.launch(&sh_request("exit 0")).await;
        let commands = h.sink.entries_of(OutputKind::Command);
        assert_eq!(commands.len(), 1);
        let line = commands[0].text();
        assert!(line.starts_with("$ /bin/sh -c exit 0 stub --mode net --addr unix://"));
        assert!(line.trim_end().ends_with("main.go --"));
    }

    #[tokio::test]
    async fn stderr_is_forwarded() {
        let h = harness();
        let _ = h
            .supervisor
            .launch(&sh_request("echo oops >&2; exit 1"))
            .await;
        // The exit can be observed before the pump drains the pipe.
        for _ in 0..100 {
            if h.sink.contents().contains("oops") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!h.sink.entries_of(OutputKind::Stderr).is_empty());
    }

    #[tokio::test]
    async fn ready_when_endpoint_appears() {
        let h = harness();
        // $4 is the unix:// address.
        let script = r#"sleep 0.05; : > "${4#unix://}"; exec sleep 5"#;
        let mut session = h.supervisor.launch(&sh_request(script)).await.unwrap();

        assert!(session.handle().path().exists());
        assert!(!session.has_stopped());

        session.terminate();
        assert_eq!(session.stopped().await, StopReason::Exited(None));
        assert!(!session.handle().path().exists());
        assert_eq!(h.host.stopped.lock().unwrap().as_slice(), &[session.id()]);
    }

    #[tokio::test]
    async fn stdout_is_forwarded_by_default() {
        let h = harness();
        let script = r#": > "${4#unix://}"; echo hello-stdout; exec sleep 5"#;
        let mut session = h.supervisor.launch(&sh_request(script)).await.unwrap();
        assert!(session.take_stdout().is_none());

        for _ in 0..100 {
            if h.sink.contents().contains("hello-stdout") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let stdout = h.sink.entries_of(OutputKind::Stdout);
        assert!(stdout.iter().any(|e| e.text().contains("hello-stdout")));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn passed_through_stdout_is_left_to_the_caller() {
        let h = harness();
        let mut request = sh_request(r#": > "${4#unix://}"; echo passed-through; exec sleep 5"#);
        request.options.pass_through_stdout = true;
        let mut session = h.supervisor.launch(&request).await.unwrap();

        let stdout = session.take_stdout().expect("stdout handed to the caller");
        assert!(session.take_stdout().is_none());
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).await.unwrap();
        assert_eq!(line, "passed-through\n");
        assert!(h.sink.entries_of(OutputKind::Stdout).is_empty());
        session.shutdown().await;
    }

    #[tokio::test]
    async fn discarded_stdout_does_not_block_the_debugger() {
        let h = harness();
        // Far more than a pipe buffer holds.
        let mut request =
            sh_request(r#": > "${4#unix://}"; head -c 300000 /dev/zero; exit 0"#);
        request.options.pass_through_stdout = true;
        let mut session = h.supervisor.launch(&request).await.unwrap();

        session.discard_stdout();
        let reason = tokio::time::timeout(Duration::from_secs(5), session.stopped())
            .await
            .expect("debugger blocked writing stdout");
        assert_eq!(reason, StopReason::Exited(Some(0)));
        assert!(h.sink.entries_of(OutputKind::Stdout).is_empty());
    }
}
