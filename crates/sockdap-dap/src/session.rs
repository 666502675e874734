//! Debug session and transport handle.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use sockdap_platform::TransportEndpoint;
use tokio::process::ChildStdout;
use tokio::sync::oneshot;
use tracing::debug;

use crate::stop::{StopReason, StopSignal};

/// Unique identifier for a debug session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

impl SessionId {
    /// Allocate the next id.
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the front end connects to speak the debug protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportHandle {
    endpoint: TransportEndpoint,
}

impl TransportHandle {
    pub fn new(endpoint: TransportEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &TransportEndpoint {
        &self.endpoint
    }

    pub fn path(&self) -> &Path {
        self.endpoint.path()
    }

    /// Open a stream to the endpoint.
    #[cfg(unix)]
    pub async fn connect(&self) -> std::io::Result<tokio::net::UnixStream> {
        tokio::net::UnixStream::connect(self.endpoint.path()).await
    }
}

/// A launched debugger whose transport endpoint is ready.
///
/// Dropping the session kills the process.
#[derive(Debug)]
pub struct DebugSession {
    id: SessionId,
    handle: TransportHandle,
    stop: StopSignal,
    pid: Option<u32>,
    kill: Option<oneshot::Sender<()>>,
    stdout: Option<ChildStdout>,
}

impl DebugSession {
    pub(crate) fn new(
        id: SessionId,
        handle: TransportHandle,
        stop: StopSignal,
        pid: Option<u32>,
        kill: oneshot::Sender<()>,
        stdout: Option<ChildStdout>,
    ) -> Self {
        Self {
            id,
            handle,
            stop,
            pid,
            kill: Some(kill),
            stdout,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn handle(&self) -> &TransportHandle {
        &self.handle
    }

    /// OS process id of the debugger, if it was still known at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the debugger process has exited or failed.
    pub fn has_stopped(&self) -> bool {
        self.stop.has_fired()
    }

    /// Wait for the debugger process to go away.
    pub async fn stopped(&self) -> StopReason {
        self.stop.stopped().await
    }

    /// Kill the debugger process. The exit is reported through the normal
    /// stop path. Calling this more than once is harmless.
    pub fn terminate(&mut self) {
        if let Some(kill) = self.kill.take() {
            debug!(session = %self.id, "terminating debugger");
            // The waiter task is gone if the process already exited.
            let _ = kill.send(());
        }
    }

    /// Kill the process and wait for its stop reason.
    pub async fn shutdown(mut self) -> StopReason {
        self.terminate();
        self.stop.stopped().await
    }

    /// The process's stdout, when launched with `pass_through_stdout`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Read and throw away a passed-through stdout that nobody consumes,
    /// so the debugger never blocks on a full pipe. No-op when stdout was
    /// already taken or is forwarded to the sink.
    pub fn discard_stdout(&mut self) {
        let Some(mut stdout) = self.stdout.take() else {
            return;
        };
        let id = self.id;
        tokio::spawn(async move {
            match tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await {
                Ok(n) => debug!(session = %id, bytes = n, "discarded debugger stdout"),
                Err(e) => debug!(session = %id, "stopped discarding debugger stdout: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
        assert_eq!(a.to_string(), format!("#{}", a.raw()));
    }

    #[test]
    fn handle_exposes_endpoint_path() {
        let handle = TransportHandle::new(TransportEndpoint::new("/tmp/x/debug-a.socket"));
        assert_eq!(handle.path(), Path::new("/tmp/x/debug-a.socket"));
        assert_eq!(handle.endpoint().address(), "unix:///tmp/x/debug-a.socket");
    }

    #[tokio::test]
    async fn terminate_sends_kill_once() {
        let (tx, mut rx) = oneshot::channel();
        let stop = StopSignal::new();
        let mut session = DebugSession::new(
            SessionId::next(),
            TransportHandle::new(TransportEndpoint::new("/tmp/none.socket")),
            stop.clone(),
            None,
            tx,
            None,
        );
        session.terminate();
        session.terminate();
        assert!(rx.try_recv().is_ok());

        assert!(!session.has_stopped());
        stop.fire(StopReason::Exited(None));
        assert!(session.has_stopped());
        assert_eq!(session.stopped().await, StopReason::Exited(None));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn connect_to_missing_socket_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let handle = TransportHandle::new(TransportEndpoint::new(tmp.path().join("nope.socket")));
        assert!(handle.connect().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn connect_to_listening_socket() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("dbg.socket");
        let listener = tokio::net::UnixListener::bind(&path).unwrap();
        let handle = TransportHandle::new(TransportEndpoint::new(&path));

        let (accepted, connected) = tokio::join!(listener.accept(), handle.connect());
        assert!(accepted.is_ok());
        assert!(connected.is_ok());
    }
}
