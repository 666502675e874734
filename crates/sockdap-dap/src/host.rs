use crate::session::SessionId;

/// The front end that owns debug sessions.
///
/// The supervisor calls [`stop_debugging`](Self::stop_debugging) once per
/// session, when its debugger process goes away.
pub trait DebugHost: Send + Sync {
    /// End the session in the front end.
    fn stop_debugging(&self, session: SessionId);
}

/// A host that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHost;

impl DebugHost for LoggingHost {
    fn stop_debugging(&self, session: SessionId) {
        tracing::info!(session = %session, "debug session ended");
    }
}
