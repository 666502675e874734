//! Turns process exit/error events into a single stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sockdap_core::{DiagnosticSink, OutputKind};
use sockdap_platform::TransportEndpoint;
use tracing::{debug, info, warn};

use crate::host::DebugHost;
use crate::session::SessionId;
use crate::stop::{StopReason, StopSignal};

/// Something that happened to a supervised process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// The process exited; `None` when killed by a signal.
    Exited(Option<i32>),
    /// The process could not be spawned or waited on.
    Error(String),
}

impl ProcessEvent {
    fn reason(&self) -> StopReason {
        match self {
            ProcessEvent::Exited(code) => StopReason::Exited(*code),
            ProcessEvent::Error(err) => StopReason::Failed(err.clone()),
        }
    }
}

/// Per-session handler for process events.
///
/// Every event is written to the sink. Only the first event removes the
/// endpoint file, tells the host to end the session and fires the stop
/// signal, in that order, so waiters never see a stale endpoint.
pub struct ProcessMonitor {
    session: SessionId,
    claimed: AtomicBool,
    endpoint: TransportEndpoint,
    stop: StopSignal,
    sink: Arc<dyn DiagnosticSink>,
    host: Arc<dyn DebugHost>,
}

impl ProcessMonitor {
    pub fn new(
        session: SessionId,
        endpoint: TransportEndpoint,
        stop: StopSignal,
        sink: Arc<dyn DiagnosticSink>,
        host: Arc<dyn DebugHost>,
    ) -> Self {
        Self {
            session,
            claimed: AtomicBool::new(false),
            endpoint,
            stop,
            sink,
            host,
        }
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Handle one event. Returns whether this event stopped the session.
    pub fn handle(&self, event: ProcessEvent) -> bool {
        let first = !self.claimed.swap(true, Ordering::AcqRel);

        match &event {
            ProcessEvent::Exited(code) => {
                let shown = code.map_or_else(
                    || "none (killed by signal)".to_string(),
                    |c| c.to_string(),
                );
                self.sink
                    .append_line(OutputKind::Status, &format!("Exited with code {shown}"));
                if matches!(code, Some(c) if *c != 0) {
                    self.sink.show();
                }
            }
            ProcessEvent::Error(err) => {
                self.sink
                    .append_line(OutputKind::Status, &format!("Exited with error {err}"));
                self.sink.show();
            }
        }

        if !first {
            debug!(session = %self.session, ?event, "debugger already stopped");
            return false;
        }

        match &event {
            ProcessEvent::Exited(code) => {
                info!(session = %self.session, code = ?code, "debugger exited");
            }
            ProcessEvent::Error(err) => {
                warn!(session = %self.session, error = %err, "debugger failed");
            }
        }
        self.endpoint.remove();
        self.host.stop_debugging(self.session);
        self.stop.fire(event.reason());
        true
    }
}

impl std::fmt::Debug for ProcessMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessMonitor")
            .field("session", &self.session)
            .field("endpoint", &self.endpoint)
            .field("stopped", &self.stop.has_fired())
            .finish()
    }
}
