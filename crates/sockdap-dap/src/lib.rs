//! sockdap-dap: launches and supervises socket-transport debug adapters.
//!
//! A launch reserves a socket path, spawns the debugger pointed at it,
//! forwards the debugger's output to a diagnostic sink, and waits until
//! either the socket appears or the process dies. The resulting
//! [`DebugSession`] owns the process and the socket path; when the process
//! goes away the socket file is removed.

pub mod args;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod monitor;
pub mod session;
pub mod stop;
pub mod supervisor;
pub mod tool;

pub use args::{LaunchArguments, LaunchOptions};
pub use descriptor::{AdapterDescriptor, DescriptorFactory};
pub use error::DapError;
pub use host::{DebugHost, LoggingHost};
pub use monitor::{ProcessEvent, ProcessMonitor};
pub use session::{DebugSession, SessionId, TransportHandle};
pub use stop::{StopReason, StopSignal};
pub use supervisor::{LaunchRequest, Supervisor, DEFAULT_POLL_INTERVAL};
pub use tool::{SearchPathLocator, ToolInvocation, ToolLocator};
