//! sockdap-core: shared building blocks for the sockdap workspace.
//!
//! Holds the diagnostic output channel that debugger processes write
//! into, and the log-file helpers used by the binary's tracing setup.

pub mod logging;
pub mod output;

pub use output::{DiagnosticSink, OutputChannel, OutputEntry, OutputKind, StderrSink};
