use std::fmt;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Where a piece of diagnostic output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// The command line used to spawn a debugger process.
    Command,
    /// Bytes forwarded from the process's standard output.
    Stdout,
    /// Bytes forwarded from the process's standard error.
    Stderr,
    /// Lifecycle notes written by the supervisor (exit codes, errors).
    Status,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Command => write!(f, "command"),
            OutputKind::Stdout => write!(f, "stdout"),
            OutputKind::Stderr => write!(f, "stderr"),
            OutputKind::Status => write!(f, "status"),
        }
    }
}

/// A single chunk appended to an [`OutputChannel`].
#[derive(Debug, Clone)]
pub struct OutputEntry {
    kind: OutputKind,
    text: String,
    timestamp: Instant,
}

impl OutputEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(kind: OutputKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp: Instant::now(),
        }
    }

    /// The origin of this chunk.
    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    /// The raw text, including any trailing newline.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the chunk was appended.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
}

/// An append-only, session-scoped text channel for debugger diagnostics.
///
/// The supervisor writes the spawn command line, forwarded process output,
/// exit codes and errors here, and calls [`show`](DiagnosticSink::show)
/// when the user should look at it.
pub trait DiagnosticSink: Send + Sync {
    /// Append a chunk of text verbatim.
    fn append(&self, kind: OutputKind, text: &str);

    /// Append a chunk of text followed by a newline.
    fn append_line(&self, kind: OutputKind, line: &str) {
        self.append(kind, &format!("{line}\n"));
    }

    /// Ask for the channel to be made visible to the user.
    fn show(&self);
}

#[derive(Debug)]
struct ChannelState {
    entries: Vec<OutputEntry>,
    max_entries: usize,
    show_requests: usize,
}

/// In-memory [`DiagnosticSink`] that retains the most recent chunks.
///
/// Chunks are stored as they arrive (process output is not line-aligned),
/// and the oldest are dropped once `max_entries` is exceeded.
#[derive(Debug)]
pub struct OutputChannel {
    name: String,
    state: Mutex<ChannelState>,
}

impl OutputChannel {
    /// Default maximum number of chunks retained.
    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

    /// Create an empty channel with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_max_entries(name, Self::DEFAULT_MAX_ENTRIES)
    }

    /// Create a channel with a custom retention limit.
    pub fn with_max_entries(name: impl Into<String>, max_entries: usize) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ChannelState {
                entries: Vec::new(),
                max_entries,
                show_requests: 0,
            }),
        }
    }

    /// The channel's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of chunks currently retained.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether nothing has been appended (or everything was cleared).
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Snapshot of the retained chunks, oldest first.
    pub fn entries(&self) -> Vec<OutputEntry> {
        self.lock().entries.clone()
    }

    /// Retained chunks of one kind, oldest first.
    pub fn entries_of(&self, kind: OutputKind) -> Vec<OutputEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// How many times [`show`](DiagnosticSink::show) has been requested.
    pub fn show_requests(&self) -> usize {
        self.lock().show_requests
    }

    /// Whether the channel has been asked to become visible at least once.
    pub fn was_shown(&self) -> bool {
        self.show_requests() > 0
    }

    /// The maximum number of chunks this channel retains.
    pub fn max_entries(&self) -> usize {
        self.lock().max_entries
    }

    /// Concatenate all retained chunks.
    pub fn contents(&self) -> String {
        self.lock().entries.iter().map(|e| e.text.as_str()).collect()
    }

    /// Drop all retained chunks.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for OutputChannel {
    fn default() -> Self {
        Self::new("sockdap")
    }
}

impl DiagnosticSink for OutputChannel {
    fn append(&self, kind: OutputKind, text: &str) {
        let mut state = self.lock();
        state.entries.push(OutputEntry::new(kind, text));
        if state.entries.len() > state.max_entries {
            let excess = state.entries.len() - state.max_entries;
            state.entries.drain(..excess);
        }
    }

    fn show(&self) {
        self.lock().show_requests += 1;
    }
}

/// [`DiagnosticSink`] for the command line.
///
/// In quiet mode output is only buffered; the first `show` request dumps
/// the buffer to stderr and switches to echoing everything that follows.
/// In verbose mode every chunk goes straight to stderr.
#[derive(Debug)]
pub struct StderrSink {
    buffer: OutputChannel,
    echo: Mutex<bool>,
}

impl StderrSink {
    /// Create a sink; `verbose` echoes output immediately.
    pub fn new(verbose: bool) -> Self {
        Self {
            buffer: OutputChannel::default(),
            echo: Mutex::new(verbose),
        }
    }

    /// The buffered output, regardless of echo mode.
    pub fn buffer(&self) -> &OutputChannel {
        &self.buffer
    }

    fn write_stderr(text: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = stderr.write_all(text.as_bytes()).and_then(|()| stderr.flush()) {
            tracing::debug!("failed to write diagnostic output: {}", e);
        }
    }
}

impl DiagnosticSink for StderrSink {
    fn append(&self, kind: OutputKind, text: &str) {
        self.buffer.append(kind, text);
        let echo = self.echo.lock().unwrap_or_else(PoisonError::into_inner);
        if *echo {
            Self::write_stderr(text);
        }
    }

    fn show(&self) {
        self.buffer.show();
        let mut echo = self.echo.lock().unwrap_or_else(PoisonError::into_inner);
        if !*echo {
            Self::write_stderr(&self.buffer.contents());
            *echo = true;
        }
    }
}
