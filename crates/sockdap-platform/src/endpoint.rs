//! Transport endpoint allocation.
//!
//! An endpoint is a socket path inside the scratch directory that a
//! debugger process is told to bind. Allocation only reserves the name;
//! the spawned process creates the socket.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::debug;

use crate::error::PlatformError;
use crate::scratch::ScratchDir;

/// Length of the random part of an endpoint file name.
pub const RANDOM_NAME_LEN: usize = 10;

/// Build a string of `len` lowercase ASCII letters, each drawn uniformly.
pub fn random_name<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'a' + rng.gen_range(0..26u8)))
        .collect()
}

/// File name used for a socket endpoint: `debug-<random>.socket`.
pub fn endpoint_file_name(random: &str) -> String {
    format!("debug-{random}.socket")
}

/// Path of a local socket that a debugger process will bind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportEndpoint {
    path: PathBuf,
}

impl TransportEndpoint {
    /// Wrap an existing path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Address in the form the debugger expects: `unix://<path>`.
    pub fn address(&self) -> String {
        format!("unix://{}", self.path.display())
    }

    /// Whether something now exists at the endpoint path.
    ///
    /// # Errors
    ///
    /// "Not found" is reported as `Ok(false)`; any other failure to stat
    /// the path is returned.
    pub async fn exists(&self) -> io::Result<bool> {
        tokio::fs::try_exists(&self.path).await
    }

    /// Remove the endpoint file. Best-effort: the file may never have been
    /// created, or the process may have removed it already.
    ///
    /// Returns whether a file was actually removed.
    pub fn remove(&self) -> bool {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(endpoint = %self.path.display(), "removed endpoint");
                true
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(endpoint = %self.path.display(), "endpoint removal failed: {}", e);
                }
                false
            }
        }
    }
}

impl fmt::Display for TransportEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Hands out collision-free endpoint paths inside a [`ScratchDir`].
#[derive(Debug)]
pub struct EndpointAllocator<R = StdRng> {
    scratch: Arc<ScratchDir>,
    rng: Mutex<R>,
}

impl EndpointAllocator {
    /// Allocator seeded from OS entropy.
    pub fn new(scratch: Arc<ScratchDir>) -> Self {
        Self::with_rng(scratch, StdRng::from_entropy())
    }
}

impl<R: RngCore> EndpointAllocator<R> {
    /// Allocator with an explicit generator, e.g. a seeded one in tests.
    pub fn with_rng(scratch: Arc<ScratchDir>, rng: R) -> Self {
        Self {
            scratch,
            rng: Mutex::new(rng),
        }
    }

    /// The scratch directory endpoints are placed in.
    pub fn scratch(&self) -> &Arc<ScratchDir> {
        &self.scratch
    }

    /// Reserve a fresh `debug-<random>.socket` endpoint.
    ///
    /// # Errors
    ///
    /// Propagates scratch directory creation failures.
    pub fn allocate(&self) -> Result<TransportEndpoint, PlatformError> {
        let random = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            random_name(&mut *rng, RANDOM_NAME_LEN)
        };
        self.allocate_named(&endpoint_file_name(&random))
    }

    /// Reserve an endpoint with a caller-chosen file name.
    ///
    /// # Errors
    ///
    /// Propagates scratch directory creation failures.
    pub fn allocate_named(&self, name_hint: &str) -> Result<TransportEndpoint, PlatformError> {
        let path = self.scratch.file_path(name_hint)?;
        debug!(endpoint = %path.display(), "allocated endpoint");
        Ok(TransportEndpoint::new(path))
    }
}
