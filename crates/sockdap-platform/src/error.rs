use thiserror::Error;

/// Errors that can occur during platform operations.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("path error: {0}")]
    Path(String),

    #[error("scratch directory unavailable: {0}")]
    Scratch(#[source] std::io::Error),
}
