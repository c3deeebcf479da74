use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("Preview runtime not found: {0}")]
    RuntimeNotFound(String),
    #[error("Failed to spawn preview runtime")]
    ProcessSpawnFailed,
    #[error("Failed to capture runtime stdin")]
    StdinCaptureFailed,
    #[error("Failed to capture runtime stdout")]
    StdoutCaptureFailed,
    #[error("Boundary backend error: {0}")]
    Backend(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
