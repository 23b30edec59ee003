use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The walk was aborted, either by the cancellation token or by the
    /// decision sink reporting host-side cancellation.
    #[error("sync walk cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure reported by one of the tree listing backends.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Other(value)
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
