// src/socket/error.rs
use super::Transport;
use std::io;
use std::path::PathBuf;

/// Failure of a single [`listen`](crate::socket::listen) step.
///
/// Every variant except `UnsupportedTransport` wraps the OS error of the
/// step that failed.
#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to set mode {mode:#o} on {}: {source}", .path.display())]
    Permissions {
        path: PathBuf,
        mode: u32,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move socket {} to {}: {source}", .from.display(), .to.display())]
    Publish {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Transport {0} is not supported on this platform")]
    UnsupportedTransport(Transport),
}

impl ListenError {
    /// The underlying OS error, if the failure came from a system call.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            ListenError::Bind { source, .. }
            | ListenError::Resolve { source, .. }
            | ListenError::Permissions { source, .. }
            | ListenError::Publish { source, .. } => Some(source),
            ListenError::UnsupportedTransport(_) => None,
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.io_error()
            .map(io::Error::kind)
            .unwrap_or(io::ErrorKind::Unsupported)
    }
}

impl From<ListenError> for io::Error {
    fn from(err: ListenError) -> Self {
        io::Error::new(err.kind(), err)
    }
}
