//! Bridge-specific error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::mailbox::Slot;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while supervising or exchanging with the worker.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The configured worker working directory does not exist.
    #[error("worker working directory not found: {}", .0.display())]
    WorkingDirMissing(PathBuf),

    /// Failed to spawn the worker process.
    #[error("failed to spawn worker process: {0}")]
    SpawnFailed(#[source] io::Error),

    /// The mailbox directory could not be prepared at startup.
    #[error("mailbox unavailable at {}: {source}", path.display())]
    MailboxUnavailable {
        /// Directory holding the slot files.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or writing a slot failed during an exchange.
    #[error("mailbox {slot} slot I/O failed: {source}")]
    MailboxIo {
        /// Slot being accessed.
        slot: Slot,
        #[source]
        source: io::Error,
    },

    /// Failed to serialize a document.
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    /// Payload uses a key reserved for the envelope.
    #[error("payload key '{0}' is reserved")]
    InvalidPayload(String),

    /// No correlated response arrived before the deadline.
    #[error(
        "operation {operation} timed out waiting for response {correlation_id} \
         ({malformed_reads} malformed reads)"
    )]
    Timeout {
        /// Operation that was sent.
        operation: String,
        /// Identifier the engine was waiting for.
        correlation_id: String,
        /// Reads that did not decode while polling.
        malformed_reads: u32,
    },

    /// The caller cancelled the exchange while it was polling.
    #[error("operation {operation} cancelled while waiting for response {correlation_id}")]
    Cancelled {
        /// Operation that was sent.
        operation: String,
        /// Identifier the engine was waiting for.
        correlation_id: String,
    },

    /// Worker answered with `status: "error"`.
    #[error("worker error: {message}")]
    Remote {
        /// Message reported by the worker.
        message: String,
    },

    /// A successful response carried data of an unexpected shape.
    #[error("unexpected response data: {0}")]
    InvalidData(#[source] serde_json::Error),
}

impl BridgeError {
    /// Create a remote error from a worker message.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Check if this error is a worker-reported domain failure.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Check if the whole exchange can be resubmitted with a new id.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::MailboxIo { .. } | Self::Cancelled { .. }
        )
    }

    /// Check if this error should stop the application at startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::WorkingDirMissing(_) | Self::SpawnFailed(_) | Self::MailboxUnavailable { .. }
        )
    }

    /// Correlation id attached to this failure, if any.
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::Timeout { correlation_id, .. } | Self::Cancelled { correlation_id, .. } => {
                Some(correlation_id)
            }
            _ => None,
        }
    }
}
