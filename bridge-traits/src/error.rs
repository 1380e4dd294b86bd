use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure came from the network layer rather than the host.
    pub fn is_network(&self) -> bool {
        matches!(self, BridgeError::Timeout(_) | BridgeError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
