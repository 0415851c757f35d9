use hyper::StatusCode;
use thiserror::Error;

/// Result type for blob store operations.
pub type Result<T> = std::result::Result<T, BlobStoreError>;

/// Coarse classification of a failed blob store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The exchange never produced a response: DNS, refused connection, reset, timeout.
    Transport,
    /// The server answered with a status the operation does not accept.
    Protocol,
    /// The response body could not be interpreted.
    Parse,
    /// The request could not be built from the given name or configuration.
    InvalidInput,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Parse => "parse",
            ErrorKind::InvalidInput => "invalid input",
        }
    }
}

/// Error returned by every [`DavBlobStore`](crate::blob_store::DavBlobStore) operation.
///
/// The message never contains the configured password.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct BlobStoreError {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BlobStoreError {
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind: ErrorKind::Transport,
            message: error.to_string(),
            status: None,
            source: Some(Box::new(error)),
        }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: format!("request timed out after {after:?}"),
            status: None,
            source: None,
        }
    }

    /// Non-success response; the message is the status line, e.g. `500 Internal Server Error`.
    pub fn protocol(status: StatusCode) -> Self {
        let message = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        Self {
            kind: ErrorKind::Protocol,
            message,
            status: Some(status),
            source: None,
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self {
            kind: ErrorKind::Parse,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status of a protocol error.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    pub fn is_protocol(&self) -> bool {
        self.kind == ErrorKind::Protocol
    }

    pub fn is_parse(&self) -> bool {
        self.kind == ErrorKind::Parse
    }
}
