use thiserror::Error;

use super::remote::RemoteOrderStatus;

/// HTTP-status-derived failure kind for remote calls. Callers branch on the
/// kind, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    NotFound,
    Unauthorized,
    Conflict,
    ServerError,
    Network,
}

impl HttpErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::Unauthorized,
            409 | 422 => Self::Conflict,
            _ => Self::ServerError,
        }
    }
}

#[derive(Debug, Error)]
pub enum PayError {
    #[error("remote resource not found")]
    NotFound,

    #[error("remote fetch failed: {0}")]
    Inaccessible(String),

    #[error("already resolved: {0}")]
    AlreadyResolved(String),

    #[error("remote operation failed: {0}")]
    OperationFailed(String),

    #[error("webhook verification failed: {0}")]
    VerificationFailed(String),

    #[error("no handler registered for event type: {0}")]
    UnhandledEventType(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("order not approved yet, remote status: {status}")]
    NotApproved { status: RemoteOrderStatus },

    #[error("3-D-Secure authentication rejected")]
    ThreeDsRejected,

    #[error("remote call failed ({kind:?}): {message}")]
    Remote {
        kind: HttpErrorKind,
        message: String,
    },

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PayError {
    pub fn remote(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self::Remote {
            kind,
            message: message.into(),
        }
    }

    /// True when the underlying remote call reported a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::Remote {
                    kind: HttpErrorKind::NotFound,
                    ..
                }
        )
    }
}
