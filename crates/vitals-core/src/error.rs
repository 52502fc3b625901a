//! Shared error type across vitals crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// No metric or namespace under that name.
    NotFound,
    /// Name already taken, or clashes with an existing namespace.
    Conflict,
    /// Name outside the caller's store view.
    NotAllowed,
    /// Unsupported API version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Conflict => "CONFLICT",
            ClientCode::NotAllowed => "NOT_ALLOWED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VitalsError>;

/// Unified error type used by core and server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VitalsError {
    #[error("metric name already registered: {0}")]
    DuplicateName(String),
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("metric name {name} clashes with namespace of {existing}")]
    PrefixConflict { name: String, existing: String },
    #[error("metric name outside store view: {0}")]
    OutsideView(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported api version")]
    UnsupportedVersion,
    #[error("monitoring server crashed: {0}")]
    ServerCrash(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl VitalsError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            VitalsError::DuplicateName(_) | VitalsError::PrefixConflict { .. } => {
                ClientCode::Conflict
            }
            VitalsError::InvalidName(_) | VitalsError::BadRequest(_) => ClientCode::BadRequest,
            VitalsError::OutsideView(_) => ClientCode::NotAllowed,
            VitalsError::NotFound(_) => ClientCode::NotFound,
            VitalsError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            VitalsError::ServerCrash(_) | VitalsError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Registration errors are programmer errors; everything else is runtime.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            VitalsError::DuplicateName(_)
                | VitalsError::InvalidName(_)
                | VitalsError::PrefixConflict { .. }
                | VitalsError::OutsideView(_)
        )
    }
}
