//! Error types for identity verification

/// Identity verification error type
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    InvalidToken(String),

    #[error("audience mismatch: expected {expected}, got {actual}")]
    AudienceMismatch { expected: String, actual: String },

    #[error("token expired")]
    Expired,

    #[error("untrusted issuer: {0}")]
    UntrustedIssuer(String),
}

/// Result type alias for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;

impl IdentityError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        IdentityError::InvalidToken(msg.into())
    }
}

impl From<IdentityError> for focusbubble_core::Error {
    fn from(err: IdentityError) -> Self {
        focusbubble_core::Error::InvalidToken(err.to_string())
    }
}
