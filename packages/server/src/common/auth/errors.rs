use thiserror::Error;

/// Authentication errors raised while resolving the caller of a request.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
