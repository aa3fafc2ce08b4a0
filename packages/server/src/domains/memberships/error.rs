use thiserror::Error;

/// Failures of the membership workflow and the group-scoped operations built on it.
///
/// Everything except `Internal` is terminal and reported to the caller as is.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("group is full")]
    CapacityExceeded,

    #[error("membership changes are closed for this event")]
    WindowClosed,

    #[error("{0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl MembershipError {
    pub fn group_not_found() -> Self {
        Self::NotFound("group not found")
    }

    pub fn membership_not_found() -> Self {
        Self::NotFound("membership not found")
    }
}
