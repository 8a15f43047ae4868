use thiserror::Error;
use uuid::Uuid;

/// Outcome classification for a single delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Malformed or orphaned job; dropped without retry.
    #[error("invalid job: {0}")]
    Validation(String),
    /// Network error or rate limit; retried with backoff up to the cap.
    #[error("transient delivery failure: {0}")]
    Transient(String),
    /// Recipient unreachable or blocked the channel; never retried.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The campaign is not in the status the trigger expects. Expected
    /// under concurrent triggers; callers treat it as a skip.
    #[error("campaign {0} already dispatched")]
    Conflict(Uuid),
    #[error("campaign not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
