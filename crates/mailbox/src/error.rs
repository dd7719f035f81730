//! Typed errors surfaced by the facade
//!
//! Most fallible calls return `anyhow::Result`; these types are the ones a
//! caller may want to `downcast_ref` and react to.

/// Precondition failures of the batch fetcher
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FetchError {
    /// `get_messages` was called with an empty identifier list
    #[error("Message id not passed: no identifiers supplied")]
    NoIdentifiers,
}

/// Credential bundle shape violations, caught when the bundle is built
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("client_id is empty")]
    MissingClientId,

    #[error("client_secret is empty")]
    MissingClientSecret,

    #[error("redirect_uris must contain at least one URI")]
    MissingRedirectUri,
}

/// The mailbox service refused the session (invalid or expired credentials)
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Session rejected by mailbox service (HTTP {status})")]
pub struct SessionRejected {
    pub status: u16,
}

impl SessionRejected {
    /// Whether an HTTP status means the session itself was refused
    pub fn is_rejection(status: u16) -> bool {
        status == 401 || status == 403
    }
}
