//! Mailbox crate - a credential-scoped facade over the Gmail API
//!
//! This crate provides:
//! - Credential bundle and access token loading
//! - A `MailboxService` seam with an HTTP (ureq) and an in-memory implementation
//! - Batched message retrieval that tolerates per-message failure
//! - Header lookup, body decoding and message summaries for consumers
//! - A pacing delay for callers that loop over retrievals
//!
//! Every facade call builds its own session from the caller's credentials;
//! nothing is cached between calls.

pub mod config;
pub mod error;
pub mod fetch;
pub mod gmail;
pub mod models;
pub mod pacing;

pub use config::{AccessToken, Credentials};
pub use error::{ConfigError, FetchError, SessionRejected};
pub use fetch::{FetchOptions, FetchedMessage, Mailbox, MissingMessage, get_messages};
pub use gmail::{
    GmailApi, InMemoryMailbox, MailboxService, MessageFilter, MessageFormat, ServiceResponse,
    Session, decode_message, get_header_value, message_html, message_text, summarize,
};
pub use models::{EmailAddress, Label, LabelId, MessageId, MessageSummary, label_sort_order};
pub use pacing::{Pacer, timer};
