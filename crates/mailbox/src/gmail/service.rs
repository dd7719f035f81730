//! Mailbox service trait definitions
//!
//! The facade talks to the remote mailbox only through this trait, so the
//! HTTP client and the in-memory implementation are interchangeable.

use anyhow::Result;

use super::Session;
use super::api::{GmailMessage, Label, ListMessagesResponse};
use crate::models::{LabelId, MessageId};

/// Status plus optional payload of a single service request
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse<T> {
    /// HTTP status reported by the service
    pub status: u16,
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    /// A response carrying data
    pub fn ok(status: u16, data: T) -> Self {
        Self {
            status,
            data: Some(data),
        }
    }

    /// A response with a status and no data
    pub fn status_only(status: u16) -> Self {
        Self { status, data: None }
    }

    /// A 2xx status with data present. Successful `()` responses are
    /// built with [`ServiceResponse::ok`] so they carry `Some(())`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.data.is_some()
    }
}

/// Representation requested from the get-message endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageFormat {
    /// Headers and the full decoded part tree
    #[default]
    Full,
    /// Headers only
    Metadata,
    /// Ids and labels only
    Minimal,
    /// The whole RFC 822 message as base64url
    Raw,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Metadata => "metadata",
            Self::Minimal => "minimal",
            Self::Raw => "raw",
        }
    }
}

/// Filter for listing messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Only messages carrying all of these labels
    pub label_ids: Vec<String>,
    /// Page size (1-500); the service default when None
    pub max_results: Option<usize>,
}

impl MessageFilter {
    /// Unread messages in the inbox
    pub fn inbox() -> Self {
        Self::labels([LabelId::INBOX, LabelId::UNREAD])
    }

    pub fn labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            label_ids: labels.into_iter().map(Into::into).collect(),
            max_results: None,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// Operations consumed from the remote mailbox service
///
/// Errors returned from these methods are upstream failures (transport,
/// rejected session). A request that reached the service but did not succeed
/// is reported through `ServiceResponse::status` instead.
pub trait MailboxService: Send + Sync {
    /// List all labels in the mailbox
    fn list_labels(&self, session: &Session) -> Result<Vec<Label>>;

    /// List one page of message references matching `filter`
    fn list_messages(
        &self,
        session: &Session,
        filter: &MessageFilter,
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse>;

    /// Permanently delete a message
    fn delete_message(&self, session: &Session, id: &MessageId) -> Result<ServiceResponse<()>>;

    /// Retrieve a single message
    fn get_message(
        &self,
        session: &Session,
        id: &MessageId,
        format: MessageFormat,
    ) -> Result<ServiceResponse<GmailMessage>>;
}
