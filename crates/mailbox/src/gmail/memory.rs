//! In-memory mailbox service
//!
//! Used by tests and demos in place of the Gmail API. It keeps messages in
//! insertion order, counts every request, and can be told to answer specific
//! ids with an error status or to reject every session.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::api::{GmailMessage, Label, ListMessagesResponse, MessageRef};
use super::{MailboxService, MessageFilter, MessageFormat, ServiceResponse, Session};
use crate::error::SessionRejected;
use crate::models::MessageId;

/// Page size when the filter does not set one
const DEFAULT_PAGE_SIZE: usize = 100;

/// In-memory implementation of MailboxService
pub struct InMemoryMailbox {
    messages: RwLock<Vec<GmailMessage>>,
    labels: RwLock<Vec<Label>>,
    /// Ids answered with a fixed non-success status
    failing: RwLock<HashMap<String, u16>>,
    /// When set, only sessions carrying this access token are accepted
    accepted_token: RwLock<Option<String>>,
    requests: AtomicUsize,
    requested_ids: RwLock<Vec<MessageId>>,
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMailbox {
    /// Create an empty mailbox that accepts any session
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            labels: RwLock::new(Vec::new()),
            failing: RwLock::new(HashMap::new()),
            accepted_token: RwLock::new(None),
            requests: AtomicUsize::new(0),
            requested_ids: RwLock::new(Vec::new()),
        }
    }

    /// Add a message; a message with the same id is replaced in place
    pub fn insert_message(&self, message: GmailMessage) {
        let mut messages = self.messages.write().unwrap();
        match messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message,
            None => messages.push(message),
        }
    }

    pub fn insert_label(&self, label: Label) {
        self.labels.write().unwrap().push(label);
    }

    /// Answer get/delete requests for `id` with `status` and no data
    pub fn fail_with_status(&self, id: impl Into<String>, status: u16) {
        self.failing.write().unwrap().insert(id.into(), status);
    }

    /// Reject every session whose access token differs from `token`
    pub fn accept_only_token(&self, token: impl Into<String>) {
        *self.accepted_token.write().unwrap() = Some(token.into());
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Ids passed to `get_message`, in the order they were requested
    pub fn requested_ids(&self) -> Vec<MessageId> {
        self.requested_ids.read().unwrap().clone()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages
            .read()
            .unwrap()
            .iter()
            .any(|m| m.id == id.as_str())
    }

    fn begin_request(&self, session: &Session) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let accepted = self.accepted_token.read().unwrap();
        if let Some(token) = accepted.as_deref()
            && session.token().access_token != token
        {
            return Err(SessionRejected { status: 401 }.into());
        }
        Ok(())
    }

    fn failing_status(&self, id: &MessageId) -> Option<u16> {
        self.failing.read().unwrap().get(id.as_str()).copied()
    }
}

impl MailboxService for InMemoryMailbox {
    fn list_labels(&self, session: &Session) -> Result<Vec<Label>> {
        self.begin_request(session)?;
        Ok(self.labels.read().unwrap().clone())
    }

    fn list_messages(
        &self,
        session: &Session,
        filter: &MessageFilter,
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse> {
        self.begin_request(session)?;

        let messages = self.messages.read().unwrap();
        let matching: Vec<MessageRef> = messages
            .iter()
            .filter(|m| {
                let labels = m.label_ids.as_deref().unwrap_or(&[]);
                filter.label_ids.iter().all(|l| labels.contains(l))
            })
            .map(|m| MessageRef {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
            })
            .collect();

        // Page tokens are plain offsets
        let start = page_token
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0)
            .min(matching.len());
        let page_size = filter.max_results.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let end = (start + page_size).min(matching.len());
        let page = matching[start..end].to_vec();

        Ok(ListMessagesResponse {
            messages: if page.is_empty() { None } else { Some(page) },
            next_page_token: (end < matching.len()).then(|| end.to_string()),
            result_size_estimate: Some(size_estimate(matching.len())),
        })
    }

    fn delete_message(&self, session: &Session, id: &MessageId) -> Result<ServiceResponse<()>> {
        self.begin_request(session)?;

        if let Some(status) = self.failing_status(id) {
            return Ok(ServiceResponse::status_only(status));
        }

        let mut messages = self.messages.write().unwrap();
        let before = messages.len();
        messages.retain(|m| m.id != id.as_str());

        if messages.len() < before {
            Ok(ServiceResponse::ok(204, ()))
        } else {
            Ok(ServiceResponse::status_only(404))
        }
    }

    fn get_message(
        &self,
        session: &Session,
        id: &MessageId,
        format: MessageFormat,
    ) -> Result<ServiceResponse<GmailMessage>> {
        self.begin_request(session)?;
        self.requested_ids.write().unwrap().push(id.clone());

        if let Some(status) = self.failing_status(id) {
            return Ok(ServiceResponse::status_only(status));
        }

        let messages = self.messages.read().unwrap();
        let Some(message) = messages.iter().find(|m| m.id == id.as_str()) else {
            return Ok(ServiceResponse::status_only(404));
        };

        let mut message = message.clone();
        if format == MessageFormat::Minimal {
            message.payload = None;
        }
        Ok(ServiceResponse::ok(200, message))
    }
}

/// Result count as the API reports it, saturating at `u32::MAX`
fn size_estimate(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
