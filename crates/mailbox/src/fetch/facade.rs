//! Credential-scoped facade over a mailbox service
//!
//! Every method takes the caller's credentials and token, builds a fresh
//! session, and makes its service calls over that session only.

use anyhow::Result;
use log::{debug, info};

use super::{FetchOptions, FetchedMessage};
use crate::config::{AccessToken, Credentials};
use crate::gmail::api::{Label, MessageRef};
use crate::gmail::{GmailApi, MailboxService, MessageFilter, ServiceResponse, Session};
use crate::models::MessageId;

/// Mailbox operations scoped to a credential bundle per call
pub struct Mailbox<S = GmailApi> {
    service: S,
}

impl Mailbox<GmailApi> {
    /// Facade over the public Gmail API
    pub fn gmail() -> Self {
        Self::new(GmailApi::new())
    }
}

impl<S: MailboxService> Mailbox<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// The underlying service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Build a session for one call. No request is made here.
    pub fn auth(&self, credentials: &Credentials, token: &AccessToken) -> Session {
        debug!("Building session for client {}", credentials.client_id());
        Session::new(credentials, token)
    }

    /// All labels in the mailbox
    pub fn list_labels(&self, credentials: &Credentials, token: &AccessToken) -> Result<Vec<Label>> {
        let session = self.auth(credentials, token);
        self.service.list_labels(&session)
    }

    /// First page of unread inbox message references
    pub fn inbox(&self, credentials: &Credentials, token: &AccessToken) -> Result<Vec<MessageRef>> {
        let session = self.auth(credentials, token);
        let response = self
            .service
            .list_messages(&session, &MessageFilter::inbox(), None)?;

        if response.result_size_estimate == Some(0) {
            return Ok(Vec::new());
        }
        Ok(response.messages.unwrap_or_default())
    }

    /// Every unread inbox message reference, following pagination
    ///
    /// # Arguments
    /// * `max_messages` - Optional cap on the total returned (None = all)
    pub fn inbox_all(
        &self,
        credentials: &Credentials,
        token: &AccessToken,
        max_messages: Option<usize>,
    ) -> Result<Vec<MessageRef>> {
        let session = self.auth(credentials, token);
        let filter = MessageFilter::inbox().with_max_results(500);

        let mut all_messages = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            if max_messages.is_some_and(|max| all_messages.len() >= max) {
                break;
            }

            let response = self
                .service
                .list_messages(&session, &filter, page_token.as_deref())?;

            if let Some(messages) = response.messages {
                all_messages.extend(messages);
            }

            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        if let Some(max) = max_messages {
            all_messages.truncate(max);
        }

        info!("Listed {} inbox messages", all_messages.len());
        Ok(all_messages)
    }

    /// Permanently delete one message
    pub fn delete(
        &self,
        credentials: &Credentials,
        token: &AccessToken,
        id: &MessageId,
    ) -> Result<ServiceResponse<()>> {
        let session = self.auth(credentials, token);
        let response = self.service.delete_message(&session, id)?;
        info!("Delete {} answered HTTP {}", id, response.status);
        Ok(response)
    }

    /// Fetch full messages for `ids`, one entry per id in input order
    pub fn get_messages(
        &self,
        credentials: &Credentials,
        token: &AccessToken,
        ids: &[MessageId],
    ) -> Result<Vec<FetchedMessage>> {
        self.get_messages_with(credentials, token, ids, &FetchOptions::default())
    }

    /// Like [`Mailbox::get_messages`] with an explicit format and concurrency
    pub fn get_messages_with(
        &self,
        credentials: &Credentials,
        token: &AccessToken,
        ids: &[MessageId],
        options: &FetchOptions,
    ) -> Result<Vec<FetchedMessage>> {
        let session = self.auth(credentials, token);
        super::get_messages(&self.service, &session, ids, options)
    }
}
