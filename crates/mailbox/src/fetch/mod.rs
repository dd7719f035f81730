//! Batched message retrieval
//!
//! Each identifier is fetched independently. A retrieval the service does
//! not answer with success becomes a `FetchedMessage::Missing` at that
//! position; it never stops the rest of the batch. Only an empty id list or
//! an upstream failure (transport, rejected session) fails the whole call.

mod facade;

pub use facade::Mailbox;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;

use crate::error::FetchError;
use crate::gmail::api::GmailMessage;
use crate::gmail::{MailboxService, MessageFormat, Session};
use crate::models::MessageId;

/// Outcome for one identifier of a batch
#[derive(Debug, Clone)]
pub enum FetchedMessage {
    Found(Box<GmailMessage>),
    Missing(MissingMessage),
}

impl FetchedMessage {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn as_message(&self) -> Option<&GmailMessage> {
        match self {
            Self::Found(message) => Some(&**message),
            Self::Missing(_) => None,
        }
    }

    pub fn as_missing(&self) -> Option<&MissingMessage> {
        match self {
            Self::Found(_) => None,
            Self::Missing(missing) => Some(missing),
        }
    }

    pub fn into_message(self) -> Option<GmailMessage> {
        match self {
            Self::Found(message) => Some(*message),
            Self::Missing(_) => None,
        }
    }
}

/// Failure marker for an identifier whose retrieval did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMessage {
    pub id: MessageId,
    /// Status the service answered with
    pub status: u16,
}

impl fmt::Display for MissingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message not found by identifier {}", self.id)
    }
}

/// Knobs for a batch fetch
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub format: MessageFormat,
    /// Requests in flight at once. 1 fetches strictly in input order.
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            format: MessageFormat::Full,
            concurrency: 1,
        }
    }
}

impl FetchOptions {
    pub fn with_format(mut self, format: MessageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Fetch every id in `ids` over one session
///
/// The result has one entry per input id, in input order, whatever mix of
/// successes and failures the service returns. Duplicate ids are fetched
/// once per occurrence.
///
/// # Errors
/// `FetchError::NoIdentifiers` if `ids` is empty, before any request is
/// sent. Upstream errors from the service abort the call and are returned
/// unchanged.
pub fn get_messages<S>(
    service: &S,
    session: &Session,
    ids: &[MessageId],
    options: &FetchOptions,
) -> Result<Vec<FetchedMessage>>
where
    S: MailboxService + ?Sized,
{
    if ids.is_empty() {
        return Err(FetchError::NoIdentifiers.into());
    }

    info!(
        "Fetching {} messages (concurrency {})",
        ids.len(),
        options.concurrency
    );

    // No more threads than ids
    let workers = options.concurrency.min(ids.len());

    let results = if workers <= 1 {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push(fetch_one(service, session, id, options.format)?);
        }
        results
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .context("Failed to build fetch thread pool")?;

        // Indexed collect keeps input order
        pool.install(|| {
            ids.par_iter()
                .map(|id| fetch_one(service, session, id, options.format))
                .collect::<Result<Vec<_>>>()
        })?
    };

    let missing = results.iter().filter(|r| !r.is_found()).count();
    info!(
        "Fetched {} messages ({} missing)",
        results.len() - missing,
        missing
    );

    Ok(results)
}

fn fetch_one<S>(
    service: &S,
    session: &Session,
    id: &MessageId,
    format: MessageFormat,
) -> Result<FetchedMessage>
where
    S: MailboxService + ?Sized,
{
    debug!("Fetching message {}", id);
    let response = service.get_message(session, id, format)?;

    let status = response.status;
    match (response.is_success(), response.data) {
        (true, Some(message)) => Ok(FetchedMessage::Found(Box::new(message))),
        _ => {
            let missing = MissingMessage {
                id: id.clone(),
                status,
            };
            warn!("{} (HTTP {})", missing, status);
            Ok(FetchedMessage::Missing(missing))
        }
    }
}
