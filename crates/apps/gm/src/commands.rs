//! Command-line arguments and command execution

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use mailbox::pacing::Pacer;
use mailbox::{
    AccessToken, Credentials, FetchOptions, FetchedMessage, Label, Mailbox, MailboxService,
    MessageId, MessageSummary, label_sort_order, summarize,
};
use std::io::Write;
use std::time::Duration;

/// Messages fetched per request burst when pacing an inbox listing
const PACED_CHUNK: usize = 25;

#[derive(Parser, Debug)]
#[clap(
    name = "gm",
    version,
    about = "Read and manage a Gmail mailbox from the command line"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the mailbox labels, system labels first.
    Labels,

    /// Summarize unread inbox messages.
    Inbox {
        /// Follow pagination instead of stopping at the first page.
        #[clap(long)]
        all: bool,
        /// Minimum delay in milliseconds between fetch bursts.
        #[clap(long, value_name = "MS")]
        pace: Option<u64>,
    },

    /// Fetch messages by id, printing a marker for each one not found.
    Get {
        /// Print each message as a JSON line.
        #[clap(long)]
        json: bool,
        /// Requests in flight at once.
        #[clap(long, default_value = "1")]
        concurrency: usize,
        /// Message ids, printed back in this order.
        ids: Vec<String>,
    },

    /// Permanently delete one message.
    Delete {
        /// Message id
        id: String,
    },
}

/// Run `command` against `mailbox`, writing results to `out`
pub fn execute<S, W>(
    mailbox: &Mailbox<S>,
    credentials: &Credentials,
    token: &AccessToken,
    command: Command,
    out: &mut W,
) -> Result<()>
where
    S: MailboxService,
    W: Write,
{
    match command {
        Command::Labels => {
            let mut labels: Vec<Label> = mailbox
                .list_labels(credentials, token)?
                .into_iter()
                .map(Label::from)
                .collect();
            labels.sort_by(|a, b| {
                label_sort_order(a.id.as_str())
                    .cmp(&label_sort_order(b.id.as_str()))
                    .then_with(|| a.name.cmp(&b.name))
            });

            for label in labels {
                writeln!(out, "{}\t{}", label.id.as_str(), label.name)?;
            }
        }
        Command::Inbox { all, pace } => {
            let refs = if all {
                mailbox.inbox_all(credentials, token, None)?
            } else {
                mailbox.inbox(credentials, token)?
            };
            if refs.is_empty() {
                writeln!(out, "No unread messages")?;
                return Ok(());
            }

            let ids: Vec<MessageId> = refs.iter().map(|r| MessageId::new(&r.id)).collect();
            let mut pacer = Pacer::new(Duration::from_millis(pace.unwrap_or(0)));
            for chunk in ids.chunks(PACED_CHUNK) {
                pacer.wait();
                for result in mailbox.get_messages(credentials, token, chunk)? {
                    write_result(out, &result)?;
                }
            }
        }
        Command::Get {
            ids,
            json,
            concurrency,
        } => {
            let ids: Vec<MessageId> = ids.into_iter().map(MessageId::from).collect();
            let options = FetchOptions::default().with_concurrency(concurrency);
            let results = mailbox.get_messages_with(credentials, token, &ids, &options)?;

            for result in &results {
                if json {
                    let value = match result {
                        FetchedMessage::Found(message) => serde_json::to_value(message)?,
                        FetchedMessage::Missing(missing) => {
                            serde_json::Value::String(missing.to_string())
                        }
                    };
                    writeln!(out, "{}", value)?;
                } else {
                    write_result(out, result)?;
                }
            }
        }
        Command::Delete { id } => {
            let id = MessageId::from(id);
            let response = mailbox.delete(credentials, token, &id)?;
            if !response.is_success() {
                bail!("Failed to delete {}: HTTP {}", id, response.status);
            }
            info!("Deleted {}", id);
            writeln!(out, "Deleted {}", id)?;
        }
    }

    Ok(())
}

fn write_result<W: Write>(out: &mut W, result: &FetchedMessage) -> Result<()> {
    match result {
        FetchedMessage::Found(message) => writeln!(out, "{}", format_summary(&summarize(message)))?,
        FetchedMessage::Missing(missing) => writeln!(out, "{}", missing)?,
    }
    Ok(())
}

fn format_summary(summary: &MessageSummary) -> String {
    let date = summary
        .received_at
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let from = summary
        .from
        .as_ref()
        .map(|f| f.display())
        .unwrap_or_else(|| "(unknown sender)".to_string());
    let subject = if summary.subject.is_empty() {
        "(no subject)"
    } else {
        summary.subject.as_str()
    };

    format!("{}\t{}\t{}\t{}", summary.id, date, from, subject)
}
