//! Domain models for mailbox entities

mod label;
mod message;

pub use label::{Label, LabelId, label_sort_order};
pub use message::{EmailAddress, MessageId, MessageSummary};
