//! Label model representing a Gmail label/folder

use serde::{Deserialize, Serialize};

use crate::gmail::api;

/// Unique identifier for a label (Gmail label ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub String);

impl LabelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Well-known Gmail system labels
    pub const INBOX: &'static str = "INBOX";
    pub const SENT: &'static str = "SENT";
    pub const DRAFTS: &'static str = "DRAFT";
    pub const TRASH: &'static str = "TRASH";
    pub const SPAM: &'static str = "SPAM";
    pub const STARRED: &'static str = "STARRED";
    pub const IMPORTANT: &'static str = "IMPORTANT";
    pub const UNREAD: &'static str = "UNREAD";
}

impl From<&str> for LabelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A mail label (folder)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    /// Label ID (e.g., "INBOX", "Label_123")
    pub id: LabelId,
    /// Display name
    pub name: String,
    pub is_system: bool,
    pub message_count: u32,
    pub unread_count: u32,
}

impl From<api::Label> for Label {
    fn from(raw: api::Label) -> Self {
        Self {
            is_system: raw.label_type.as_deref() == Some("system"),
            id: LabelId(raw.id),
            name: raw.name,
            message_count: raw.messages_total.unwrap_or(0),
            unread_count: raw.messages_unread.unwrap_or(0),
        }
    }
}

/// Display order for labels: system labels in a fixed order, user labels after
pub fn label_sort_order(label_id: &str) -> u32 {
    match label_id {
        LabelId::INBOX => 0,
        LabelId::STARRED => 1,
        LabelId::IMPORTANT => 2,
        LabelId::SENT => 3,
        LabelId::DRAFTS => 4,
        LabelId::SPAM => 5,
        LabelId::TRASH => 6,
        _ => 100,
    }
}
