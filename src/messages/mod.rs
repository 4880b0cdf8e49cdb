use std::fmt;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};
use time::OffsetDateTime;

use crate::roster::ChildId;

pub mod conversations;
mod delivery;
pub mod seed;
mod store;

pub use conversations::{derive_conversations, preview_text, ConversationSummary};
pub use delivery::{DeliveryStatus, DELIVERED_AFTER, READ_AFTER, SEND_LATENCY};
pub use store::{DeliveryEvent, MessageStore, SendError, StatusChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Progress,
    Alert,
    Achievement,
}

/// Who wrote a message. Only the parent's own messages carry a delivery
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "author", rename_all = "lowercase")]
pub enum Author {
    Parent { status: DeliveryStatus },
    Counterpart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub child_id: ChildId,
    pub child_name: String,
    pub child_avatar: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub read: bool,
    #[serde(flatten)]
    pub author: Author,
    pub kind: MessageKind,
    pub pinned: bool,
    pub starred: bool,
}

impl Message {
    pub fn is_from_parent(&self) -> bool {
        matches!(self.author, Author::Parent { .. })
    }

    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        match self.author {
            Author::Parent { status } => Some(status),
            Author::Counterpart => None,
        }
    }

    pub(crate) fn delivery_status_mut(&mut self) -> Option<&mut DeliveryStatus> {
        match &mut self.author {
            Author::Parent { status } => Some(status),
            Author::Counterpart => None,
        }
    }

    /// Unread and written by the child.
    pub fn is_unread_incoming(&self) -> bool {
        !self.read && !self.is_from_parent()
    }
}
