use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};

use super::{Message, MessageId};

/// Simulated network latency between pressing send and the message showing
/// up in the thread.
pub const SEND_LATENCY: Duration = Duration::from_millis(300);
/// Time from appearing in the thread until a sent message is shown as
/// delivered.
pub const DELIVERED_AFTER: Duration = Duration::from_millis(1000);
/// Time from appearing in the thread until a sent message is shown as read.
pub const READ_AFTER: Duration = Duration::from_millis(2000);

/// Simulated transit state of a parent-authored message.
///
/// Variants are declared in transition order; the derived `Ord` is what keeps
/// a status from ever moving backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    pub fn next(self) -> Option<Self> {
        match self {
            DeliveryStatus::Sent => Some(DeliveryStatus::Delivered),
            DeliveryStatus::Delivered => Some(DeliveryStatus::Read),
            DeliveryStatus::Read => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Moves forward to `target`. Returns `false` when `target` is not ahead
    /// of the current status.
    pub fn escalate(&mut self, target: Self) -> bool {
        if target > *self {
            *self = target;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Escalation {
    pub message_id: MessageId,
    pub target: DeliveryStatus,
}

/// Work queued on the store's scheduler.
#[derive(Debug)]
pub(crate) enum DeliveryTask {
    /// A send still in transit; appended when it fires.
    Append(Box<Message>),
    Escalate(Escalation),
}

/// Offsets (from appending) at which a freshly sent message escalates.
pub(crate) const ESCALATION_PLAN: [(Duration, DeliveryStatus); 2] = [
    (DELIVERED_AFTER, DeliveryStatus::Delivered),
    (READ_AFTER, DeliveryStatus::Read),
];
