use time::{Duration, OffsetDateTime};

use super::{Author, DeliveryStatus, Message, MessageId, MessageKind};
use crate::roster::{ChildId, ChildProfile};

struct SeedMessage {
    child: &'static str,
    minutes_ago: i64,
    content: &'static str,
    read: bool,
    author: Author,
    kind: MessageKind,
    pinned: bool,
    starred: bool,
}

const fn parent(status: DeliveryStatus) -> Author {
    Author::Parent { status }
}

const SEED: [SeedMessage; 6] = [
    SeedMessage {
        child: "1",
        minutes_ago: 120,
        content: "Great job on completing your math homework! You've improved so much this week. 🎉",
        read: true,
        author: parent(DeliveryStatus::Read),
        kind: MessageKind::Achievement,
        pinned: false,
        starred: true,
    },
    SeedMessage {
        child: "3",
        minutes_ago: 240,
        content: "I noticed you missed your reading quiz yesterday. Let's schedule some extra practice time together. 📚",
        read: false,
        author: parent(DeliveryStatus::Delivered),
        kind: MessageKind::Alert,
        pinned: true,
        starred: false,
    },
    SeedMessage {
        child: "2",
        minutes_ago: 360,
        content: "Your 25-day study streak is amazing! Keep up the excellent work. Maybe we can celebrate this weekend? 🏆",
        read: true,
        author: parent(DeliveryStatus::Read),
        kind: MessageKind::Achievement,
        pinned: false,
        starred: true,
    },
    SeedMessage {
        child: "1",
        minutes_ago: 60,
        content: "Thank you for the encouragement! I'm really enjoying the new math unit on fractions.",
        read: true,
        author: Author::Counterpart,
        kind: MessageKind::Text,
        pinned: false,
        starred: false,
    },
    SeedMessage {
        child: "1",
        minutes_ago: 30,
        content: "That's wonderful to hear! Your positive attitude makes such a difference. Keep asking questions! 💪",
        read: true,
        author: parent(DeliveryStatus::Read),
        kind: MessageKind::Text,
        pinned: false,
        starred: false,
    },
    SeedMessage {
        child: "2",
        minutes_ago: 300,
        content: "I finished the outline for my science fair project. Can you look at it tonight?",
        read: false,
        author: Author::Counterpart,
        kind: MessageKind::Progress,
        pinned: false,
        starred: false,
    },
];

/// Demo conversation history relative to `now`. Messages for children missing
/// from `roster` are skipped.
pub fn sample_messages(roster: &[ChildProfile], now: OffsetDateTime) -> Vec<Message> {
    SEED.iter()
        .enumerate()
        .filter_map(|(index, seed)| {
            let child_id = ChildId::new(seed.child);
            let child = roster.iter().find(|child| child.id == child_id)?;
            Some(Message {
                id: MessageId(index as u64 + 1),
                child_id,
                child_name: child.name.clone(),
                child_avatar: child.avatar.clone(),
                content: seed.content.to_string(),
                created_at: now - Duration::minutes(seed.minutes_ago),
                read: seed.read,
                author: seed.author,
                kind: seed.kind,
                pinned: seed.pinned,
                starred: seed.starred,
            })
        })
        .collect()
}
