use indexmap::IndexMap;
use serde::Serialize;
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use super::Message;
use crate::roster::{ChildId, ChildProfile};

const PARENT_PREFIX: &str = "You: ";
const ELLIPSIS: char = '…';

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary<'a> {
    pub child: &'a ChildProfile,
    pub last_message: Option<&'a Message>,
    pub unread_count: usize,
    pub pinned: bool,
}

impl<'a> ConversationSummary<'a> {
    pub fn last_activity(&self) -> Option<OffsetDateTime> {
        self.last_message.map(|message| message.created_at)
    }

    pub fn preview(&self, width: usize) -> Option<String> {
        self.last_message.map(|message| preview_text(message, width))
    }
}

/// One-line preview of a message for the conversation list: at most `width`
/// graphemes of content, with an ellipsis only when something was cut.
pub fn preview_text(message: &Message, width: usize) -> String {
    let mut preview = String::new();
    if message.is_from_parent() {
        preview.push_str(PARENT_PREFIX);
    }
    let mut graphemes = message.content.graphemes(true);
    preview.extend(graphemes.by_ref().take(width));
    if graphemes.next().is_some() {
        preview.push(ELLIPSIS);
    }
    preview
}

/// Builds one summary per roster entry from already-filtered messages.
///
/// Pinned conversations come first. Inside each tier conversations with a
/// matching message are ordered newest first, while conversations without one
/// keep the slot they had in roster order.
pub fn derive_conversations<'a>(
    messages: &[&'a Message],
    roster: &'a [ChildProfile],
) -> Vec<ConversationSummary<'a>> {
    let mut partitions: IndexMap<&ChildId, Vec<&'a Message>> = roster
        .iter()
        .map(|child| (&child.id, Vec::new()))
        .collect();
    for &message in messages {
        if let Some(bucket) = partitions.get_mut(&message.child_id) {
            bucket.push(message);
        }
    }

    let summaries = roster.iter().map(|child| {
        let bucket = partitions
            .get(&child.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        // `max_by_key` keeps the last of equal timestamps, i.e. the latest appended.
        let last_message = bucket.iter().copied().max_by_key(|message| message.created_at);
        ConversationSummary {
            child,
            last_message,
            unread_count: bucket
                .iter()
                .filter(|message| message.is_unread_incoming())
                .count(),
            pinned: last_message.map(|message| message.pinned).unwrap_or(false),
        }
    });

    let (pinned, unpinned): (Vec<_>, Vec<_>) = summaries.partition(|summary| summary.pinned);
    let mut ordered = order_tier(pinned);
    ordered.extend(order_tier(unpinned));
    ordered
}

fn order_tier(tier: Vec<ConversationSummary<'_>>) -> Vec<ConversationSummary<'_>> {
    let mut dated: Vec<_> = tier
        .iter()
        .filter(|summary| summary.last_message.is_some())
        .cloned()
        .collect();
    dated.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
    let mut dated = dated.into_iter();

    tier.into_iter()
        .map(|summary| {
            if summary.last_message.is_some() {
                dated.next().unwrap_or(summary)
            } else {
                summary
            }
        })
        .collect()
}
