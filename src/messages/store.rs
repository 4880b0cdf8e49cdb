use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;

use super::conversations::{derive_conversations, ConversationSummary};
use super::delivery::{DeliveryTask, Escalation, ESCALATION_PLAN, SEND_LATENCY};
use super::seed::sample_messages;
use super::{Author, DeliveryStatus, Message, MessageId, MessageKind};
use crate::roster::{ChildId, RosterProvider};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::search::{filter_messages, FilterState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("message text is empty")]
    EmptyText,
    #[error("unknown child {0}")]
    UnknownChild(ChildId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub message_id: MessageId,
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
}

/// Something a timer did to the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryEvent {
    /// A send finished its transit and is now in the thread as `sent`.
    Appended(MessageId),
    Status(StatusChange),
}

impl DeliveryEvent {
    pub fn message_id(&self) -> MessageId {
        match self {
            DeliveryEvent::Appended(id) => *id,
            DeliveryEvent::Status(change) => change.message_id,
        }
    }
}

/// In-memory message list plus the timers that carry a send through transit
/// and then escalate it. Message timestamps are `epoch` plus the scheduler's
/// virtual time.
pub struct MessageStore {
    roster: Arc<dyn RosterProvider>,
    messages: Vec<Message>,
    scheduler: Scheduler<DeliveryTask>,
    in_flight: HashMap<MessageId, Vec<TimerHandle>>,
    outbox: Vec<MessageId>,
    epoch: OffsetDateTime,
    next_id: u64,
}

impl MessageStore {
    pub fn new(roster: Arc<dyn RosterProvider>, seed: Vec<Message>, epoch: OffsetDateTime) -> Self {
        let next_id = seed.iter().map(|message| message.id.0).max().unwrap_or(0) + 1;
        Self {
            roster,
            messages: seed,
            scheduler: Scheduler::new(),
            in_flight: HashMap::new(),
            outbox: Vec::new(),
            epoch,
            next_id,
        }
    }

    pub fn with_sample_data(roster: Arc<dyn RosterProvider>, epoch: OffsetDateTime) -> Self {
        let seed = sample_messages(roster.profiles(), epoch);
        Self::new(roster, seed, epoch)
    }

    pub fn roster(&self) -> &dyn RosterProvider {
        self.roster.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn now(&self) -> OffsetDateTime {
        self.epoch + self.scheduler.now()
    }

    pub fn elapsed(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn filtered(&self, filter: &FilterState) -> Vec<&Message> {
        filter_messages(&self.messages, filter)
    }

    pub fn conversation_summaries(&self, filter: &FilterState) -> Vec<ConversationSummary<'_>> {
        let filtered = self.filtered(filter);
        derive_conversations(&filtered, self.roster.profiles())
    }

    /// Thread for one child under `filter`, in the order messages were added.
    pub fn messages_for(&self, child_id: &ChildId, filter: &FilterState) -> Vec<&Message> {
        filter_messages(
            self.messages
                .iter()
                .filter(|message| &message.child_id == child_id),
            filter,
        )
    }

    pub fn unread_total(&self) -> usize {
        self.messages
            .iter()
            .filter(|message| message.is_unread_incoming())
            .count()
    }

    /// Queues a parent message in the `sent` state. It joins the thread after
    /// [`SEND_LATENCY`], and from then on escalates to `delivered` and `read`.
    /// The id is reserved immediately.
    pub fn try_send_message(&mut self, child_id: &ChildId, text: &str) -> Result<MessageId, SendError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(SendError::EmptyText);
        }
        let child = self
            .roster
            .find(child_id)
            .ok_or_else(|| SendError::UnknownChild(child_id.clone()))?;

        let id = MessageId(self.next_id);
        let message = Message {
            id,
            child_id: child.id.clone(),
            child_name: child.name.clone(),
            child_avatar: child.avatar.clone(),
            content: content.to_string(),
            created_at: self.now(),
            read: true,
            author: Author::Parent {
                status: DeliveryStatus::Sent,
            },
            kind: MessageKind::Text,
            pinned: false,
            starred: false,
        };
        self.next_id += 1;

        let handle = self
            .scheduler
            .schedule(SEND_LATENCY, DeliveryTask::Append(Box::new(message)));
        self.in_flight.insert(id, vec![handle]);
        self.outbox.push(id);
        tracing::debug!(%id, child = %child_id, "message in transit");
        Ok(id)
    }

    /// Like [`MessageStore::try_send_message`] but silently ignores blank text
    /// and unknown children.
    pub fn send_message(&mut self, child_id: &ChildId, text: &str) -> Option<MessageId> {
        match self.try_send_message(child_id, text) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::debug!(%err, "ignoring send");
                None
            }
        }
    }

    /// Returns `true` if the flag changed.
    pub fn mark_read(&mut self, id: MessageId) -> bool {
        match self.messages.iter_mut().find(|message| message.id == id) {
            Some(message) if !message.read => {
                message.read = true;
                true
            }
            _ => false,
        }
    }

    pub fn mark_conversation_read(&mut self, child_id: &ChildId) -> usize {
        let mut changed = 0;
        for message in self
            .messages
            .iter_mut()
            .filter(|message| &message.child_id == child_id && !message.read)
        {
            message.read = true;
            changed += 1;
        }
        changed
    }

    /// Flips the pinned flag, returning the new value.
    pub fn toggle_pinned(&mut self, id: MessageId) -> Option<bool> {
        let message = self.messages.iter_mut().find(|message| message.id == id)?;
        message.pinned = !message.pinned;
        Some(message.pinned)
    }

    /// Flips the starred flag, returning the new value.
    pub fn toggle_starred(&mut self, id: MessageId) -> Option<bool> {
        let message = self.messages.iter_mut().find(|message| message.id == id)?;
        message.starred = !message.starred;
        Some(message.starred)
    }

    /// A send is still in transit.
    pub fn is_sending(&self) -> bool {
        !self.outbox.is_empty()
    }

    pub fn is_in_transit(&self, id: MessageId) -> bool {
        self.outbox.contains(&id)
    }

    pub fn pending_transitions(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn next_transition_in(&self) -> Option<Duration> {
        self.scheduler
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.scheduler.now()))
    }

    pub fn advance(&mut self, by: Duration) -> Vec<DeliveryEvent> {
        let target = self.scheduler.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Moves virtual time to `elapsed` (since the store's epoch) and applies
    /// every timer that came due, in deadline order. Escalations queued by an
    /// append during this step fire in the same step once their time comes.
    pub fn advance_to(&mut self, elapsed: Duration) -> Vec<DeliveryEvent> {
        let mut events = Vec::new();
        while let Some(deadline) = self.scheduler.next_deadline().filter(|d| *d <= elapsed) {
            for fired in self.scheduler.advance_to(deadline) {
                match fired.task {
                    DeliveryTask::Append(message) => {
                        let id = message.id;
                        self.forget_handle(id, fired.handle);
                        self.append(*message, fired.due);
                        events.push(DeliveryEvent::Appended(id));
                    }
                    DeliveryTask::Escalate(escalation) => {
                        self.forget_handle(escalation.message_id, fired.handle);
                        if let Some(change) = self.apply(escalation) {
                            events.push(DeliveryEvent::Status(change));
                        }
                    }
                }
            }
        }
        self.scheduler.advance_to(elapsed);
        events
    }

    /// Drops every scheduled timer. Called when the owning view goes away;
    /// statuses stay where they are and sends still in transit never land.
    pub fn cancel_pending(&mut self) -> usize {
        self.in_flight.clear();
        self.outbox.clear();
        let dropped = self.scheduler.cancel_all();
        if dropped > 0 {
            tracing::debug!(dropped, "cancelled pending delivery updates");
        }
        dropped
    }

    pub fn cancel_for(&mut self, id: MessageId) -> usize {
        self.outbox.retain(|pending| *pending != id);
        let Some(handles) = self.in_flight.remove(&id) else {
            return 0;
        };
        handles
            .into_iter()
            .filter_map(|handle| self.scheduler.cancel(handle))
            .count()
    }

    fn append(&mut self, message: Message, landed_at: Duration) {
        let id = message.id;
        self.outbox.retain(|pending| *pending != id);
        self.messages.push(message);
        let handles = ESCALATION_PLAN
            .iter()
            .map(|&(delay, target)| {
                self.scheduler.schedule_at(
                    landed_at.saturating_add(delay),
                    DeliveryTask::Escalate(Escalation {
                        message_id: id,
                        target,
                    }),
                )
            })
            .collect();
        self.in_flight.insert(id, handles);
        tracing::debug!(%id, "message sent");
    }

    fn apply(&mut self, escalation: Escalation) -> Option<StatusChange> {
        let message = self
            .messages
            .iter_mut()
            .find(|message| message.id == escalation.message_id)?;
        let status = message.delivery_status_mut()?;
        let from = *status;
        if !status.escalate(escalation.target) {
            return None;
        }
        tracing::trace!(id = %escalation.message_id, %from, to = %escalation.target, "delivery status");
        Some(StatusChange {
            message_id: escalation.message_id,
            from,
            to: escalation.target,
        })
    }

    fn forget_handle(&mut self, id: MessageId, handle: TimerHandle) {
        if let Some(handles) = self.in_flight.get_mut(&id) {
            handles.retain(|pending| *pending != handle);
            if handles.is_empty() {
                self.in_flight.remove(&id);
            }
        }
    }
}

impl Drop for MessageStore {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{sample_children, StaticRoster};
    use crate::search::Category;
    use assert_matches::assert_matches;
    use time::macros::datetime;

    const EPOCH: OffsetDateTime = datetime!(2024-10-30 15:00 UTC);

    fn store() -> MessageStore {
        MessageStore::with_sample_data(Arc::new(StaticRoster::sample()), EPOCH)
    }

    fn status_of(store: &MessageStore, id: MessageId) -> Option<DeliveryStatus> {
        store.get(id).and_then(Message::delivery_status)
    }

    fn delivered_to(id: MessageId) -> DeliveryEvent {
        DeliveryEvent::Status(StatusChange {
            message_id: id,
            from: DeliveryStatus::Sent,
            to: DeliveryStatus::Delivered,
        })
    }

    #[test]
    fn send_escalates_sent_delivered_read() {
        let mut store = store();
        let before = store.len();
        let id = store
            .send_message(&ChildId::new("1"), "  See you after school!  ")
            .expect("valid send");

        assert_eq!(store.len(), before);
        assert!(store.is_sending());
        assert!(store.is_in_transit(id));
        assert!(store.get(id).is_none());
        assert_eq!(store.next_transition_in(), Some(SEND_LATENCY));

        assert!(store.advance(Duration::from_millis(299)).is_empty());
        assert_eq!(store.advance(Duration::from_millis(1)), vec![DeliveryEvent::Appended(id)]);
        assert!(!store.is_sending());
        assert_eq!(store.len(), before + 1);
        let message = store.get(id).expect("appended");
        assert_eq!(message.content, "See you after school!");
        assert_eq!(message.created_at, EPOCH);
        assert!(message.read);
        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(status_of(&store, id), Some(DeliveryStatus::Sent));
        assert_eq!(store.pending_transitions(), 2);

        assert!(store.advance(Duration::from_millis(999)).is_empty());
        assert_eq!(status_of(&store, id), Some(DeliveryStatus::Sent));

        assert_eq!(store.advance(Duration::from_millis(1)), vec![delivered_to(id)]);
        assert_eq!(store.next_transition_in(), Some(Duration::from_millis(1000)));

        store.advance(Duration::from_millis(1000));
        assert_eq!(status_of(&store, id), Some(DeliveryStatus::Read));
        assert_eq!(store.pending_transitions(), 0);

        store.advance(Duration::from_secs(60));
        assert_eq!(status_of(&store, id), Some(DeliveryStatus::Read));
    }

    #[test]
    fn one_large_step_applies_both_transitions_in_order() {
        let mut store = store();
        let id = store.send_message(&ChildId::new("2"), "hello").unwrap();
        let events = store.advance(Duration::from_secs(5));
        assert_matches!(
            events.as_slice(),
            [
                DeliveryEvent::Appended(appended),
                DeliveryEvent::Status(StatusChange { to: DeliveryStatus::Delivered, .. }),
                DeliveryEvent::Status(StatusChange { to: DeliveryStatus::Read, .. }),
            ] if *appended == id
        );
        assert!(events.iter().all(|event| event.message_id() == id));
        assert_eq!(status_of(&store, id), Some(DeliveryStatus::Read));
        assert_eq!(store.pending_transitions(), 0);
    }

    #[test]
    fn later_sends_are_timestamped_on_the_virtual_clock() {
        let mut store = store();
        store.advance(Duration::from_millis(1500));
        let id = store.send_message(&ChildId::new("4"), "Hi Alexander").unwrap();
        store.advance(Duration::from_millis(1300));
        assert_eq!(
            store.get(id).map(|m| m.created_at),
            Some(EPOCH + Duration::from_millis(1500))
        );
        assert_eq!(status_of(&store, id), Some(DeliveryStatus::Delivered));
    }

    #[test]
    fn invalid_sends_change_nothing() {
        let mut store = store();
        let before: Vec<_> = store.messages().to_vec();

        assert_eq!(store.send_message(&ChildId::new("1"), "  "), None);
        assert_eq!(store.send_message(&ChildId::new("1"), ""), None);
        assert_eq!(store.send_message(&ChildId::new("99"), "hello"), None);
        assert_matches!(
            store.try_send_message(&ChildId::new("1"), "\t\n"),
            Err(SendError::EmptyText)
        );
        assert_matches!(
            store.try_send_message(&ChildId::new("99"), "hello"),
            Err(SendError::UnknownChild(id)) if id.as_str() == "99"
        );

        assert_eq!(store.messages(), before.as_slice());
        assert_eq!(store.pending_transitions(), 0);
        assert!(!store.is_sending());
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut store = store();
        let unread = store
            .messages()
            .iter()
            .find(|m| !m.read)
            .map(|m| m.id)
            .expect("seed has unread message");

        assert!(store.mark_read(unread));
        let once = store.messages().to_vec();
        assert!(!store.mark_read(unread));
        assert_eq!(store.messages(), once.as_slice());
        assert!(!store.mark_read(MessageId(404)));
    }

    #[test]
    fn cancelled_transitions_leave_status_untouched() {
        let mut store = store();
        let id = store.send_message(&ChildId::new("3"), "Practice at 5?").unwrap();
        store.advance(Duration::from_millis(1300));
        assert_eq!(store.cancel_pending(), 1);
        store.advance(Duration::from_secs(10));
        assert_eq!(status_of(&store, id), Some(DeliveryStatus::Delivered));
    }

    #[test]
    fn cancelled_send_never_lands() {
        let mut store = store();
        let before = store.len();
        let id = store.send_message(&ChildId::new("3"), "Practice at 5?").unwrap();
        store.advance(Duration::from_millis(200));
        assert_eq!(store.cancel_pending(), 1);
        assert!(!store.is_sending());
        assert!(store.advance(Duration::from_secs(10)).is_empty());
        assert!(store.get(id).is_none());
        assert_eq!(store.len(), before);
    }

    #[test]
    fn cancel_for_only_affects_one_message() {
        let mut store = store();
        let first = store.send_message(&ChildId::new("1"), "one").unwrap();
        let second = store.send_message(&ChildId::new("1"), "two").unwrap();
        let third = store.send_message(&ChildId::new("1"), "three").unwrap();
        store.advance(SEND_LATENCY);
        assert_eq!(store.cancel_for(first), 2);
        assert_eq!(store.cancel_for(first), 0);

        let fourth = store.send_message(&ChildId::new("1"), "four").unwrap();
        assert_eq!(store.cancel_for(fourth), 1);
        assert!(!store.is_in_transit(fourth));

        store.advance(Duration::from_secs(3));
        assert_eq!(status_of(&store, first), Some(DeliveryStatus::Sent));
        assert_eq!(status_of(&store, second), Some(DeliveryStatus::Read));
        assert_eq!(status_of(&store, third), Some(DeliveryStatus::Read));
        assert!(store.get(fourth).is_none());
    }

    #[test]
    fn messages_for_filters_by_child_and_state() {
        let store = store();
        let emma = ChildId::new("1");
        let all = store.messages_for(&emma, &FilterState::default());
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|m| m.child_id == emma));

        let starred = store.messages_for(&emma, &FilterState::default().with_category(Category::Starred));
        assert_eq!(starred.len(), 1);
        assert!(store
            .messages_for(&ChildId::new("missing"), &FilterState::default())
            .is_empty());
    }

    #[test]
    fn summaries_reflect_reads_and_new_sends() {
        let mut store = store();
        let marcus = ChildId::new("2");
        let summary_for = |store: &MessageStore, id: &ChildId| {
            store
                .conversation_summaries(&FilterState::default())
                .into_iter()
                .find(|s| &s.child.id == id)
                .map(|s| (s.unread_count, s.last_message.map(|m| m.id)))
        };
        assert_eq!(summary_for(&store, &marcus).map(|s| s.0), Some(1));
        assert_eq!(store.unread_total(), 1);
        assert_eq!(store.mark_conversation_read(&marcus), 1);
        assert_eq!(summary_for(&store, &marcus).map(|s| s.0), Some(0));

        let id = store.send_message(&marcus, "Looks great!").unwrap();
        assert_ne!(summary_for(&store, &marcus).and_then(|s| s.1), Some(id));
        store.advance(SEND_LATENCY);
        assert_eq!(summary_for(&store, &marcus), Some((0, Some(id))));
        assert_eq!(
            store.conversation_summaries(&FilterState::default()).len(),
            sample_children().len()
        );
    }

    #[test]
    fn pin_and_star_toggle() {
        let mut store = store();
        let id = MessageId(1);
        assert_eq!(store.toggle_pinned(id), Some(true));
        assert_eq!(store.toggle_pinned(id), Some(false));
        assert_eq!(store.toggle_starred(id), Some(false));
        assert_eq!(store.toggle_starred(MessageId(404)), None);
    }

    #[test]
    fn counterpart_messages_never_gain_a_status() {
        let store = store();
        for message in store.messages() {
            assert_eq!(message.is_from_parent(), message.delivery_status().is_some());
        }
    }
}
