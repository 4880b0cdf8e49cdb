use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::chatbot::ChatSession;
use crate::config::AppConfig;
use crate::messages::{ConversationSummary, DeliveryEvent, Message, MessageId, MessageStore};
use crate::roster::{
    achievement_highlights, search_children, ChildId, ChildProfile, RosterOverview, RosterProvider,
    StaticRoster, StatusFilter,
};
use crate::search::Category;

pub mod state;

pub use state::{View, ViewState};

/// What happened during one [`Dashboard::advance`] step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tick {
    pub deliveries: Vec<DeliveryEvent>,
    pub replies: usize,
}

impl Tick {
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty() && self.replies == 0
    }
}

/// Application shell: owns the roster, the message store, the assistant
/// session and the view selections, and is the single place time is advanced.
pub struct Dashboard {
    pub config: Arc<AppConfig>,
    roster: Arc<dyn RosterProvider>,
    messages: MessageStore,
    assistant: ChatSession,
    state: ViewState,
}

impl Dashboard {
    pub fn new(config: Arc<AppConfig>, roster: Arc<dyn RosterProvider>, epoch: OffsetDateTime) -> Self {
        let messages = MessageStore::with_sample_data(roster.clone(), epoch);
        Self::with_store(config, roster, messages)
    }

    pub fn with_store(
        config: Arc<AppConfig>,
        roster: Arc<dyn RosterProvider>,
        messages: MessageStore,
    ) -> Self {
        Self {
            config,
            roster,
            messages,
            assistant: ChatSession::new(),
            state: ViewState::default(),
        }
    }

    /// Demo dashboard over the bundled sample roster and history.
    pub fn sample(config: Arc<AppConfig>) -> Self {
        Self::new(
            config,
            Arc::new(StaticRoster::sample()),
            OffsetDateTime::now_utc(),
        )
    }

    pub fn roster(&self) -> &dyn RosterProvider {
        self.roster.as_ref()
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut MessageStore {
        &mut self.messages
    }

    pub fn assistant(&self) -> &ChatSession {
        &self.assistant
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn show(&mut self, view: View) {
        self.state.set_view(view);
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.state.status_filter = filter;
    }

    pub fn set_child_search<S: Into<String>>(&mut self, query: S) {
        self.state.child_search = query.into();
    }

    /// Children cards after the status chip and the search box.
    pub fn visible_children(&self) -> Vec<&ChildProfile> {
        let filter = self.state.status_filter;
        search_children(self.roster.profiles(), &self.state.child_search)
            .into_iter()
            .filter(|child| filter.matches(child))
            .collect()
    }

    pub fn overview(&self) -> RosterOverview {
        RosterOverview::from_children(self.roster.profiles())
    }

    pub fn highlights(&self) -> Vec<&ChildProfile> {
        achievement_highlights(self.roster.profiles())
    }

    pub fn set_message_search<S: Into<String>>(&mut self, search: S) {
        self.state.set_message_search(search);
    }

    pub fn set_category(&mut self, category: Category) {
        self.state.set_category(category);
    }

    pub fn conversations(&self) -> Vec<ConversationSummary<'_>> {
        self.messages
            .conversation_summaries(&self.state.message_filter)
    }

    /// Opens the conversation with `child_id`. Ids outside the roster are
    /// ignored.
    pub fn select_child(&mut self, child_id: &ChildId) -> bool {
        if self.roster.find(child_id).is_none() {
            tracing::debug!(child = %child_id, "ignoring selection of unknown child");
            return false;
        }
        self.state.set_view(View::Messages);
        self.state.selected_child = Some(child_id.clone());
        true
    }

    pub fn selected_child(&self) -> Option<&ChildProfile> {
        self.state
            .selected_child
            .as_ref()
            .and_then(|id| self.roster.find(id))
    }

    pub fn selected_thread(&self) -> Vec<&Message> {
        match &self.state.selected_child {
            Some(id) => self.messages.messages_for(id, &self.state.message_filter),
            None => Vec::new(),
        }
    }

    pub fn send_to_selected(&mut self, text: &str) -> Option<MessageId> {
        let child_id = self.state.selected_child.clone()?;
        self.messages.send_message(&child_id, text)
    }

    /// A send is still in transit; the composer shows it as loading.
    pub fn is_sending(&self) -> bool {
        self.messages.is_sending()
    }

    pub fn mark_selected_read(&mut self) -> usize {
        match self.state.selected_child.clone() {
            Some(id) => self.messages.mark_conversation_read(&id),
            None => 0,
        }
    }

    pub fn open_assistant(&mut self) {
        self.state.assistant_open = true;
    }

    /// Hides the assistant panel and drops a reply that is still typing.
    pub fn close_assistant(&mut self) {
        self.state.assistant_open = false;
        self.assistant.close();
    }

    pub fn toggle_assistant(&mut self) -> bool {
        if self.state.assistant_open {
            self.close_assistant();
        } else {
            self.open_assistant();
        }
        self.state.assistant_open
    }

    pub fn ask_assistant(&mut self, question: &str) -> Option<Duration> {
        self.open_assistant();
        self.assistant.ask(question)
    }

    pub fn advance(&mut self, by: Duration) -> Tick {
        let deliveries = self.messages.advance(by);
        let replies = self.assistant.advance(by).len();
        Tick { deliveries, replies }
    }

    pub fn has_pending_timers(&self) -> bool {
        self.messages.pending_transitions() > 0 || self.assistant.is_typing()
    }

    /// Teardown: cancels every outstanding timer.
    pub fn close(&mut self) {
        let dropped = self.messages.cancel_pending();
        let reply_dropped = self.assistant.close();
        tracing::debug!(dropped, reply_dropped, "dashboard closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::DeliveryStatus;
    use time::macros::datetime;

    fn dashboard() -> Dashboard {
        Dashboard::new(
            Arc::new(AppConfig::default()),
            Arc::new(StaticRoster::sample()),
            datetime!(2024-10-30 15:00 UTC),
        )
    }

    #[test]
    fn children_panel_combines_status_chip_and_search() {
        let mut dashboard = dashboard();
        assert_eq!(dashboard.visible_children().len(), 5);
        dashboard.set_status_filter(StatusFilter::Improving);
        assert_eq!(dashboard.visible_children().len(), 2);
        dashboard.set_child_search("isabella");
        let names: Vec<_> = dashboard
            .visible_children()
            .into_iter()
            .map(|child| child.name.as_str())
            .collect();
        assert_eq!(names, vec!["Isabella Martinez"]);
        dashboard.set_status_filter(StatusFilter::NeedsHelp);
        assert!(dashboard.visible_children().is_empty());
    }

    #[test]
    fn selection_drives_thread_and_send() {
        let mut dashboard = dashboard();
        assert!(dashboard.selected_thread().is_empty());
        assert_eq!(dashboard.send_to_selected("hello"), None);

        assert!(!dashboard.select_child(&ChildId::new("42")));
        assert!(dashboard.select_child(&ChildId::new("3")));
        assert_eq!(dashboard.state().view, View::Messages);
        assert_eq!(dashboard.selected_child().map(|c| c.first_name()), Some("Sophia"));
        assert_eq!(dashboard.selected_thread().len(), 1);

        let id = dashboard.send_to_selected("Reading together at 7?").unwrap();
        assert!(dashboard.is_sending());
        assert_eq!(dashboard.selected_thread().len(), 1);

        let tick = dashboard.advance(Duration::from_millis(300));
        assert_eq!(tick.deliveries, vec![DeliveryEvent::Appended(id)]);
        assert!(!dashboard.is_sending());
        assert_eq!(dashboard.selected_thread().len(), 2);

        let tick = dashboard.advance(Duration::from_millis(2000));
        assert_eq!(tick.deliveries.len(), 2);
        assert_eq!(
            dashboard.messages().get(id).and_then(Message::delivery_status),
            Some(DeliveryStatus::Read)
        );

        dashboard.show(View::Dashboard);
        assert!(dashboard.selected_child().is_none());
    }

    #[test]
    fn filter_applies_to_conversations_and_thread() {
        let mut dashboard = dashboard();
        dashboard.set_category(Category::Unread);
        let with_messages: Vec<_> = dashboard
            .conversations()
            .into_iter()
            .filter(|summary| summary.last_message.is_some())
            .map(|summary| summary.child.first_name().to_string())
            .collect();
        assert_eq!(with_messages, vec!["Sophia", "Marcus"]);

        dashboard.select_child(&ChildId::new("1"));
        assert!(dashboard.selected_thread().is_empty());
        dashboard.set_category(Category::All);
        dashboard.set_message_search("FRACTIONS");
        assert_eq!(dashboard.selected_thread().len(), 1);
    }

    #[test]
    fn mark_selected_read_clears_unread_badge() {
        let mut dashboard = dashboard();
        assert_eq!(dashboard.mark_selected_read(), 0);
        dashboard.select_child(&ChildId::new("2"));
        assert_eq!(dashboard.mark_selected_read(), 1);
        let marcus = dashboard
            .conversations()
            .into_iter()
            .find(|summary| summary.child.id.as_str() == "2")
            .map(|summary| summary.unread_count);
        assert_eq!(marcus, Some(0));
    }

    #[test]
    fn assistant_reply_arrives_through_advance() {
        let mut dashboard = dashboard();
        let delay = dashboard.ask_assistant("How is Emma doing?").unwrap();
        assert!(dashboard.state().assistant_open);
        assert!(dashboard.has_pending_timers());
        let tick = dashboard.advance(delay);
        assert_eq!(tick.replies, 1);
        assert!(!dashboard.has_pending_timers());
        assert_eq!(dashboard.assistant().transcript().len(), 3);
    }

    #[test]
    fn closing_assistant_discards_typing_reply() {
        let mut dashboard = dashboard();
        dashboard.ask_assistant("progress").unwrap();
        assert!(!dashboard.toggle_assistant());
        assert!(dashboard.advance(Duration::from_secs(10)).is_empty());
        assert_eq!(dashboard.assistant().transcript().len(), 2);
    }

    #[test]
    fn close_cancels_every_timer() {
        let mut dashboard = dashboard();
        dashboard.select_child(&ChildId::new("5"));
        let landed = dashboard.send_to_selected("Proud of you!").unwrap();
        dashboard.advance(Duration::from_millis(300));
        let in_transit = dashboard.send_to_selected("See you tonight").unwrap();
        dashboard.ask_assistant("isabella").unwrap();
        dashboard.close();
        assert!(!dashboard.has_pending_timers());
        assert!(!dashboard.is_sending());
        assert!(dashboard.advance(Duration::from_secs(10)).is_empty());
        assert_eq!(
            dashboard.messages().get(landed).and_then(Message::delivery_status),
            Some(DeliveryStatus::Sent)
        );
        assert!(dashboard.messages().get(in_transit).is_none());
    }

    #[test]
    fn overview_and_highlights_come_from_roster() {
        let dashboard = dashboard();
        assert_eq!(dashboard.overview().total_children, 5);
        assert_eq!(dashboard.highlights().len(), 3);
    }
}
