use std::time::Duration;

use serde::Serialize;

use super::{select_response, typing_delay, WELCOME};
use crate::scheduler::{Scheduler, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Parent,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: u64,
    pub speaker: Speaker,
    pub text: String,
    /// Virtual time at which the message appeared.
    #[serde(with = "millis")]
    pub at: Duration,
}

#[derive(Debug)]
struct PendingReply {
    text: &'static str,
}

/// Transcript of the assistant panel plus the single reply that may be
/// "typing".
#[derive(Debug)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    scheduler: Scheduler<PendingReply>,
    typing: Option<TimerHandle>,
    next_id: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let mut session = Self {
            transcript: Vec::new(),
            scheduler: Scheduler::new(),
            typing: None,
            next_id: 0,
        };
        session.push(Speaker::Assistant, WELCOME.to_string());
        session
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_some()
    }

    /// Records the question and schedules the canned reply. Blank input, or a
    /// question asked while a reply is still typing, is ignored.
    pub fn ask(&mut self, question: &str) -> Option<Duration> {
        let question = question.trim();
        if question.is_empty() || self.is_typing() {
            return None;
        }
        self.push(Speaker::Parent, question.to_string());
        let reply = select_response(question);
        let delay = typing_delay(reply);
        self.typing = Some(self.scheduler.schedule(delay, PendingReply { text: reply }));
        tracing::debug!(delay_ms = delay.as_millis() as u64, "assistant typing");
        Some(delay)
    }

    /// Moves the panel's clock forward and returns replies that appeared.
    pub fn advance(&mut self, by: Duration) -> Vec<&ChatMessage> {
        let fired = self.scheduler.advance(by);
        let first_new = self.transcript.len();
        for fired in fired {
            if self.typing == Some(fired.handle) {
                self.typing = None;
            }
            self.push_at(Speaker::Assistant, fired.task.text.to_string(), fired.due);
        }
        self.transcript[first_new..].iter().collect()
    }

    /// Drops a reply that has not appeared yet. Returns whether one was
    /// pending.
    pub fn close(&mut self) -> bool {
        let Some(handle) = self.typing.take() else {
            return false;
        };
        self.scheduler.cancel(handle).is_some()
    }

    fn push(&mut self, speaker: Speaker, text: String) {
        let at = self.scheduler.now();
        self.push_at(speaker, text, at);
    }

    fn push_at(&mut self, speaker: Speaker, text: String, at: Duration) {
        self.next_id += 1;
        self.transcript.push(ChatMessage {
            id: self.next_id,
            speaker,
            text,
            at,
        });
    }
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::{response_for, Topic, MIN_TYPING_DELAY};

    #[test]
    fn starts_with_welcome() {
        let session = ChatSession::new();
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].speaker, Speaker::Assistant);
        assert_eq!(session.transcript()[0].text, WELCOME);
        assert!(!session.is_typing());
    }

    #[test]
    fn reply_appears_after_typing_delay() {
        let mut session = ChatSession::new();
        let delay = session.ask("How is Marcus?").expect("accepted");
        assert!(session.is_typing());
        assert_eq!(session.transcript().len(), 2);

        assert!(session.advance(delay - Duration::from_millis(1)).is_empty());
        let replies = session.advance(Duration::from_millis(1));
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, response_for(Topic::Marcus));
        assert_eq!(replies[0].at, delay);
        assert!(!session.is_typing());
    }

    #[test]
    fn asks_while_typing_or_blank_are_ignored() {
        let mut session = ChatSession::new();
        assert!(session.ask("   ").is_none());
        assert!(session.ask("progress?").is_some());
        assert!(session.ask("study tips").is_none());
        assert_eq!(session.transcript().len(), 2);

        session.advance(MIN_TYPING_DELAY * 3);
        assert!(session.ask("study tips").is_some());
    }

    #[test]
    fn closing_drops_the_pending_reply() {
        let mut session = ChatSession::new();
        session.ask("Tell me about Isabella").unwrap();
        assert!(session.close());
        assert!(!session.close());
        assert!(session.advance(Duration::from_secs(10)).is_empty());
        assert_eq!(session.transcript().len(), 2);
        assert!(!session.is_typing());
    }
}
