use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::messages::Message;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Unread,
    Pinned,
    Starred,
}

impl Category {
    pub fn matches(self, message: &Message) -> bool {
        match self {
            Category::All => true,
            Category::Unread => !message.read,
            Category::Pinned => message.pinned,
            Category::Starred => message.starred,
        }
    }
}

/// Search text plus category selector for the message panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search: String,
    pub category: Category,
}

impl FilterState {
    pub fn new(search: impl Into<String>, category: Category) -> Self {
        Self {
            search: search.into(),
            category,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn is_match_all(&self) -> bool {
        self.search.is_empty() && self.category == Category::All
    }

    pub fn matches(&self, message: &Message) -> bool {
        self.compile().matches(message)
    }

    fn compile(&self) -> CompiledFilter {
        CompiledFilter {
            needle: (!self.search.is_empty()).then(|| self.search.to_lowercase()),
            category: self.category,
        }
    }
}

struct CompiledFilter {
    needle: Option<String>,
    category: Category,
}

impl CompiledFilter {
    fn matches(&self, message: &Message) -> bool {
        self.matches_text(message) && self.category.matches(message)
    }

    fn matches_text(&self, message: &Message) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        message.content.to_lowercase().contains(needle.as_str())
            || message.child_name.to_lowercase().contains(needle.as_str())
    }
}

/// Keeps the messages accepted by `filter`, in input order.
pub fn filter_messages<'a, I>(messages: I, filter: &FilterState) -> Vec<&'a Message>
where
    I: IntoIterator<Item = &'a Message>,
{
    let compiled = filter.compile();
    messages
        .into_iter()
        .filter(|message| compiled.matches(message))
        .collect()
}
