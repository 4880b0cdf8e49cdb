pub mod app;
pub mod chatbot;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod messages;
pub mod roster;
pub mod scheduler;
pub mod search;

pub use app::Dashboard;
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use messages::{Message, MessageId, MessageStore};
pub use roster::{ChildId, ChildProfile, RosterProvider, StaticRoster};
