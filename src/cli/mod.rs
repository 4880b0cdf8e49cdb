use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::Dashboard;
use crate::config::ConfigLoader;

pub mod commands;

use self::commands::{AskArgs, ChildrenArgs, ConversationsArgs, SendArgs, ThreadArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rafiq",
    version,
    about = "Parent dashboard: children's progress, messages and the Rafiq assistant"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over RAFIQ_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summary statistics and achievement highlights (default)
    Overview,
    /// List children, optionally filtered by status or search text
    Children(ChildrenArgs),
    /// List conversations, pinned first and newest next
    Conversations(ConversationsArgs),
    /// Show the messages exchanged with one child
    Thread(ThreadArgs),
    /// Send a message and follow its delivery status
    Send(SendArgs),
    /// Ask the assistant a question
    Ask(AskArgs),
    /// Print the effective settings
    Config,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("RAFIQ_CONFIG", path);
    }
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let loader = ConfigLoader::discover()?;
    let config = Arc::new(loader.load()?);
    let mut dashboard = Dashboard::sample(config.clone());

    let command = cli.command.unwrap_or(Commands::Overview);
    let outcome = match command {
        Commands::Overview => commands::show_overview(&dashboard),
        Commands::Children(args) => commands::list_children(&mut dashboard, args),
        Commands::Conversations(args) => commands::list_conversations(&mut dashboard, args),
        Commands::Thread(args) => commands::show_thread(&mut dashboard, args),
        Commands::Send(args) => commands::send_message(&mut dashboard, args),
        Commands::Ask(args) => commands::ask_assistant(&mut dashboard, args),
        Commands::Config => commands::show_config(&config, loader.paths()),
    };
    dashboard.close();
    outcome
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::roster::StatusFilter;
    use crate::search::Category;

    #[test]
    fn parses_filters_from_their_display_names() {
        let cli = Cli::try_parse_from([
            "rafiq",
            "conversations",
            "--filter",
            "Unread",
            "--search",
            "quiz",
            "--json",
        ])
        .expect("parse");
        assert_matches!(
            cli.command,
            Some(Commands::Conversations(ConversationsArgs { filter: Category::Unread, json: true, .. }))
        );

        let cli = Cli::try_parse_from(["rafiq", "children", "--status", "needs-help"]).expect("parse");
        assert_matches!(
            cli.command,
            Some(Commands::Children(ChildrenArgs { status: StatusFilter::NeedsHelp, .. }))
        );
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from(["rafiq", "overview", "--log-level", "debug"]).expect("parse");
        assert_eq!(cli.log_level, "debug");
        assert_matches!(cli.command, Some(Commands::Overview));

        let cli = Cli::try_parse_from(["rafiq"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn send_collects_the_remaining_words() {
        let cli = Cli::try_parse_from(["rafiq", "send", "emma", "See", "you", "soon", "--instant"])
            .expect("parse");
        let Some(Commands::Send(args)) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.child, "emma");
        assert_eq!(args.text.join(" "), "See you soon");
        assert!(args.instant);
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(Cli::try_parse_from(["rafiq", "conversations", "--filter", "archived"]).is_err());
    }
}
