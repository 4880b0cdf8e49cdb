use std::fmt::Write as _;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use regex::Regex;
use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::app::{Dashboard, Tick};
use crate::chatbot::{ChatMessage, Speaker};
use crate::config::{AppConfig, ConfigPaths, ThemeMode};
use crate::highlight::{build_highlight_regex, emphasize};
use crate::messages::{ConversationSummary, DeliveryEvent, Message};
use crate::roster::{ChildProfile, RosterOverview, StatusFilter};
use crate::scheduler::WallClock;
use crate::search::Category;

/// How often `send`/`ask` poll the wall clock while timers are pending.
const TICK_RATE: Duration = Duration::from_millis(250);
const EMPHASIS: (&str, &str) = ("**", "**");

#[derive(Args, Debug, Clone)]
pub struct ChildrenArgs {
    /// Status chip: all, improving, stable, needs-help
    #[arg(long, default_value_t = StatusFilter::All)]
    pub status: StatusFilter,
    /// Match against name, grade, status or next quiz subject
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConversationsArgs {
    /// Only count messages containing this text (content or child name)
    #[arg(long)]
    pub search: Option<String>,
    /// Category: all, unread, pinned, starred
    #[arg(long, default_value_t = Category::All)]
    pub filter: Category,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ThreadArgs {
    /// Child id, full name or first name
    pub child: String,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, default_value_t = Category::All)]
    pub filter: Category,
}

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Child id, full name or first name
    pub child: String,
    /// Message text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
    /// Advance simulated time instead of waiting on the wall clock
    #[arg(long)]
    pub instant: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
    /// Skip the typing delay
    #[arg(long)]
    pub instant: bool,
}

pub fn show_overview(dashboard: &Dashboard) -> Result<()> {
    print!(
        "{}",
        format_overview(
            &dashboard.overview(),
            &dashboard.highlights(),
            dashboard.messages().unread_total(),
        )
    );
    Ok(())
}

pub fn list_children(dashboard: &mut Dashboard, args: ChildrenArgs) -> Result<()> {
    dashboard.set_status_filter(args.status);
    if let Some(search) = args.search {
        dashboard.set_child_search(search);
    }
    print!("{}", format_children(&dashboard.visible_children()));
    Ok(())
}

pub fn list_conversations(dashboard: &mut Dashboard, args: ConversationsArgs) -> Result<()> {
    dashboard.set_category(args.filter);
    if let Some(search) = args.search {
        dashboard.set_message_search(search);
    }
    let width = dashboard.config.messages.preview_chars;
    let summaries = dashboard.conversations();
    if args.json {
        let rows: Vec<_> = summaries
            .iter()
            .map(|summary| ConversationRow::new(summary, width))
            .collect();
        let json = serde_json::to_string_pretty(&rows).context("serializing conversations")?;
        println!("{json}");
    } else {
        print!("{}", format_conversations(&summaries, width));
    }
    Ok(())
}

pub fn show_thread(dashboard: &mut Dashboard, args: ThreadArgs) -> Result<()> {
    let child_id = match dashboard.roster().resolve(&args.child) {
        Some(child) => child.id.clone(),
        None => bail!("no child matches '{}'", args.child),
    };
    dashboard.select_child(&child_id);
    dashboard.set_category(args.filter);
    let highlight = match args.search {
        Some(search) => {
            let regex = build_highlight_regex(std::slice::from_ref(&search));
            dashboard.set_message_search(search);
            regex
        }
        None => None,
    };
    let child = dashboard
        .selected_child()
        .context("selected child vanished from roster")?;
    print!(
        "{}",
        format_thread(child, &dashboard.selected_thread(), highlight.as_ref())
    );
    Ok(())
}

pub fn send_message(dashboard: &mut Dashboard, args: SendArgs) -> Result<()> {
    let child = match dashboard.roster().resolve(&args.child) {
        Some(child) => child.clone(),
        None => bail!("no child matches '{}'", args.child),
    };
    let text = args.text.join(" ");
    let id = dashboard
        .messages_mut()
        .try_send_message(&child.id, &text)
        .with_context(|| format!("sending to {}", child.name))?;
    dashboard.select_child(&child.id);
    println!("Sending #{id} to {}…", child.name);

    run_until_idle(dashboard, args.instant, |tick| {
        for event in &tick.deliveries {
            println!("{}", format_delivery(event));
        }
    });
    Ok(())
}

pub fn ask_assistant(dashboard: &mut Dashboard, args: AskArgs) -> Result<()> {
    let question = args.question.join(" ");
    let before = dashboard.assistant().transcript().len();
    if dashboard.ask_assistant(&question).is_none() {
        bail!("question cannot be empty");
    }
    eprintln!("Rafiq is typing…");
    run_until_idle(dashboard, args.instant, |_| {});
    print!(
        "{}",
        format_transcript(&dashboard.assistant().transcript()[before..])
    );
    Ok(())
}

pub fn show_config(config: &AppConfig, paths: &ConfigPaths) -> Result<()> {
    let source = if paths.config_file.exists() {
        paths.config_file.display().to_string()
    } else {
        format!("{} (not found, defaults)", paths.config_file.display())
    };
    println!("# {source}");
    println!(
        "# theme {} | {} notifications on",
        format_theme(config.appearance.theme),
        config.notifications.enabled_count()
    );
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Advances the dashboard until no timer is pending, on the wall clock or,
/// with `instant`, in simulated steps of the same size.
fn run_until_idle(dashboard: &mut Dashboard, instant: bool, mut on_tick: impl FnMut(&Tick)) {
    let clock = WallClock::start();
    let mut last = Duration::ZERO;
    while dashboard.has_pending_timers() {
        let step = if instant {
            TICK_RATE
        } else {
            thread::sleep(TICK_RATE);
            let now = clock.elapsed();
            let step = now.saturating_sub(last);
            last = now;
            step
        };
        let tick = dashboard.advance(step);
        if !tick.is_empty() {
            tracing::trace!(deliveries = tick.deliveries.len(), replies = tick.replies, "tick");
            on_tick(&tick);
        }
    }
}

#[derive(Debug, Serialize)]
struct ConversationRow<'a> {
    child_id: &'a str,
    name: &'a str,
    pinned: bool,
    unread_count: usize,
    preview: Option<String>,
    last_message: Option<&'a Message>,
}

impl<'a> ConversationRow<'a> {
    fn new(summary: &ConversationSummary<'a>, width: usize) -> Self {
        Self {
            child_id: summary.child.id.as_str(),
            name: &summary.child.name,
            pinned: summary.pinned,
            unread_count: summary.unread_count,
            preview: summary.preview(width),
            last_message: summary.last_message,
        }
    }
}

fn format_overview(
    overview: &RosterOverview,
    highlights: &[&ChildProfile],
    unread: usize,
) -> String {
    let highlight_names = if highlights.is_empty() {
        "-".to_string()
    } else {
        highlights
            .iter()
            .map(|child| child.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let rows = [
        ("Children", overview.total_children.to_string()),
        ("Avg completion", format!("{}%", overview.average_completion)),
        ("Improving", overview.improving.to_string()),
        ("Stable", overview.stable.to_string()),
        ("Needs attention", overview.needs_attention.to_string()),
        ("Study streak", format!("{} days", overview.total_study_streak)),
        ("Unread messages", unread.to_string()),
        ("Highlights", highlight_names),
    ];
    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(&mut out, "{label:<16} {value}");
    }
    out
}

fn format_children(children: &[&ChildProfile]) -> String {
    if children.is_empty() {
        return "No children match.\n".to_string();
    }
    let mut out = String::new();
    for child in children {
        let _ = writeln!(
            &mut out,
            "#{}  {} {}  {}  [{}]",
            child.id, child.name, child.mood.emoji, child.grade_level, child.status
        );
        let _ = writeln!(
            &mut out,
            "    completion {}%  quiz avg {}%  streak {}d",
            child.course_completion, child.quiz_average, child.study_streak
        );
        let _ = writeln!(
            &mut out,
            "    next quiz {} ({})",
            child.next_quiz_date, child.next_quiz_subject
        );
        if !child.alerts.is_empty() {
            let alerts = child
                .alerts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(&mut out, "    alerts {alerts}");
        }
        out.push('\n');
    }
    out
}

fn format_conversations(summaries: &[ConversationSummary<'_>], width: usize) -> String {
    let mut out = String::new();
    for summary in summaries {
        let mut headline = String::new();
        if summary.pinned {
            headline.push_str("📌 ");
        }
        headline.push_str(&summary.child.name);
        if let Some(at) = summary.last_activity() {
            let _ = write!(&mut headline, "  {}", format_clock(at));
        }
        if summary.unread_count > 0 {
            let _ = write!(&mut headline, "  ({} unread)", summary.unread_count);
        }
        let _ = writeln!(&mut out, "{headline}");
        match summary.preview(width) {
            Some(preview) => {
                let _ = writeln!(&mut out, "    {preview}");
            }
            None => out.push_str("    (no messages)\n"),
        }
    }
    out
}

fn format_thread(child: &ChildProfile, messages: &[&Message], highlight: Option<&Regex>) -> String {
    let mut out = String::new();
    let plural = if messages.len() == 1 { "" } else { "s" };
    let _ = writeln!(
        &mut out,
        "Conversation with {} ({} message{plural})",
        child.name,
        messages.len()
    );
    for message in messages {
        out.push('\n');
        let mut headline = format!("{}  ", format_clock(message.created_at));
        match message.delivery_status() {
            Some(status) => {
                let _ = write!(&mut headline, "You [{status}]");
            }
            None => headline.push_str(child.first_name()),
        }
        if !message.read {
            headline.push_str("  •");
        }
        if message.pinned {
            headline.push_str("  📌");
        }
        if message.starred {
            headline.push_str("  ★");
        }
        let _ = writeln!(&mut out, "{headline}  <{}>", message.kind);
        let content = match highlight {
            Some(regex) => emphasize(&message.content, regex, EMPHASIS.0, EMPHASIS.1),
            None => message.content.clone(),
        };
        let _ = writeln!(&mut out, "    {content}");
    }
    out
}

fn format_delivery(event: &DeliveryEvent) -> String {
    match event {
        DeliveryEvent::Appended(id) => format!("#{id} sent"),
        DeliveryEvent::Status(change) => {
            format!("#{} {} -> {}", change.message_id, change.from, change.to)
        }
    }
}

fn format_transcript(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let speaker = match message.speaker {
            Speaker::Parent => "You",
            Speaker::Assistant => "Rafiq",
        };
        let mut lines = message.text.lines();
        let _ = writeln!(&mut out, "{speaker}: {}", lines.next().unwrap_or_default());
        for line in lines {
            if line.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(&mut out, "    {line}");
            }
        }
    }
    out
}

fn format_theme(mode: ThemeMode) -> String {
    let light = mode.resolve(false);
    let dark = mode.resolve(true);
    if light == dark {
        format!("{mode} ({light})")
    } else {
        format!("{mode} ({light}, {dark} when the system prefers dark)")
    }
}

fn format_clock(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| at.to_string())
}
