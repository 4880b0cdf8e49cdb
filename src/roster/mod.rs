use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub mod seed;

pub use seed::sample_children;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildId(String);

impl ChildId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChildId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize)]
pub enum ChildStatus {
    Improving,
    Stable,
    #[strum(serialize = "Needs attention")]
    #[serde(rename = "Needs attention")]
    NeedsAttention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MoodType {
    Happy,
    Neutral,
    Sad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum ChildAlert {
    #[strum(serialize = "Missed Quiz")]
    #[serde(rename = "Missed Quiz")]
    MissedQuiz,
    #[strum(serialize = "Study Drop")]
    #[serde(rename = "Study Drop")]
    StudyDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuizTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub completed_lessons: u32,
    pub hours_studied: f32,
    pub badges_earned: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub emoji: String,
    pub kind: MoodType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub id: ChildId,
    pub name: String,
    pub avatar: String,
    pub grade_level: String,
    /// Percentage, 0..=100.
    pub course_completion: u8,
    /// Percentage, 0..=100.
    pub quiz_average: u8,
    pub study_streak: u32,
    pub personal_best_streak: Option<u32>,
    pub mood: Mood,
    pub status: ChildStatus,
    pub next_quiz_date: String,
    pub next_quiz_subject: String,
    pub alerts: Vec<ChildAlert>,
    pub tooltip: Option<String>,
    pub recent_activity: Option<RecentActivity>,
    pub quiz_trend: Option<QuizTrend>,
    pub last_mood_update: Option<String>,
}

impl ChildProfile {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    pub fn is_highlighted(&self) -> bool {
        self.study_streak >= HIGHLIGHT_STREAK_DAYS || self.quiz_average >= HIGHLIGHT_QUIZ_AVERAGE
    }

    fn matches_query(&self, needle: &str) -> bool {
        let status = self.status.to_string();
        [
            self.name.as_str(),
            self.grade_level.as_str(),
            status.as_str(),
            self.next_quiz_subject.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

const HIGHLIGHT_STREAK_DAYS: u32 = 14;
const HIGHLIGHT_QUIZ_AVERAGE: u8 = 90;
const MAX_HIGHLIGHTS: usize = 3;

/// Ordered, read-only source of child profiles.
pub trait RosterProvider {
    fn profiles(&self) -> &[ChildProfile];

    fn find(&self, id: &ChildId) -> Option<&ChildProfile> {
        self.profiles().iter().find(|child| &child.id == id)
    }

    /// Resolves either an id or a case-insensitive full/first name.
    fn resolve(&self, key: &str) -> Option<&ChildProfile> {
        let key = key.trim();
        if let Some(child) = self.profiles().iter().find(|child| child.id.as_str() == key) {
            return Some(child);
        }
        let lowered = key.to_lowercase();
        self.profiles().iter().find(|child| {
            child.name.to_lowercase() == lowered || child.first_name().to_lowercase() == lowered
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    profiles: Vec<ChildProfile>,
}

impl StaticRoster {
    pub fn new(profiles: Vec<ChildProfile>) -> Self {
        Self { profiles }
    }

    pub fn sample() -> Self {
        Self::new(sample_children())
    }
}

impl RosterProvider for StaticRoster {
    fn profiles(&self) -> &[ChildProfile] {
        &self.profiles
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Improving,
    Stable,
    NeedsHelp,
}

impl StatusFilter {
    pub fn matches(self, child: &ChildProfile) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Improving => child.status == ChildStatus::Improving,
            StatusFilter::Stable => child.status == ChildStatus::Stable,
            StatusFilter::NeedsHelp => child.status == ChildStatus::NeedsAttention,
        }
    }
}

/// Children whose name, grade, status or next quiz subject contains `query`.
pub fn search_children<'a>(children: &'a [ChildProfile], query: &str) -> Vec<&'a ChildProfile> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return children.iter().collect();
    }
    let needle = trimmed.to_lowercase();
    children
        .iter()
        .filter(|child| child.matches_query(&needle))
        .collect()
}

pub fn filter_by_status(children: &[ChildProfile], filter: StatusFilter) -> Vec<&ChildProfile> {
    children.iter().filter(|child| filter.matches(child)).collect()
}

pub fn achievement_highlights(children: &[ChildProfile]) -> Vec<&ChildProfile> {
    children
        .iter()
        .filter(|child| child.is_highlighted())
        .take(MAX_HIGHLIGHTS)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterOverview {
    pub total_children: usize,
    pub average_completion: u8,
    pub improving: usize,
    pub stable: usize,
    pub needs_attention: usize,
    pub total_study_streak: u32,
}

impl RosterOverview {
    pub fn from_children(children: &[ChildProfile]) -> Self {
        let mut overview = RosterOverview {
            total_children: children.len(),
            ..Default::default()
        };
        if children.is_empty() {
            return overview;
        }
        let completion_sum: u32 = children
            .iter()
            .map(|child| u32::from(child.course_completion))
            .sum();
        let average = (f64::from(completion_sum) / children.len() as f64).round();
        overview.average_completion = average.clamp(0.0, 100.0) as u8;
        for child in children {
            match child.status {
                ChildStatus::Improving => overview.improving += 1,
                ChildStatus::Stable => overview.stable += 1,
                ChildStatus::NeedsAttention => overview.needs_attention += 1,
            }
            overview.total_study_streak += child.study_streak;
        }
        overview
    }
}
