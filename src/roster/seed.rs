use super::{
    ChildAlert, ChildId, ChildProfile, ChildStatus, Mood, MoodType, QuizTrend, RecentActivity,
};

const AVATAR_BASE: &str = "https://images.pexels.com/photos";
const AVATAR_QUERY: &str = "auto=compress&cs=tinysrgb&w=200&h=200&dpr=1";

fn avatar(photo: u32) -> String {
    format!("{AVATAR_BASE}/{photo}/pexels-photo-{photo}.jpeg?{AVATAR_QUERY}")
}

struct Sample {
    id: &'static str,
    name: &'static str,
    photo: u32,
    grade: &'static str,
    completion: u8,
    quiz: u8,
    streak: u32,
    best: u32,
    emoji: &'static str,
    mood: MoodType,
    status: ChildStatus,
    quiz_date: &'static str,
    subject: &'static str,
    alerts: &'static [ChildAlert],
    trend: QuizTrend,
    mood_update: &'static str,
    activity: (u32, f32, u32),
    tooltip: Option<&'static str>,
}

const SAMPLES: [Sample; 5] = [
    Sample {
        id: "1",
        name: "Emma Rodriguez",
        photo: 1642228,
        grade: "5th Grade",
        completion: 85,
        quiz: 92,
        streak: 18,
        best: 25,
        emoji: "😊",
        mood: MoodType::Happy,
        status: ChildStatus::Improving,
        quiz_date: "Nov 2",
        subject: "Mathematics",
        alerts: &[],
        trend: QuizTrend::Up,
        mood_update: "Updated 2 hours ago",
        activity: (12, 8.5, 3),
        tooltip: None,
    },
    Sample {
        id: "2",
        name: "Marcus Thompson",
        photo: 1758144,
        grade: "7th Grade",
        completion: 94,
        quiz: 96,
        streak: 25,
        best: 30,
        emoji: "😎",
        mood: MoodType::Happy,
        status: ChildStatus::Stable,
        quiz_date: "Nov 5",
        subject: "Science",
        alerts: &[],
        trend: QuizTrend::Stable,
        mood_update: "Updated 1 hour ago",
        activity: (15, 12.0, 5),
        tooltip: None,
    },
    Sample {
        id: "3",
        name: "Sophia Chen",
        photo: 1024311,
        grade: "3rd Grade",
        completion: 48,
        quiz: 67,
        streak: 4,
        best: 12,
        emoji: "😓",
        mood: MoodType::Sad,
        status: ChildStatus::NeedsAttention,
        quiz_date: "Nov 1",
        subject: "Reading",
        alerts: &[ChildAlert::StudyDrop, ChildAlert::MissedQuiz],
        trend: QuizTrend::Down,
        mood_update: "Updated 3 hours ago",
        activity: (5, 3.5, 1),
        tooltip: Some(
            "Reading comprehension scores dropped 15% this week. Consider additional practice sessions.",
        ),
    },
    Sample {
        id: "4",
        name: "Alexander Kim",
        photo: 1681010,
        grade: "6th Grade",
        completion: 78,
        quiz: 88,
        streak: 14,
        best: 20,
        emoji: "😐",
        mood: MoodType::Neutral,
        status: ChildStatus::Stable,
        quiz_date: "Nov 7",
        subject: "History",
        alerts: &[],
        trend: QuizTrend::Stable,
        mood_update: "Updated 4 hours ago",
        activity: (10, 7.0, 2),
        tooltip: None,
    },
    Sample {
        id: "5",
        name: "Isabella Martinez",
        photo: 1845208,
        grade: "4th Grade",
        completion: 91,
        quiz: 93,
        streak: 22,
        best: 28,
        emoji: "😄",
        mood: MoodType::Happy,
        status: ChildStatus::Improving,
        quiz_date: "Nov 3",
        subject: "Art",
        alerts: &[],
        trend: QuizTrend::Up,
        mood_update: "Updated 1 hour ago",
        activity: (14, 9.0, 4),
        tooltip: None,
    },
];

/// The five demo children the dashboard ships with.
pub fn sample_children() -> Vec<ChildProfile> {
    SAMPLES
        .iter()
        .map(|sample| {
            let (completed_lessons, hours_studied, badges_earned) = sample.activity;
            ChildProfile {
                id: ChildId::new(sample.id),
                name: sample.name.to_string(),
                avatar: avatar(sample.photo),
                grade_level: sample.grade.to_string(),
                course_completion: sample.completion,
                quiz_average: sample.quiz,
                study_streak: sample.streak,
                personal_best_streak: Some(sample.best),
                mood: Mood {
                    emoji: sample.emoji.to_string(),
                    kind: sample.mood,
                },
                status: sample.status,
                next_quiz_date: sample.quiz_date.to_string(),
                next_quiz_subject: sample.subject.to_string(),
                alerts: sample.alerts.to_vec(),
                tooltip: sample.tooltip.map(str::to_string),
                recent_activity: Some(RecentActivity {
                    completed_lessons,
                    hours_studied,
                    badges_earned,
                }),
                quiz_trend: Some(sample.trend),
                last_mood_update: Some(sample.mood_update.to_string()),
            }
        })
        .collect()
}
