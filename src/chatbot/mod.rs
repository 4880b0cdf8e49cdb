use std::time::Duration;

mod session;

pub use session::{ChatMessage, ChatSession, Speaker};

const MS_PER_UNIT: u64 = 30;
pub const MIN_TYPING_DELAY: Duration = Duration::from_millis(1500);
pub const MAX_TYPING_DELAY: Duration = Duration::from_millis(4000);

pub const WELCOME: &str = "Hello! I'm Rafiq, your AI educational assistant. I can help you \
understand your children's progress, suggest study strategies, and answer questions about \
their learning journey. How can I assist you today?";

pub const QUICK_ACTIONS: [&str; 6] = [
    "📊 How are all my children doing?",
    "📚 Study strategies for Sophia",
    "📅 Create this week's schedule",
    "⚠️ What about the alerts?",
    "🎯 How to keep them motivated?",
    "📈 Show me progress trends",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Progress,
    StudyStrategies,
    Emma,
    Marcus,
    Sophia,
    Alexander,
    Isabella,
    Fallback,
}

struct Rule {
    topic: Topic,
    keywords: &'static [&'static str],
    response: &'static str,
}

const RULES: [Rule; 7] = [
    Rule {
        topic: Topic::Progress,
        keywords: &["progress", "performance"],
        response: "Based on your children's current data, I can see some interesting patterns! 📊\n\n\
✅ Emma is showing consistent improvement with an 85% course completion rate\n\
⚠️ Sophia might need some extra attention with her recent study drop\n\
🚀 Marcus is excelling with 94% completion\n\n\
Would you like me to create a personalized study plan for any specific child?",
    },
    Rule {
        topic: Topic::StudyStrategies,
        keywords: &["study", "learn", "improve"],
        response: "Great question! Here are some proven strategies I recommend: 📚\n\n\
🎯 Set up consistent study schedules\n\
⏰ Use the Pomodoro technique (25-min focused sessions)\n\
🏆 Create reward systems for completed lessons\n\
👥 Encourage peer learning\n\
🎮 Gamify the learning experience\n\n\
Which child would you like me to focus these strategies on?",
    },
    Rule {
        topic: Topic::Emma,
        keywords: &["emma"],
        response: "Emma is doing wonderfully! 🌟\n\n\
📈 85% course completion rate\n\
🎯 92% quiz average\n\
🔥 18-day study streak\n\
😊 Positive mood indicator\n\n\
She shows great consistency! I'd suggest maintaining her current momentum and perhaps \
introducing more challenging materials to keep her engaged. Would you like specific subject \
recommendations?",
    },
    Rule {
        topic: Topic::Marcus,
        keywords: &["marcus"],
        response: "Marcus is absolutely excelling! 🚀\n\n\
📈 94% course completion rate\n\
🎯 96% quiz average\n\
🔥 25-day study streak (impressive!)\n\
😎 Confident and stable\n\n\
He seems ready for advanced challenges. Consider enrolling him in accelerated programs or \
peer tutoring opportunities where he can help others too!",
    },
    Rule {
        topic: Topic::Sophia,
        keywords: &["sophia"],
        response: "I notice Sophia needs some extra support. 💙\n\n\
📊 Current status: 48% completion\n\
⚠️ Recent study drops detected\n\
📚 Reading comprehension concerns\n\n\
Recommended action plan:\n\
1️⃣ Shorter, more frequent study sessions\n\
2️⃣ Interactive learning games\n\
3️⃣ One-on-one tutoring support\n\
4️⃣ Identify any underlying challenges\n\n\
Would you like me to create a detailed recovery plan?",
    },
    Rule {
        topic: Topic::Alexander,
        keywords: &["alexander"],
        response: "Alexander is maintaining steady progress! 📊\n\n\
📈 78% completion rate\n\
🎯 88% quiz average\n\
🔥 14-day study streak\n\
🤔 Thoughtful learner\n\n\
To boost his performance, try:\n\
• Incorporating his interests into learning\n\
• Setting achievable weekly goals\n\
• Adding more interactive elements\n\n\
What subjects is he most interested in?",
    },
    Rule {
        topic: Topic::Isabella,
        keywords: &["isabella"],
        response: "Isabella is performing excellently! ⭐\n\n\
📈 91% completion rate\n\
🎯 93% quiz average\n\
🔥 22-day study streak\n\
😄 Very positive attitude\n\n\
She demonstrates strong discipline! She might benefit from:\n\
• Leadership opportunities\n\
• Helping other students\n\
• Advanced creative projects\n\
• Challenge-based learning\n\n\
She's ready for the next level!",
    },
];

const FALLBACK: &str = "That's an interesting question! 🤔\n\n\
I'm continuously learning to provide better insights. Right now, I can help you with:\n\n\
• 📊 Analyzing your children's progress\n\
• 📅 Creating personalized study schedules\n\
• 🎯 Suggesting learning strategies\n\
• ⚠️ Identifying areas needing attention\n\
• 🎮 Recommending educational tools\n\n\
Try asking me something like:\n\
• \"How is [child's name] doing?\"\n\
• \"Create a study plan for this week\"\n\
• \"What can I do about the alerts?\"\n\
• \"How to improve reading skills?\"\n\n\
What would you like to explore?";

/// First rule with a keyword contained in `input` (case-insensitive).
pub fn classify(input: &str) -> Topic {
    let lowered = input.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|rule| rule.topic)
        .unwrap_or(Topic::Fallback)
}

pub fn response_for(topic: Topic) -> &'static str {
    RULES
        .iter()
        .find(|rule| rule.topic == topic)
        .map(|rule| rule.response)
        .unwrap_or(FALLBACK)
}

pub fn select_response(input: &str) -> &'static str {
    response_for(classify(input))
}

/// How long the assistant "types" before `response` appears: 30 ms per
/// UTF-16 unit, clamped to 1.5–4 s.
pub fn typing_delay(response: &str) -> Duration {
    let units = response.encode_utf16().count() as u64;
    Duration::from_millis(units.saturating_mul(MS_PER_UNIT)).clamp(MIN_TYPING_DELAY, MAX_TYPING_DELAY)
}
