//! Offline templates used when the network is unreachable or no API token
//! was supplied.
//!
//! A prompt is mapped to a coarse [`Category`] by an ordered keyword scan,
//! and every category has a static, non-empty template written in the same
//! day-block format the model is asked to produce.

use std::fmt;

/// Coarse training category derived from prompt keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Short sprints (100m–400m).
    Sprints,
    /// Middle distance (800m–1500m).
    MiddleDistance,
    /// Long distance (5000m and up).
    LongDistance,
    /// Anything else.
    General,
}

impl Category {
    /// All categories, in classification priority order.
    pub const ALL: [Category; 4] = [
        Category::Sprints,
        Category::MiddleDistance,
        Category::LongDistance,
        Category::General,
    ];

    /// Keywords that select this category. `General` has none.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Sprints => &["sprint"],
            Category::MiddleDistance => &["middle", "800", "1500"],
            Category::LongDistance => &["long", "5000", "10000"],
            Category::General => &[],
        }
    }

    /// System prompt sent with requests for this category.
    pub fn system_prompt(self) -> &'static str {
        match self {
            Category::Sprints => {
                "You are an experienced sprint coach. Write a weekly training plan for sprinters. \
                 Start each day with the weekday name in capitals, follow it with a 'Focus:' line, \
                 then titled sections such as 'Warm-Up (10 minutes)' with bullet points."
            }
            Category::MiddleDistance => {
                "You are an experienced middle-distance coach (800m-1500m). Write a weekly training \
                 plan. Start each day with the weekday name in capitals, follow it with a 'Focus:' \
                 line, then titled sections such as 'Main Set (30 minutes)' with bullet points."
            }
            Category::LongDistance => {
                "You are an experienced distance running coach (5000m and longer). Write a weekly \
                 training plan. Start each day with the weekday name in capitals, follow it with a \
                 'Focus:' line, then titled sections such as 'Long Run (60 minutes)' with bullet points."
            }
            Category::General => {
                "You are an experienced track and field coach. Write a weekly training plan. Start \
                 each day with the weekday name in capitals, follow it with a 'Focus:' line, then \
                 titled sections such as 'Warm-Up (10 minutes)' with bullet points."
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Sprints => "sprints",
            Category::MiddleDistance => "middle_distance",
            Category::LongDistance => "long_distance",
            Category::General => "general",
        };
        f.write_str(name)
    }
}

/// Classifies a prompt. Matching is case-insensitive and the first
/// category whose keyword appears wins.
pub fn classify(prompt: &str) -> Category {
    let lowered = prompt.to_lowercase();
    Category::ALL
        .into_iter()
        .find(|category| category.keywords().iter().any(|kw| lowered.contains(kw)))
        .unwrap_or(Category::General)
}

const SPRINTS_TEMPLATE: &str = "\
Offline sprint plan. Connect to the internet for a personalised program.

MONDAY
Focus: Acceleration
Warm-Up (15 minutes)
• Easy jog 5 min
• Dynamic drills: A-skips, B-skips, high knees
Main Set (20 minutes)
• 6 x 30m block starts, full recovery
Cool-Down (10 minutes)
• Walk and static stretching

WEDNESDAY
Focus: Max Velocity
Warm-Up (15 minutes)
• Easy jog 5 min
• Strides: 3 x 60m
Main Set (25 minutes)
• 4 x 60m flying sprints, 4 min rest
Recovery: walk back between reps

FRIDAY
Focus: Speed Endurance
Warm-Up (15 minutes)
• Easy jog and drills
Main Set (25 minutes)
• 3 x 150m at 95%, 8 min rest
Cool-Down (10 minutes)
• Easy jog 5 min";

const MIDDLE_DISTANCE_TEMPLATE: &str = "\
Offline middle-distance plan. Connect to the internet for a personalised program.

TUESDAY
Focus: Speed Endurance
Warm-Up (15 minutes)
• Easy jog 10 min
• Drills and 4 strides
Main Set (30 minutes)
• 6 x 400m at 800m pace, 90 s jog recovery
Cool-Down (10 minutes)
• Easy jog

THURSDAY
Focus: Aerobic Threshold
Warm-Up (15 minutes)
• Easy jog 10 min
Main Set (25 minutes)
• 3 x 1000m at threshold, 2 min rest
Pace: comfortably hard

SATURDAY
Focus: Long Aerobic Run
Long Run (50 minutes)
• Conversational pace throughout";

const LONG_DISTANCE_TEMPLATE: &str = "\
Offline long-distance plan. Connect to the internet for a personalised program.

MONDAY
Focus: Recovery
Easy Run (40 minutes)
• Conversational pace

WEDNESDAY
Focus: Tempo
Warm-Up (15 minutes)
• Easy jog
Main Set (30 minutes)
• 20 min continuous tempo
Cool-Down (10 minutes)
• Easy jog

SUNDAY
Focus: Endurance
Long Run (90 minutes)
• Steady pace, take fluids every 30 min
Fuel: practise race-day nutrition";

const GENERAL_TEMPLATE: &str = "\
Offline training plan. Connect to the internet for a personalised program.

MONDAY
Focus: General Conditioning
Warm-Up (10 minutes)
• Easy jog 5 min
• Dynamic stretching
Main Set (30 minutes)
• 4 x 200m relaxed strides
• Core circuit: 3 rounds
Cool-Down (10 minutes)
• Walk and stretch

THURSDAY
Focus: Aerobic Base
Easy Run (30 minutes)
• Conversational pace

SATURDAY
Focus: Mobility
Mobility (20 minutes)
• Hip and ankle mobility routine";

/// Static template lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTemplateProvider;

impl OfflineTemplateProvider {
    /// Creates a new provider.
    pub fn new() -> Self {
        Self
    }

    /// Classifies a prompt; see [`classify`].
    pub fn classify(&self, prompt: &str) -> Category {
        classify(prompt)
    }

    /// Returns the template for a category.
    pub fn template(&self, category: Category) -> &'static str {
        match category {
            Category::Sprints => SPRINTS_TEMPLATE,
            Category::MiddleDistance => MIDDLE_DISTANCE_TEMPLATE,
            Category::LongDistance => LONG_DISTANCE_TEMPLATE,
            Category::General => GENERAL_TEMPLATE,
        }
    }

    /// Classifies `prompt` and returns its template.
    pub fn template_for(&self, prompt: &str) -> &'static str {
        self.template(self.classify(prompt))
    }
}
