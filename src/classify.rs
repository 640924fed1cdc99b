//! Meal vs. exercise classification of free-text subject names.
//!
//! One pure function, [`classify_subject`], parameterised by a
//! [`KeywordProfile`]. The three call sites (describe prompts, image lookups
//! and plan items) historically used different keyword lists. The lists are
//! kept separate here until it is confirmed whether the differences matter;
//! bump [`IMAGE_CACHE_VERSION`](crate::cache::IMAGE_CACHE_VERSION) whenever the
//! image-lookup list changes.

use serde::Serialize;

/// What a subject name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Meal,
    Exercise,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectKind::Meal => "meal",
            SubjectKind::Exercise => "exercise",
        }
    }
}

/// Keyword set used by a particular caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordProfile {
    /// Choosing the prompt template for `describe`.
    Describe,
    /// Choosing the search query for image lookups.
    ImageLookup,
    /// Tagging names extracted from a generated plan.
    PlanItems,
}

const DESCRIBE_MEAL: &[&str] = &[
    "breakfast", "lunch", "dinner", "snack", "salad", "soup", "smoothie", "oat", "rice",
    "chicken", "egg", "toast", "yogurt", "sandwich", "wrap", "bowl", "pasta", "fish", "salmon",
    "tofu", "beans", "fruit", "shake",
];

const IMAGE_MEAL: &[&str] = &[
    "breakfast", "lunch", "dinner", "snack", "salad", "soup", "smoothie", "oat", "rice",
    "chicken", "egg", "toast", "yogurt", "sandwich", "wrap", "bowl", "pasta", "fish", "salmon",
    "tofu", "beans", "fruit", "berries", "avocado", "quinoa", "curry", "dal", "paneer", "roti",
    "milk", "nuts",
];

const PLAN_MEAL: &[&str] = &[
    "breakfast", "lunch", "dinner", "snack", "salad", "soup", "smoothie", "oat", "rice",
    "chicken", "egg", "toast", "yogurt", "sandwich", "wrap", "bowl", "pasta", "fish", "salmon",
    "tofu", "beans", "fruit", "berries", "meal", "porridge",
];

/// Exercise words win over meal words when both match (e.g. "protein shake
/// after squats" is still about squats). Matched at word starts.
const EXERCISE_OVERRIDE: &[&str] = &[
    "push-up", "pushup", "push up", "squat", "lunge", "plank", "deadlift", "pull-up",
    "pullup", "burpee", "crunch", "jumping jack", "stretch", "cycling", "yoga", "sprint",
];

/// Short override words that also begin food names ("curly kale", "runner
/// beans", "pressed juice"). Matched as whole words only.
const EXERCISE_OVERRIDE_WORDS: &[&str] = &[
    "press", "presses", "curl", "curls", "row", "rows", "rowing", "run", "runs", "running",
    "jog", "jogs", "jogging", "raise", "raises", "bridge", "bridges", "walk", "walks",
    "walking",
];

impl KeywordProfile {
    fn meal_keywords(self) -> &'static [&'static str] {
        match self {
            KeywordProfile::Describe => DESCRIBE_MEAL,
            KeywordProfile::ImageLookup => IMAGE_MEAL,
            KeywordProfile::PlanItems => PLAN_MEAL,
        }
    }

    /// Plan items carry explicit context from their section, so only the
    /// other two profiles apply the exercise override.
    fn uses_exercise_override(self) -> bool {
        !matches!(self, KeywordProfile::PlanItems)
    }
}

/// Classify `name` as a meal or an exercise.
///
/// Matching is case-insensitive substring search. Anything that matches no
/// meal keyword is an exercise.
pub fn classify_subject(name: &str, profile: KeywordProfile) -> SubjectKind {
    let lower = name.to_lowercase();

    if profile.uses_exercise_override() && has_exercise_override(&lower) {
        return SubjectKind::Exercise;
    }

    if contains_any(&lower, profile.meal_keywords()) {
        SubjectKind::Meal
    } else {
        SubjectKind::Exercise
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn has_exercise_override(lower: &str) -> bool {
    EXERCISE_OVERRIDE.iter().any(|w| starts_word(lower, w))
        || lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| EXERCISE_OVERRIDE_WORDS.contains(&word))
}

/// True when `needle` occurs at the start of a word ("squat" matches
/// "squats" but not "bisquat").
fn starts_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(idx, _)| {
        haystack[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}
