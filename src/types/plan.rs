//! Fitness profile input and generated plan output.

use serde::{Deserialize, Deserializer, Serialize};

use crate::classify::{self, KeywordProfile, SubjectKind};
use crate::{FitgenError, Result};

/// Default plan length when the profile doesn't ask for one.
pub const DEFAULT_PLAN_DAYS: u8 = 7;

/// User-supplied profile the plan is generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessProfile {
    #[serde(default)]
    pub name: Option<String>,
    pub age: u32,
    #[serde(default)]
    pub gender: Option<String>,
    pub height_cm: f32,
    pub weight_kg: f32,
    /// Free-text goal, e.g. "lose fat" or "build muscle".
    pub goal: String,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub diet_preference: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub medical_notes: Option<String>,
    #[serde(default)]
    pub days: Option<u8>,
}

impl FitnessProfile {
    /// Reject profiles that cannot produce a meaningful prompt.
    pub fn validate(&self) -> Result<()> {
        if self.age == 0 || self.age > 120 {
            return Err(FitgenError::InvalidInput(format!(
                "age must be between 1 and 120, got {}",
                self.age
            )));
        }
        if !(self.height_cm.is_finite() && self.height_cm > 0.0) {
            return Err(FitgenError::InvalidInput("height_cm must be positive".into()));
        }
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            return Err(FitgenError::InvalidInput("weight_kg must be positive".into()));
        }
        if self.goal.trim().is_empty() {
            return Err(FitgenError::InvalidInput("goal must not be empty".into()));
        }
        if let Some(days) = self.days {
            if days == 0 || days > 14 {
                return Err(FitgenError::InvalidInput(format!(
                    "days must be between 1 and 14, got {days}"
                )));
            }
        }
        Ok(())
    }

    pub fn plan_days(&self) -> u8 {
        self.days.unwrap_or(DEFAULT_PLAN_DAYS)
    }
}

/// A generated workout and diet plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessPlan {
    #[serde(default)]
    pub summary: Option<String>,
    pub workout: Vec<WorkoutDay>,
    pub diet: Vec<MealDay>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day: String,
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub sets: Option<u32>,
    /// Kept as text: models write both `12` and `"8-10"`.
    #[serde(default, deserialize_with = "string_or_number")]
    pub reps: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub rest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDay {
    pub day: String,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    /// Slot in the day, e.g. "breakfast".
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A named plan item together with its meal/exercise classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSubject {
    pub name: String,
    pub kind: SubjectKind,
}

impl FitnessPlan {
    /// Every exercise and meal name in the plan, classified, first occurrence only.
    pub fn subjects(&self) -> Vec<PlanSubject> {
        let names = self
            .workout
            .iter()
            .flat_map(|d| d.exercises.iter().map(|e| e.name.as_str()))
            .chain(
                self.diet
                    .iter()
                    .flat_map(|d| d.meals.iter().map(|m| m.name.as_str())),
            );

        let mut seen = std::collections::HashSet::new();
        names
            .filter(|n| seen.insert(n.to_lowercase()))
            .map(|n| PlanSubject {
                name: n.to_string(),
                kind: classify::classify_subject(n, KeywordProfile::PlanItems),
            })
            .collect()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
