//! Public types for the fitgen API.

mod candidate;
mod media;
mod model;
mod outcome;
mod plan;

pub use candidate::CandidateList;
pub use media::{AudioClip, ImageInput};
pub use model::ModelDescriptor;
pub use outcome::{Failure, FailureClass, InvocationOutcome};
pub use plan::{
    DEFAULT_PLAN_DAYS, Exercise, FitnessPlan, FitnessProfile, Meal, MealDay, PlanSubject,
    WorkoutDay,
};
