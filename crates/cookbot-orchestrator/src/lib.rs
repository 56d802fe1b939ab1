//! # cookbot-orchestrator
//!
//! Daily run orchestration for cookbot.
//!
//! This crate provides:
//! - The generation-validation workshop (pure state machine + engine)
//! - The model-backed roles: analyst, search strategist, trend analyst,
//!   chef, meal planner
//! - The pipeline coordinator tying one daily run together
//! - Markdown daily plan rendering

mod daily_plan;
mod pipeline;
mod prompt;
mod roles;
mod state_machine;
mod workshop;

pub use daily_plan::{DailyPlan, DailyPlanWriter, PlannedOption};
pub use pipeline::{Pipeline, RunOutcome, NONE_ACCEPTED, NO_IDEAS};
pub use prompt::AnalystContext;
pub use roles::{
    extract_idea_names, parse_meal_plan, Analysis, Chef, DeepAnalyst, MealPlanner,
    RecipeGenerator, SearchStrategist, TrendAnalyst, DEFAULT_BRIEF,
};
pub use state_machine::{Action, Event, State, WorkshopMachine, PARSE_FAILURE_NOTE};
pub use workshop::{Draft, Workshop, WorkshopOutcome};
