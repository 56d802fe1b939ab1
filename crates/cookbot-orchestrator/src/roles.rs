//! Model-backed agent roles
//!
//! Each role is a narrow prompt/response contract over the gateway. Roles
//! return typed values and fall back to defaults when the model's answer is
//! unusable; they never fail.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use cookbot_agent::{extract_json_object, string_field, string_list_field, Gateway};
use cookbot_core::{CuisineCatalog, MealPlan, Recipe};

use crate::prompt::{self, AnalystContext};
use crate::workshop::Draft;

/// Brief used when the analyst gives none
pub const DEFAULT_BRIEF: &str = "Standard: something cheap and tasty";

/// Keys under which idea objects carry their name, in lookup order
const IDEA_NAME_KEYS: [&str; 4] = ["nazwa", "idea", "name", "dish_name"];

/// Produces recipe drafts (allows mocking in tests)
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// Raw answer for the draft's current state; parsed by the workshop
    async fn generate(&self, draft: &Draft) -> String;
}

/// The head chef: writes and revises recipes
pub struct Chef {
    gateway: Arc<Gateway>,
}

impl Chef {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl RecipeGenerator for Chef {
    async fn generate(&self, draft: &Draft) -> String {
        debug!("Chef working on '{}'", draft.idea);
        let request = self
            .gateway
            .request()
            .system(prompt::CHEF_SYSTEM)
            .user(prompt::chef_user(draft))
            .json_mode(true)
            .build();
        self.gateway.invoke(&request).await
    }
}

/// What the analyst concluded about today
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub daily_brief: String,
    pub suggested_cuisine: Option<String>,
    pub new_learning: Option<String>,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            daily_brief: DEFAULT_BRIEF.to_string(),
            suggested_cuisine: None,
            new_learning: None,
        }
    }
}

impl Analysis {
    pub fn from_response(text: &str) -> Self {
        let Some(object) = extract_json_object(text) else {
            return Self::default();
        };
        Self {
            daily_brief: string_field(&object, "daily_brief")
                .unwrap_or_else(|| DEFAULT_BRIEF.to_string()),
            suggested_cuisine: string_field(&object, "suggested_cuisine"),
            new_learning: string_field(&object, "new_learning"),
        }
    }
}

/// Reads history and the operator's request, sets the day's direction
pub struct DeepAnalyst {
    gateway: Arc<Gateway>,
}

impl DeepAnalyst {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn analyze(&self, context: &AnalystContext<'_>, catalog: &CuisineCatalog) -> Analysis {
        let request = self
            .gateway
            .request()
            .system(prompt::analyst_system(catalog))
            .user(prompt::analyst_user(context))
            .json_mode(true)
            .build();

        let analysis = Analysis::from_response(&self.gateway.invoke(&request).await);
        info!("Daily brief: {}", analysis.daily_brief);
        if let Some(suggested) = &analysis.suggested_cuisine {
            debug!("Analyst suggested {}", suggested);
        }
        analysis
    }
}

/// Turns cuisine + brief into web search queries
pub struct SearchStrategist {
    gateway: Arc<Gateway>,
    max_queries: usize,
}

impl SearchStrategist {
    pub fn new(gateway: Arc<Gateway>, max_queries: usize) -> Self {
        Self {
            gateway,
            max_queries,
        }
    }

    pub async fn queries(&self, cuisine: &str, brief: &str) -> Vec<String> {
        let request = self
            .gateway
            .request()
            .system(prompt::STRATEGIST_SYSTEM)
            .user(prompt::strategist_user(cuisine, brief))
            .json_mode(true)
            .build();

        let mut queries = extract_json_object(&self.gateway.invoke(&request).await)
            .map(|object| string_list_field(&object, "queries"))
            .unwrap_or_default();
        queries.truncate(self.max_queries);

        if queries.is_empty() {
            warn!("Strategist produced no queries");
        }
        queries
    }
}

/// Picks dish ideas from search data and history
pub struct TrendAnalyst {
    gateway: Arc<Gateway>,
}

impl TrendAnalyst {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn ideas(
        &self,
        cuisine: &str,
        search_data: &str,
        liked: &[String],
        recent_ideas: &[String],
    ) -> Vec<String> {
        let request = self
            .gateway
            .request()
            .system(prompt::TREND_ANALYST_SYSTEM)
            .user(prompt::trend_analyst_user(
                cuisine,
                search_data,
                liked,
                recent_ideas,
            ))
            .json_mode(true)
            .build();

        let ideas = extract_idea_names(&self.gateway.invoke(&request).await);
        info!("Found {} idea(s): {}", ideas.len(), ideas.join(", "));
        ideas
    }
}

/// Idea names from a `{"ideas": [...]}` answer
///
/// Entries may be plain strings or objects naming the dish under `nazwa`,
/// `idea`, `name`, or `dish_name` (first match wins). Unnamed entries and
/// repeats are skipped.
pub fn extract_idea_names(text: &str) -> Vec<String> {
    let Some(object) = extract_json_object(text) else {
        return Vec::new();
    };
    let Some(items) = object.get("ideas").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    for item in items {
        let name = match item {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Object(map) => idea_name(map),
            _ => None,
        };
        match name {
            Some(name) if !names.contains(&name) => names.push(name),
            Some(_) => {}
            None => warn!("Could not extract an idea name from {}", item),
        }
    }
    names
}

fn idea_name(map: &Map<String, Value>) -> Option<String> {
    IDEA_NAME_KEYS.iter().find_map(|key| string_field(map, key))
}

/// Plans breakfast and dinner around an accepted lunch
pub struct MealPlanner {
    gateway: Arc<Gateway>,
}

impl MealPlanner {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn plan(&self, lunch: &Recipe) -> MealPlan {
        let request = self
            .gateway
            .request()
            .system(prompt::MEAL_PLANNER_SYSTEM)
            .user(prompt::meal_planner_user(lunch))
            .json_mode(true)
            .build();

        parse_meal_plan(&self.gateway.invoke(&request).await)
    }
}

/// Read `{breakfast, dinner}`; unusable parts come from the fallback plan
pub fn parse_meal_plan(text: &str) -> MealPlan {
    let fallback = MealPlan::fallback();
    let Some(object) = extract_json_object(text) else {
        warn!("Meal planner answer unusable, using fallback plan");
        return fallback;
    };

    let meal = |key: &str| {
        object
            .get(key)
            .cloned()
            .and_then(|v| serde_json::from_value::<Recipe>(v).ok())
            .filter(Recipe::is_well_formed)
    };

    MealPlan {
        breakfast: meal("breakfast").or(fallback.breakfast),
        dinner: meal("dinner").or(fallback.dinner),
    }
}
