//! Core type definitions for cookbot

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One ingredient line of a recipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, deserialize_with = "lenient_string")]
    pub item: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit: String,
}

impl Ingredient {
    pub fn new(item: impl Into<String>, amount: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            amount: amount.into(),
            unit: unit.into(),
        }
    }

    /// Amount with its unit, without repeating a unit the amount already carries
    ///
    /// `("200g", "g")` renders as `200g`, `("2", "tbsp")` as `2 tbsp`.
    pub fn display_amount(&self) -> String {
        let amount = self.amount.trim();
        let unit = self.unit.trim();

        if !unit.is_empty() && amount.to_lowercase().contains(&unit.to_lowercase()) {
            amount.to_string()
        } else if !amount.is_empty() && !unit.is_empty() {
            format!("{} {}", amount, unit)
        } else if amount.is_empty() {
            unit.to_string()
        } else {
            amount.to_string()
        }
    }
}

/// Structured recipe produced by the generator and the meal planner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(deserialize_with = "lenient_string")]
    pub dish_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub prep_time: String,
    #[serde(default, deserialize_with = "lenient_ingredients")]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, deserialize_with = "lenient_steps")]
    pub steps: Vec<String>,
    /// Only meal-planner recipes carry their own estimate
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub calories: Option<String>,
}

impl Recipe {
    pub fn named(dish_name: impl Into<String>) -> Self {
        Self {
            dish_name: dish_name.into(),
            description: String::new(),
            prep_time: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            calories: None,
        }
    }

    /// A recipe is usable only when it has a name
    pub fn is_well_formed(&self) -> bool {
        !self.dish_name.trim().is_empty()
    }
}

/// Metadata set by the last passing auditor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAttributes {
    /// Calorie estimate as reported by the nutrition auditor, `"?"` if absent
    pub calories: String,
}

impl FinalAttributes {
    pub const UNKNOWN: &'static str = "?";

    pub fn with_calories(calories: Option<String>) -> Self {
        Self {
            calories: calories
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| Self::UNKNOWN.to_string()),
        }
    }
}

/// Auxiliary context handed to the generator verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidelines {
    pub daily_brief: String,
    pub user_insights: Vec<String>,
}

impl Guidelines {
    pub fn new(daily_brief: impl Into<String>, user_insights: Vec<String>) -> Self {
        Self {
            daily_brief: daily_brief.into(),
            user_insights,
        }
    }

    /// Compact rendering for prompts
    pub fn to_prompt_text(&self) -> String {
        let insights = if self.user_insights.is_empty() {
            "none".to_string()
        } else {
            self.user_insights.join("; ")
        };
        format!(
            "Daily brief: {}\nKnown preferences: {}",
            self.daily_brief, insights
        )
    }
}

/// A workshop-approved recipe with its audit attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedRecipe {
    pub idea: String,
    pub recipe: Recipe,
    pub attributes: FinalAttributes,
}

/// Breakfast and dinner planned around an accepted lunch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    #[serde(default)]
    pub breakfast: Option<Recipe>,
    #[serde(default)]
    pub dinner: Option<Recipe>,
}

impl MealPlan {
    /// Minimal plan used when the planner's answer is unusable
    pub fn fallback() -> Self {
        Self {
            breakfast: Some(Recipe::named("Porridge")),
            dinner: Some(Recipe::named("Salad")),
        }
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Models emit `"amount": 200` as often as `"amount": "200"`
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(value_to_string)
}

fn lenient_optional_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(value_to_string(other)),
    })
}

/// Ingredients may come as objects or as bare `"200 g flour"` lines
fn lenient_ingredients<'de, D>(deserializer: D) -> std::result::Result<Vec<Ingredient>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };

    Ok(items
        .into_iter()
        .map(|value| match value {
            Value::Object(map) => {
                let field = |key: &str| map.get(key).cloned().map(value_to_string);
                let item = field("item")
                    .filter(|item| !item.trim().is_empty())
                    .or_else(|| field("name"))
                    .unwrap_or_default();
                Ingredient::new(
                    item,
                    field("amount").unwrap_or_default(),
                    field("unit").unwrap_or_default(),
                )
            }
            other => Ingredient::new(value_to_string(other), "", ""),
        })
        .filter(|ingredient| !ingredient.item.trim().is_empty())
        .collect())
}

/// Steps may be strings, `{"step": 1, "text": ".."}` objects, or one string
fn lenient_steps<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };

    Ok(items
        .into_iter()
        .map(step_text)
        .filter(|step| !step.trim().is_empty())
        .collect())
}

fn step_text(value: Value) -> String {
    let Value::Object(map) = value else {
        return value_to_string(value);
    };

    let text = STEP_TEXT_KEYS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()).cloned());
    match text {
        Some(text) => value_to_string(text),
        None => map
            .into_iter()
            .map(|(_, v)| value_to_string(v))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

const STEP_TEXT_KEYS: [&str; 4] = ["text", "instruction", "description", "step"];
