//! Auditor roles
//!
//! Each auditor judges a recipe against one narrow criterion and answers
//! with a [`Verdict`]. Auditors never modify the recipe.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use cookbot_agent::Gateway;
use cookbot_core::{Guidelines, Recipe};

use crate::verdict::Verdict;

/// Judges a recipe (allows mocking in tests)
#[async_trait]
pub trait Auditor: Send + Sync {
    /// Name prefixed to this auditor's feedback lines
    fn label(&self) -> &str;

    async fn audit(&self, recipe: &Recipe, guidelines: &Guidelines) -> Verdict;
}

const LOGISTICS_SYSTEM: &str = r#"You are the Logistics Auditor. You judge recipes by the cost and availability of their ingredients in an ordinary supermarket.

Rules:
1. Availability: most ingredients must be easy to find in a typical supermarket. One or two exotic ingredients are fine as accents, never as the base of the dish.
2. Cost: the recipe must be economical. Reject it when it needs many very expensive ingredients (saffron, beef tenderloin, large amounts of fresh seafood).
3. Decision: approve (`approved: true`) when cost and logistics are reasonable. Reject (`approved: false`) only for SERIOUS cost or availability problems. Always give a short rationale.

OUTPUT FORMAT (JSON):
{"approved": <true/false>, "feedback": "<short rationale>"}"#;

const NUTRITION_SYSTEM: &str = r#"You are the Nutrition Auditor. You judge recipes by nutritional balance and by compliance with the day's guidelines.

Rules:
1. Balance: the dish does not have to be a diet meal, but it must not be extreme (only fat and sugar).
2. Calories: give a rough calorie estimate. A main meal should land around 400-900 kcal; do not reject a sensible dish that is slightly outside.
3. Compliance: check the dish honors the guidelines (a vegetarian dish contains no meat). This is the most important criterion.
4. Decision: approve (`approved: true`) when acceptable. Reject (`approved: false`) only for glaring errors or extreme imbalance. Give a rationale.

OUTPUT FORMAT (JSON):
{"approved": <true/false>, "calories": "<estimated kcal>", "feedback": "<short rationale>"}"#;

/// The audit criteria cookbot applies, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    /// Ingredient cost and availability
    Logistics,
    /// Nutritional balance and guideline compliance
    Nutrition,
}

impl AuditKind {
    pub fn label(&self) -> &'static str {
        match self {
            AuditKind::Logistics => "Logistics",
            AuditKind::Nutrition => "Nutrition",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            AuditKind::Logistics => LOGISTICS_SYSTEM,
            AuditKind::Nutrition => NUTRITION_SYSTEM,
        }
    }

    pub fn user_prompt(&self, recipe: &Recipe, guidelines: &Guidelines) -> String {
        match self {
            AuditKind::Logistics => {
                let ingredients = serde_json::to_string(&recipe.ingredients).unwrap_or_default();
                format!(
                    "**Dish:** {}\n**Ingredients:** {}\n**Guidelines:**\n{}\n\nJudge the recipe's cost and logistics.",
                    recipe.dish_name,
                    ingredients,
                    guidelines.to_prompt_text()
                )
            }
            AuditKind::Nutrition => {
                let full = serde_json::to_string(recipe).unwrap_or_default();
                format!(
                    "**Dish:** {}\n**Ingredients and steps:** {}\n**Guidelines:**\n{}\n\nJudge the recipe's nutrition.",
                    recipe.dish_name,
                    full,
                    guidelines.to_prompt_text()
                )
            }
        }
    }
}

/// Auditor answered by the model through the gateway
pub struct ModelAuditor {
    kind: AuditKind,
    gateway: Arc<Gateway>,
}

impl ModelAuditor {
    pub fn new(kind: AuditKind, gateway: Arc<Gateway>) -> Self {
        Self { kind, gateway }
    }

    pub fn logistics(gateway: Arc<Gateway>) -> Self {
        Self::new(AuditKind::Logistics, gateway)
    }

    pub fn nutrition(gateway: Arc<Gateway>) -> Self {
        Self::new(AuditKind::Nutrition, gateway)
    }

    pub fn kind(&self) -> AuditKind {
        self.kind
    }
}

#[async_trait]
impl Auditor for ModelAuditor {
    fn label(&self) -> &str {
        self.kind.label()
    }

    async fn audit(&self, recipe: &Recipe, guidelines: &Guidelines) -> Verdict {
        debug!("{} audit of '{}'", self.kind.label(), recipe.dish_name);

        let request = self
            .gateway
            .request()
            .system(self.kind.system_prompt())
            .user(self.kind.user_prompt(recipe, guidelines))
            .json_mode(true)
            .build();

        Verdict::parse(&self.gateway.invoke(&request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbot_agent::{CredentialPool, FailureKind, GatewayPolicy, MockBackend};
    use cookbot_core::Ingredient;

    fn recipe() -> Recipe {
        let mut recipe = Recipe::named("Pierogi ruskie");
        recipe.ingredients = vec![Ingredient::new("Potatoes", "500", "g")];
        recipe
    }

    fn gateway(backend: Arc<MockBackend>) -> Arc<Gateway> {
        Arc::new(Gateway::new(
            backend,
            CredentialPool::new(["k"]),
            GatewayPolicy::default(),
        ))
    }

    #[test]
    fn test_prompts_carry_recipe_and_guidelines() {
        let guidelines = Guidelines::new("vegetarian", vec![]);
        let logistics = AuditKind::Logistics.user_prompt(&recipe(), &guidelines);
        assert!(logistics.contains("Pierogi ruskie"));
        assert!(logistics.contains("Potatoes"));
        assert!(logistics.contains("vegetarian"));

        let nutrition = AuditKind::Nutrition.user_prompt(&recipe(), &guidelines);
        assert!(nutrition.contains("\"dish_name\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_auditor_routes_by_role() {
        let backend = Arc::new(
            MockBackend::new()
                .with_response("You are the Logistics Auditor", r#"{"approved": false, "feedback": "pricey"}"#)
                .with_response(
                    "You are the Nutrition Auditor",
                    r#"{"approved": true, "calories": "700"}"#,
                ),
        );
        let gw = gateway(backend.clone());
        let guidelines = Guidelines::default();

        let logistics = ModelAuditor::logistics(gw.clone());
        let verdict = logistics.audit(&recipe(), &guidelines).await;
        assert_eq!(
            verdict.feedback_note(logistics.label()).as_deref(),
            Some("Logistics: pricey")
        );

        let nutrition = ModelAuditor::nutrition(gw);
        let verdict = nutrition.audit(&recipe(), &guidelines).await;
        assert_eq!(verdict.calories(), Some("700"));
        assert!(backend.calls().iter().all(|c| c.json_mode));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_call_is_malformed() {
        let backend = Arc::new(MockBackend::failing(FailureKind::TransientOther));
        let auditor = ModelAuditor::nutrition(gateway(backend));
        let verdict = auditor.audit(&recipe(), &Guidelines::default()).await;
        assert_eq!(verdict, Verdict::Malformed);
    }
}
