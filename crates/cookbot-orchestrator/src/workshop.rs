//! Generation-validation workshop engine
//!
//! Turns one idea into one accepted recipe, or gives up after the iteration
//! bound. The engine only executes the actions the state machine emits; all
//! decisions live in [`WorkshopMachine::transition`].

use std::sync::Arc;
use tracing::{debug, info, warn};

use cookbot_agent::parse_structured;
use cookbot_core::{AcceptedRecipe, FinalAttributes, Guidelines, Recipe};
use cookbot_validation::{Auditor, Verdict};

use crate::roles::RecipeGenerator;
use crate::state_machine::{Action, Event, State, WorkshopMachine};

/// Unit of work for one idea
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Short free-text seed
    pub idea: String,
    /// Cuisine constraint
    pub category: String,
    /// Passed to the generator verbatim
    pub guidelines: Guidelines,
    /// Rejection rationales, one per failed iteration; append-only
    pub feedback_history: Vec<String>,
    /// Latest well-formed recipe
    pub generated_work: Option<Recipe>,
    /// Set by the last passing auditor, only on success
    pub final_attributes: Option<FinalAttributes>,
}

impl Draft {
    pub fn new(idea: impl Into<String>, category: impl Into<String>, guidelines: Guidelines) -> Self {
        Self {
            idea: idea.into(),
            category: category.into(),
            guidelines,
            feedback_history: Vec::new(),
            generated_work: None,
            final_attributes: None,
        }
    }
}

/// Result of running one draft through the workshop
#[derive(Debug, Clone)]
pub struct WorkshopOutcome {
    pub state: State,
    /// Generation rounds started
    pub iterations: usize,
    pub draft: Draft,
}

impl WorkshopOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self.state, State::Accepted { .. })
    }

    /// The accepted recipe with its attributes; `None` unless accepted
    pub fn accepted(&self) -> Option<AcceptedRecipe> {
        if !self.is_accepted() {
            return None;
        }
        let recipe = self.draft.generated_work.clone()?;
        let attributes = self.draft.final_attributes.clone()?;
        Some(AcceptedRecipe {
            idea: self.draft.idea.clone(),
            recipe,
            attributes,
        })
    }

    pub fn into_accepted(self) -> Option<AcceptedRecipe> {
        self.accepted()
    }
}

/// Generator plus the two auditors, driven by the state machine
pub struct Workshop {
    machine: WorkshopMachine,
    generator: Arc<dyn RecipeGenerator>,
    cost_auditor: Arc<dyn Auditor>,
    nutrition_auditor: Arc<dyn Auditor>,
}

impl Workshop {
    pub fn new(
        machine: WorkshopMachine,
        generator: Arc<dyn RecipeGenerator>,
        cost_auditor: Arc<dyn Auditor>,
        nutrition_auditor: Arc<dyn Auditor>,
    ) -> Self {
        Self {
            machine,
            generator,
            cost_auditor,
            nutrition_auditor,
        }
    }

    pub fn machine(&self) -> &WorkshopMachine {
        &self.machine
    }

    /// Run a fresh draft for `idea`
    pub async fn run(&self, idea: &str, category: &str, guidelines: Guidelines) -> WorkshopOutcome {
        self.run_draft(Draft::new(idea, category, guidelines)).await
    }

    /// Drive `draft` until the machine reaches a terminal state
    pub async fn run_draft(&self, mut draft: Draft) -> WorkshopOutcome {
        info!("Workshop: '{}' ({})", draft.idea, draft.category);

        let (mut state, mut actions) = self.machine.start();
        let mut iterations = 0;

        loop {
            let mut next_event = None;

            for action in actions {
                match action {
                    Action::RunGenerator { iteration } => {
                        iterations = iteration;
                        next_event = Some(self.generate(&mut draft).await);
                    }
                    Action::RunCostAudit => {
                        next_event = Some(self.audit_cost(&draft).await);
                    }
                    Action::RunNutritionAudit => {
                        next_event = Some(self.audit_nutrition(&draft).await);
                    }
                    Action::AppendFeedback { note } => {
                        debug!("Feedback: {}", note);
                        draft.feedback_history.push(note);
                    }
                    Action::Accept { calories } => {
                        draft.final_attributes = Some(FinalAttributes::with_calories(calories));
                    }
                    Action::LogActivity { message } => debug!("{}", message),
                }
            }

            if state.is_terminal() {
                break;
            }

            let Some(event) = next_event else {
                state = State::Failed {
                    reason: format!("No event produced in state {:?}", state),
                };
                break;
            };

            let (next_state, next_actions) = self.machine.transition(state, event);
            state = next_state;
            actions = next_actions;
        }

        match &state {
            State::Accepted { iterations } => {
                info!("Workshop accepted '{}' after {} iteration(s)", draft.idea, iterations)
            }
            State::Failed { reason } => warn!("Workshop gave up on '{}': {}", draft.idea, reason),
            _ => {}
        }

        WorkshopOutcome {
            state,
            iterations,
            draft,
        }
    }

    async fn generate(&self, draft: &mut Draft) -> Event {
        let text = self.generator.generate(draft).await;
        match parse_structured::<Recipe>(&text).filter(Recipe::is_well_formed) {
            Some(recipe) => {
                let dish_name = recipe.dish_name.clone();
                draft.generated_work = Some(recipe);
                Event::Generated { dish_name }
            }
            None => Event::GenerationUnusable,
        }
    }

    async fn audit_cost(&self, draft: &Draft) -> Event {
        let Some(recipe) = &draft.generated_work else {
            return Event::GenerationUnusable;
        };
        let verdict = self.cost_auditor.audit(recipe, &draft.guidelines).await;
        match verdict.feedback_note(self.cost_auditor.label()) {
            None => Event::CostApproved,
            Some(note) => Event::CostRejected { note },
        }
    }

    async fn audit_nutrition(&self, draft: &Draft) -> Event {
        let Some(recipe) = &draft.generated_work else {
            return Event::GenerationUnusable;
        };
        let verdict = self.nutrition_auditor.audit(recipe, &draft.guidelines).await;
        match verdict {
            Verdict::Approved { calories, .. } => Event::NutritionApproved { calories },
            rejected => Event::NutritionRejected {
                note: rejected
                    .feedback_note(self.nutrition_auditor.label())
                    .unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a queue; the last reply repeats
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<String>>,
        seen_feedback: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedGenerator {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                seen_feedback: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RecipeGenerator for ScriptedGenerator {
        async fn generate(&self, draft: &Draft) -> String {
            self.seen_feedback
                .lock()
                .unwrap()
                .push(draft.feedback_history.clone());
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap_or_default()
            }
        }
    }

    struct ScriptedAuditor {
        label: &'static str,
        verdicts: Mutex<VecDeque<Verdict>>,
        calls: Mutex<usize>,
    }

    impl ScriptedAuditor {
        fn new(label: &'static str, verdicts: Vec<Verdict>) -> Arc<Self> {
            Arc::new(Self {
                label,
                verdicts: Mutex::new(verdicts.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Auditor for ScriptedAuditor {
        fn label(&self) -> &str {
            self.label
        }

        async fn audit(&self, _recipe: &Recipe, _guidelines: &Guidelines) -> Verdict {
            *self.calls.lock().unwrap() += 1;
            let mut verdicts = self.verdicts.lock().unwrap();
            if verdicts.len() > 1 {
                verdicts.pop_front().unwrap()
            } else {
                verdicts.front().cloned().unwrap_or(Verdict::Malformed)
            }
        }
    }

    fn approve(calories: Option<&str>) -> Verdict {
        Verdict::Approved {
            rationale: None,
            calories: calories.map(str::to_string),
        }
    }

    fn reject(rationale: &str) -> Verdict {
        Verdict::Rejected {
            rationale: rationale.to_string(),
        }
    }

    const RECIPE: &str = r#"{"dish_name": "Bigos", "ingredients": [{"item": "Cabbage", "amount": 1, "unit": "kg"}]}"#;

    fn workshop(
        generator: Arc<ScriptedGenerator>,
        cost: Arc<ScriptedAuditor>,
        nutrition: Arc<ScriptedAuditor>,
    ) -> Workshop {
        Workshop::new(WorkshopMachine::new(3), generator, cost, nutrition)
    }

    #[tokio::test]
    async fn test_success_in_one_iteration() {
        let generator = ScriptedGenerator::new(&[RECIPE]);
        let cost = ScriptedAuditor::new("Logistics", vec![approve(None)]);
        let nutrition = ScriptedAuditor::new("Nutrition", vec![approve(Some("720"))]);

        let outcome = workshop(generator, cost, nutrition)
            .run("Hunter's stew", "Polish (Old Polish)", Guidelines::default())
            .await;

        assert_eq!(outcome.state, State::Accepted { iterations: 1 });
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.draft.feedback_history.is_empty());

        let accepted = outcome.accepted().unwrap();
        assert_eq!(accepted.idea, "Hunter's stew");
        assert_eq!(accepted.recipe.dish_name, "Bigos");
        assert_eq!(accepted.attributes.calories, "720");
    }

    #[tokio::test]
    async fn test_missing_calories_become_unknown() {
        let outcome = workshop(
            ScriptedGenerator::new(&[RECIPE]),
            ScriptedAuditor::new("Logistics", vec![approve(None)]),
            ScriptedAuditor::new("Nutrition", vec![approve(None)]),
        )
        .run("Stew", "Polish", Guidelines::default())
        .await;

        assert_eq!(outcome.accepted().unwrap().attributes.calories, "?");
    }

    #[tokio::test]
    async fn test_bounded_failure_when_nutrition_always_rejects() {
        let generator = ScriptedGenerator::new(&[RECIPE]);
        let cost = ScriptedAuditor::new("Logistics", vec![approve(None)]);
        let nutrition = ScriptedAuditor::new("Nutrition", vec![reject("Too much fat")]);

        let outcome = workshop(generator.clone(), cost.clone(), nutrition.clone())
            .run("Stew", "Polish", Guidelines::default())
            .await;

        assert!(matches!(outcome.state, State::Failed { .. }));
        assert_eq!(outcome.iterations, 3);
        assert_eq!(
            outcome.draft.feedback_history,
            vec!["Nutrition: Too much fat"; 3]
        );
        assert!(outcome.accepted().is_none());
        assert!(outcome.draft.final_attributes.is_none());
        assert_eq!(cost.calls(), 3);
        assert_eq!(nutrition.calls(), 3);

        // The generator always saw the full history so far
        let seen = generator.seen_feedback.lock().unwrap().clone();
        assert_eq!(seen.iter().map(Vec::len).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_parse_failure_skips_audits() {
        let generator = ScriptedGenerator::new(&["not json", r#"{"description": "nameless"}"#, RECIPE]);
        let cost = ScriptedAuditor::new("Logistics", vec![approve(None)]);
        let nutrition = ScriptedAuditor::new("Nutrition", vec![approve(Some("500"))]);

        let outcome = workshop(generator, cost.clone(), nutrition)
            .run("Stew", "Polish", Guidelines::default())
            .await;

        assert_eq!(outcome.state, State::Accepted { iterations: 3 });
        assert_eq!(
            outcome.draft.feedback_history,
            vec!["JSON format error", "JSON format error"]
        );
        assert_eq!(cost.calls(), 1);
    }

    #[tokio::test]
    async fn test_irregular_recipe_body_reaches_audits() {
        for answer in [
            r#"{"dish_name": "Bigos", "ingredients": ["1 kg cabbage", "200 g kielbasa"], "steps": ["Stew"]}"#,
            r#"{"dish_name": "Bigos", "steps": [{"step": 1, "text": "Stew"}]}"#,
            r#"{"dish_name": "Bigos", "steps": "Stew everything for 2 hours"}"#,
        ] {
            let cost = ScriptedAuditor::new("Logistics", vec![approve(None)]);
            let outcome = workshop(
                ScriptedGenerator::new(&[answer]),
                cost.clone(),
                ScriptedAuditor::new("Nutrition", vec![approve(Some("650"))]),
            )
            .run("Bigos", "Polish", Guidelines::default())
            .await;

            assert_eq!(outcome.state, State::Accepted { iterations: 1 }, "{}", answer);
            assert!(outcome.draft.feedback_history.is_empty());
            assert_eq!(cost.calls(), 1);

            let accepted = outcome.into_accepted().unwrap();
            assert_eq!(accepted.recipe.dish_name, "Bigos");
            assert!(accepted.recipe.steps[0].starts_with("Stew"));
        }
    }

    #[tokio::test]
    async fn test_malformed_audit_rejects_with_distinct_note() {
        let outcome = workshop(
            ScriptedGenerator::new(&[RECIPE]),
            ScriptedAuditor::new(
                "Logistics",
                vec![Verdict::Malformed, reject("Saffron"), approve(None)],
            ),
            ScriptedAuditor::new("Nutrition", vec![approve(Some("610"))]),
        )
        .run("Stew", "Polish", Guidelines::default())
        .await;

        assert!(outcome.is_accepted());
        assert_eq!(
            outcome.draft.feedback_history,
            vec!["Logistics: unreadable response", "Logistics: Saffron"]
        );
    }

    #[tokio::test]
    async fn test_cost_rejection_skips_nutrition() {
        let nutrition = ScriptedAuditor::new("Nutrition", vec![approve(None)]);
        let outcome = workshop(
            ScriptedGenerator::new(&[RECIPE]),
            ScriptedAuditor::new("Logistics", vec![reject("Too pricey")]),
            nutrition.clone(),
        )
        .run("Stew", "Polish", Guidelines::default())
        .await;

        assert!(!outcome.is_accepted());
        assert_eq!(outcome.draft.feedback_history.len(), 3);
        assert_eq!(nutrition.calls(), 0);
    }
}
