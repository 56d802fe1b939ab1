//! Pipeline coordinator - one daily run from analysis to saved plan
//!
//! Phases:
//! 1. Close the poll left over from the previous run
//! 2. Deep analysis of the request and history
//! 3. Cuisine choice (diversity engine)
//! 4. Research: search queries, then idea extraction
//! 5. Workshop per idea until enough recipes are accepted
//! 6. Meal plans, star pick, Markdown plan
//! 7. Memory update
//!
//! Session memory is loaded once and owned by the run; nothing else touches
//! it until it is saved at the end.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use cookbot_agent::{search_all, Gateway, SearchProvider};
use cookbot_core::fail_open::fail_open_with_retries;
use cookbot_core::{AcceptedRecipe, CookbotConfig, CookbotError, Guidelines, Result};
use cookbot_memory::{diversity, MemoryStore, PollRecord, SessionMemory};
use cookbot_validation::ModelAuditor;

use crate::daily_plan::{DailyPlan, DailyPlanWriter, PlannedOption};
use crate::prompt::AnalystContext;
use crate::roles::{Analysis, Chef, DeepAnalyst, MealPlanner, SearchStrategist, TrendAnalyst};
use crate::state_machine::WorkshopMachine;
use crate::workshop::Workshop;

/// History entries shown to the deep analyst
const ANALYST_HISTORY: usize = 5;

/// Liked dishes shown to the trend analyst
const LIKED_CONTEXT: usize = 10;

/// Attempts for the final memory flush
const MEMORY_SAVE_ATTEMPTS: usize = 3;
const MEMORY_SAVE_BACKOFF: Duration = Duration::from_millis(200);

pub const NO_IDEAS: &str = "no ideas today";
pub const NONE_ACCEPTED: &str = "no idea passed the workshop";

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    DailyPlan {
        plan: DailyPlan,
        /// New learning the analyst recorded this run
        insight: Option<String>,
        markdown: String,
        /// Where the plan was written; `None` if writing failed
        path: Option<PathBuf>,
        poll: PollRecord,
    },
    NothingToOffer {
        cuisine: String,
        reason: String,
    },
}

impl RunOutcome {
    pub fn cuisine(&self) -> &str {
        match self {
            RunOutcome::DailyPlan { plan, .. } => &plan.cuisine,
            RunOutcome::NothingToOffer { cuisine, .. } => cuisine,
        }
    }

    pub fn markdown(&self) -> Option<&str> {
        match self {
            RunOutcome::DailyPlan { markdown, .. } => Some(markdown),
            RunOutcome::NothingToOffer { .. } => None,
        }
    }
}

/// Daily run coordinator
pub struct Pipeline {
    config: CookbotConfig,
    gateway: Arc<Gateway>,
    search: Arc<dyn SearchProvider>,
    store: MemoryStore,
    writer: DailyPlanWriter,
    workshop: Workshop,
    analyst: DeepAnalyst,
    strategist: SearchStrategist,
    trend_analyst: TrendAnalyst,
    planner: MealPlanner,
    seed: Option<u64>,
    date: Option<NaiveDate>,
}

impl Pipeline {
    /// Wire every role to the shared gateway
    pub fn new(config: CookbotConfig, gateway: Arc<Gateway>, search: Arc<dyn SearchProvider>) -> Self {
        let workshop = Workshop::new(
            WorkshopMachine::new(config.workshop.max_iterations),
            Arc::new(Chef::new(gateway.clone())),
            Arc::new(ModelAuditor::logistics(gateway.clone())),
            Arc::new(ModelAuditor::nutrition(gateway.clone())),
        );

        Self {
            store: MemoryStore::new(config.memory_dir.clone()).with_limits(config.memory.clone()),
            writer: DailyPlanWriter::new(config.plans_dir.clone()),
            analyst: DeepAnalyst::new(gateway.clone()),
            strategist: SearchStrategist::new(gateway.clone(), config.search.max_queries),
            trend_analyst: TrendAnalyst::new(gateway.clone()),
            planner: MealPlanner::new(gateway.clone()),
            workshop,
            config,
            gateway,
            search,
            seed: None,
            date: None,
        }
    }

    /// Make cuisine and star draws reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Date the plan instead of today
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_workshop(mut self, workshop: Workshop) -> Self {
        self.workshop = workshop;
        self
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn config(&self) -> &CookbotConfig {
        &self.config
    }

    /// Run one daily pipeline
    ///
    /// Fails only when no model credential is configured. Everything else
    /// degrades: unusable answers fall back to defaults and a run without
    /// accepted recipes ends in [`RunOutcome::NothingToOffer`].
    #[instrument(skip(self, request))]
    pub async fn run(&self, request: Option<&str>) -> Result<RunOutcome> {
        if !self.gateway.has_credentials() {
            return Err(CookbotError::NoCredentials(
                self.config.model.api_key_env.clone(),
            ));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut memory = self.store.load();

        if let Some(poll) = memory.take_poll() {
            info!(
                "Closing poll {} without a recorded vote ({} options)",
                poll.message_id,
                poll.options.len()
            );
        }

        info!("--- Phase 1: Analysis ---");
        let analysis = self.analyze(request, &memory).await;
        if let Some(insight) = &analysis.new_learning {
            info!("New insight: {}", insight);
            memory.record_insight(insight.clone());
        }

        let cuisine = diversity::choose_with_rng(
            analysis.suggested_cuisine.as_deref(),
            &memory.last_cuisines,
            &memory.last_regions,
            &self.config.catalog,
            &mut rng,
        );
        info!("Today's cuisine: {}", cuisine);

        let ideas = self.research(&cuisine, &analysis.daily_brief, &memory).await;
        if ideas.is_empty() {
            warn!("No ideas for {}", cuisine);
            self.save_memory(&memory).await;
            return Ok(RunOutcome::NothingToOffer {
                cuisine,
                reason: NO_IDEAS.to_string(),
            });
        }

        info!("--- Phase 2: Workshop ---");
        let guidelines = Guidelines::new(
            analysis.daily_brief.clone(),
            memory.recent_insights().to_vec(),
        );
        let accepted = self.workshop_phase(&ideas, &cuisine, &guidelines).await;
        if accepted.is_empty() {
            warn!("None of {} idea(s) was accepted", ideas.len());
            self.save_memory(&memory).await;
            return Ok(RunOutcome::NothingToOffer {
                cuisine,
                reason: NONE_ACCEPTED.to_string(),
            });
        }

        info!("--- Phase 3: Daily plan ---");
        let mut options = Vec::with_capacity(accepted.len());
        for accepted in accepted {
            let meals = self.planner.plan(&accepted.recipe).await;
            options.push(PlannedOption { accepted, meals });
        }
        let star_index = rng.random_range(0..options.len());

        let region = self.config.catalog.region_of(&cuisine).to_string();
        let plan = DailyPlan {
            date: self.date.unwrap_or_else(DailyPlanWriter::today),
            cuisine: cuisine.clone(),
            region: region.clone(),
            brief: analysis.daily_brief.clone(),
            options,
            star_index,
        };
        if let Some(star) = plan.star() {
            info!("Star of the day: {}", star.dish_name());
        }

        let markdown = plan.render();
        let path = self.writer.save(&plan, &markdown).await;

        let poll = PollRecord {
            message_id: Uuid::new_v4().to_string(),
            options: plan
                .options
                .iter()
                .map(|o| o.dish_name().to_string())
                .collect(),
        };
        let accepted_ideas: Vec<String> = plan
            .options
            .iter()
            .map(|o| o.accepted.idea.clone())
            .collect();

        memory.record_region(region);
        memory.record_cuisine(cuisine);
        memory.record_trends(&accepted_ideas);
        memory.record_poll(poll.clone());
        self.save_memory(&memory).await;

        Ok(RunOutcome::DailyPlan {
            plan,
            insight: analysis.new_learning,
            markdown,
            path,
            poll,
        })
    }

    async fn analyze(&self, request: Option<&str>, memory: &SessionMemory) -> Analysis {
        let shown_cuisines = memory.last_cuisines.len().min(ANALYST_HISTORY);
        let context = AnalystContext {
            request,
            insights: memory.recent_insights(),
            liked: memory.recent_liked(ANALYST_HISTORY),
            recent_cuisines: &memory.last_cuisines[..shown_cuisines],
            recent_regions: &memory.last_regions,
        };
        self.analyst.analyze(&context, &self.config.catalog).await
    }

    async fn research(&self, cuisine: &str, brief: &str, memory: &SessionMemory) -> Vec<String> {
        let search_data = if self.search.is_configured() {
            let queries = self.strategist.queries(cuisine, brief).await;
            if queries.is_empty() {
                String::new()
            } else {
                info!("Searching: {}", queries.join(", "));
                search_all(
                    self.search.as_ref(),
                    &queries,
                    self.config.search.results_per_query,
                )
                .await
            }
        } else {
            info!("Search not configured, working from history only");
            String::new()
        };

        self.trend_analyst
            .ideas(
                cuisine,
                &search_data,
                memory.recent_liked(LIKED_CONTEXT),
                &memory.last_trends,
            )
            .await
    }

    async fn workshop_phase(
        &self,
        ideas: &[String],
        cuisine: &str,
        guidelines: &Guidelines,
    ) -> Vec<AcceptedRecipe> {
        let target = self.config.workshop.target_options;
        let mut accepted = Vec::new();

        for idea in ideas {
            if accepted.len() >= target {
                info!("Collected {} accepted recipes", target);
                break;
            }
            if let Some(recipe) = self
                .workshop
                .run(idea, cuisine, guidelines.clone())
                .await
                .into_accepted()
            {
                accepted.push(recipe);
            }
        }

        accepted
    }

    async fn save_memory(&self, memory: &SessionMemory) {
        let store = &self.store;
        fail_open_with_retries(
            "memory::save",
            MEMORY_SAVE_ATTEMPTS,
            MEMORY_SAVE_BACKOFF,
            move || async move { store.save(memory) },
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbot_agent::{CredentialPool, GatewayPolicy, GoogleSearch, MockBackend};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_run_requires_credentials() {
        let dir = tempdir().unwrap();
        let config = CookbotConfig {
            memory_dir: dir.path().join("memory"),
            plans_dir: dir.path().join("plans"),
            ..CookbotConfig::default()
        };
        let gateway = Arc::new(Gateway::new(
            Arc::new(MockBackend::replying("{}")),
            CredentialPool::new(Vec::<String>::new()),
            GatewayPolicy::default(),
        ));
        let search = Arc::new(GoogleSearch::new(None, None));

        let err = Pipeline::new(config, gateway, search)
            .run(None)
            .await
            .unwrap_err();
        assert!(matches!(err, CookbotError::NoCredentials(ref env) if env == "GROQ_API_KEY"));
        assert!(!dir.path().join("memory").exists());
    }
}
