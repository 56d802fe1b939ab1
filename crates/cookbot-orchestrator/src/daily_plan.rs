//! Daily plan rendering - Markdown written to `<plans_dir>/<YYYY-MM-DD>.md`
//!
//! The plan lists the poll options with their calorie estimates, then the
//! full day built around the star option: breakfast, lunch, dinner.

use chrono::{Local, NaiveDate};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use cookbot_core::fail_open::fail_open;
use cookbot_core::{AcceptedRecipe, CookbotError, MealPlan, Recipe, Result};

/// One poll option with the day planned around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOption {
    pub accepted: AcceptedRecipe,
    pub meals: MealPlan,
}

impl PlannedOption {
    pub fn dish_name(&self) -> &str {
        &self.accepted.recipe.dish_name
    }
}

/// Everything the Markdown plan shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPlan {
    pub date: NaiveDate,
    pub cuisine: String,
    pub region: String,
    pub brief: String,
    pub options: Vec<PlannedOption>,
    /// Index into `options` of the featured lunch
    pub star_index: usize,
}

impl DailyPlan {
    pub fn star(&self) -> Option<&PlannedOption> {
        self.options.get(self.star_index)
    }

    /// Markdown file name for the plan's date
    pub fn file_name(&self) -> String {
        format!("{}.md", self.date.format("%Y-%m-%d"))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "# Daily Plan {} - {}", self.date.format("%Y-%m-%d"), self.cuisine);
        let _ = writeln!(out);
        let _ = writeln!(out, "**Region**: {}", self.region);
        let _ = writeln!(out, "**Brief**: {}", self.brief);
        let _ = writeln!(out);

        let _ = writeln!(out, "## Today's Options");
        let _ = writeln!(out);
        for (i, option) in self.options.iter().enumerate() {
            let marker = if i == self.star_index { " (star)" } else { "" };
            let _ = writeln!(
                out,
                "{}. {} ({} kcal){}",
                i + 1,
                option.dish_name(),
                option.accepted.attributes.calories,
                marker
            );
        }
        let _ = writeln!(out);

        if let Some(star) = self.star() {
            let _ = writeln!(out, "---");
            let _ = writeln!(out);
            render_meal(&mut out, "Breakfast", star.meals.breakfast.as_ref(), None);
            render_meal(
                &mut out,
                "Lunch",
                Some(&star.accepted.recipe),
                Some(&star.accepted.attributes.calories),
            );
            render_meal(&mut out, "Dinner", star.meals.dinner.as_ref(), None);
        }

        out
    }
}

fn render_meal(out: &mut String, title: &str, recipe: Option<&Recipe>, calories: Option<&str>) {
    let Some(recipe) = recipe else {
        let _ = writeln!(out, "## {}\n\n_Nothing planned._\n", title);
        return;
    };

    let _ = writeln!(out, "## {}: {}", title, recipe.dish_name);
    let _ = writeln!(out);

    if !recipe.description.trim().is_empty() {
        let _ = writeln!(out, "{}", recipe.description.trim());
        let _ = writeln!(out);
    }

    let calories = calories.or(recipe.calories.as_deref());
    if let Some(calories) = calories.filter(|c| !c.trim().is_empty()) {
        let _ = writeln!(out, "**Calories**: {}", calories);
    }
    if !recipe.prep_time.trim().is_empty() {
        let _ = writeln!(out, "**Prep time**: {}", recipe.prep_time);
    }

    if !recipe.ingredients.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Ingredients");
        for ingredient in &recipe.ingredients {
            let amount = ingredient.display_amount();
            if amount.is_empty() {
                let _ = writeln!(out, "- {}", ingredient.item);
            } else {
                let _ = writeln!(out, "- {}: {}", ingredient.item, amount);
            }
        }
    }

    if !recipe.steps.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Steps");
        for (i, step) in recipe.steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, step);
        }
    }

    let _ = writeln!(out);
}

/// Writes rendered plans under one directory
#[derive(Debug, Clone)]
pub struct DailyPlanWriter {
    plans_dir: PathBuf,
}

impl DailyPlanWriter {
    pub fn new(plans_dir: impl Into<PathBuf>) -> Self {
        Self {
            plans_dir: plans_dir.into(),
        }
    }

    pub fn plans_dir(&self) -> &Path {
        &self.plans_dir
    }

    /// Today's date in local time
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Write `markdown` for `plan`, replacing any plan for the same day
    #[instrument(skip(self, plan, markdown), fields(date = %plan.date))]
    pub async fn write(&self, plan: &DailyPlan, markdown: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.plans_dir)
            .await
            .map_err(|e| {
                CookbotError::DailyPlan(format!(
                    "Cannot create {}: {}",
                    self.plans_dir.display(),
                    e
                ))
            })?;

        let path = self.plans_dir.join(plan.file_name());
        tokio::fs::write(&path, markdown).await?;
        info!("Daily plan saved to {}", path.display());
        Ok(path)
    }

    /// Like [`write`](Self::write) but a failure is only logged
    pub async fn save(&self, plan: &DailyPlan, markdown: &str) -> Option<PathBuf> {
        fail_open("daily_plan::save", || self.write(plan, markdown)).await
    }
}
