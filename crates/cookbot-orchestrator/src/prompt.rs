//! Prompt builders for the agent roles
//!
//! Every role gets a fixed system prompt whose first sentence names the role
//! (it doubles as the gateway's log label) and a user prompt built from the
//! run's context.

use cookbot_core::{CuisineCatalog, Recipe};

use crate::workshop::Draft;

pub const CHEF_SYSTEM: &str = r#"You are the Head Chef. You write complete, creative recipes from a starting idea and the day's guidelines.

Rules:
1. Completeness: the recipe needs a name, a SUBSTANTIAL description (including one sentence telling a layperson what the dish is and where it comes from), an ingredient list, and steps.
2. Creativity: add a twist.
3. Realism: ingredients must be available in an ordinary supermarket.
4. Strict JSON.

OUTPUT FORMAT (JSON):
{
  "dish_name": "<dish name>",
  "description": "<description + cultural note>",
  "prep_time": "<estimated preparation time>",
  "ingredients": [{"item": "<ingredient>", "amount": "<amount>", "unit": "<unit>"}],
  "steps": ["<step 1>", "<step 2>"]
}"#;

pub const STRATEGIST_SYSTEM: &str = r#"You are the Search Strategist. You write short, precise web search queries that find inspiring, currently popular recipes.

Rules:
1. At most 3 queries.
2. Use whichever language gives better results.
3. Queries must fit the brief and the cuisine of the day.

OUTPUT FORMAT (JSON):
{"queries": ["<query 1>", "<query 2>"]}"#;

pub const TREND_ANALYST_SYSTEM: &str = r#"You are the Trend Analyst. You read search results and history and pick the 3-5 most promising dish ideas.

Rules:
1. Filter out noise: ads, restaurant menus, landing pages without concrete recipes.
2. Look for trends: interesting flavor pairings, unusual ingredients, dishes that are popular right now.
3. Be brief: each idea is a name and a short, intriguing description.

OUTPUT FORMAT (JSON):
{"ideas": [{"name": "<dish name>", "description": "<description>"}]}"#;

pub const MEAL_PLANNER_SYSTEM: &str = r#"You are the Meal Planner. You build a complementary plan for the whole day around a given lunch, the star of the day.

Rules:
1. Write full recipes: for breakfast and dinner give the name, description, ingredients with units, steps, and an estimated calorie count.
2. Do not repeat ingredients: breakfast and dinner should avoid the lunch's main ingredients.
3. Keep the theme: breakfast and dinner may echo the lunch's style but need not share its cuisine.
4. Balance the day: a heavy lunch calls for a light breakfast and dinner, and the other way round.

OUTPUT FORMAT (JSON):
{
  "breakfast": {"dish_name": "...", "description": "...", "prep_time": "...", "calories": "...", "ingredients": [{"item": "...", "amount": "...", "unit": "..."}], "steps": ["..."]},
  "dinner": {"dish_name": "...", "description": "...", "prep_time": "...", "calories": "...", "ingredients": [{"item": "...", "amount": "...", "unit": "..."}], "steps": ["..."]}
}"#;

/// System prompt of the deep analyst; lists the catalog's cuisines
pub fn analyst_system(catalog: &CuisineCatalog) -> String {
    let cuisines: Vec<&str> = catalog.cuisines().collect();

    let mut prompt = String::new();
    prompt.push_str(
        "You are the Lead Analyst. You study the cooking history and the user's preferences, draw conclusions, and set today's direction.\n\n",
    );
    prompt.push_str("KEY RULES:\n");
    prompt.push_str("1. The user's request is the PRIORITY source. A concrete wish (\"I want kebab\", \"fancy some pizza\") outweighs everything else.\n");
    prompt.push_str("2. Map the user's wish to the EXACT name of a cuisine from the list below.\n");
    prompt.push_str("3. Mapping examples:\n");
    prompt.push_str("   - \"kebab\" -> \"Turkish (Kebab/Meze)\"\n");
    prompt.push_str("   - \"pizza\" or \"pasta\" -> \"Italian (Classic)\"\n");
    prompt.push_str("   - \"sushi\" or \"ramen\" -> \"Japanese (Ramen Shop)\"\n");
    prompt.push_str("   - \"burrito\" or \"tacos\" -> \"Mexican (Cantina)\"\n");
    prompt.push_str("   - \"pierogi\" -> \"Polish (Old Polish)\"\n\n");
    prompt.push_str("AVAILABLE CUISINES:\n");
    prompt.push_str(&cuisines.join(", "));
    prompt.push_str("\n\nOUTPUT FORMAT (JSON):\n");
    prompt.push_str("{\n");
    prompt.push_str("  \"daily_brief\": \"<short brief for today, e.g. cheap and quick, vegetarian, party food>\",\n");
    prompt.push_str("  \"suggested_cuisine\": \"<EXACT cuisine name from the list above>\",\n");
    prompt.push_str("  \"new_learning\": \"<a new, interesting observation about the user's preferences>\"\n");
    prompt.push_str("}");
    prompt
}

/// Everything the analyst reads about the past
pub struct AnalystContext<'a> {
    pub request: Option<&'a str>,
    pub insights: &'a [String],
    pub liked: &'a [String],
    pub recent_cuisines: &'a [String],
    pub recent_regions: &'a [String],
}

fn list_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

pub fn analyst_user(context: &AnalystContext<'_>) -> String {
    let request = context
        .request
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("No new messages.");

    let mut prompt = String::new();
    prompt.push_str("**Latest request (PRIORITY):**\n");
    prompt.push_str(request);
    prompt.push_str("\n\n**Current insights:**\n");
    if context.insights.is_empty() {
        prompt.push_str("None.\n");
    } else {
        for insight in context.insights {
            prompt.push_str(&format!("- {}\n", insight));
        }
    }
    prompt.push_str("\n**History (latest entries):**\n");
    prompt.push_str(&format!("- Recently liked dishes: {}\n", list_or(context.liked, "none")));
    prompt.push_str(&format!(
        "- Recently proposed cuisines: {}\n",
        list_or(context.recent_cuisines, "none")
    ));
    prompt.push_str(&format!(
        "- Recently proposed regions: {}\n\n",
        list_or(context.recent_regions, "none")
    ));
    prompt.push_str("Analyze and return JSON. If the request states a concrete wish, treat it as the overriding guideline for 'suggested_cuisine' and 'daily_brief'.");
    prompt
}

pub fn strategist_user(cuisine: &str, brief: &str) -> String {
    format!(
        "**Cuisine:** {}\n**Brief:** {}\n\nWrite the queries and return JSON.",
        cuisine, brief
    )
}

pub fn trend_analyst_user(
    cuisine: &str,
    search_data: &str,
    liked: &[String],
    recent_ideas: &[String],
) -> String {
    let data = if search_data.trim().is_empty() {
        "No search data available."
    } else {
        search_data
    };

    let mut prompt = String::new();
    prompt.push_str(&format!("**Topic:** {} cuisine\n\n", cuisine));
    prompt.push_str("**Search results:**\n");
    prompt.push_str(data);
    prompt.push_str("\n\n**History and insights:**\n");
    prompt.push_str(&format!("- Recently liked dishes: {}\n", list_or(liked, "none")));
    prompt.push_str(&format!(
        "- Recently proposed dishes (avoid if possible): {}\n\n",
        list_or(recent_ideas, "none")
    ));
    prompt.push_str("Analyze all of it and propose 3 to 5 unique, inspiring dish ideas. Return JSON.");
    prompt
}

pub fn chef_user(draft: &Draft) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("**Idea:** {}\n", draft.idea));
    prompt.push_str(&format!("**Cuisine:** {}\n", draft.category));
    prompt.push_str(&format!("**Guidelines:**\n{}\n", draft.guidelines.to_prompt_text()));
    prompt.push_str("**Feedback to address:**\n");
    if draft.feedback_history.is_empty() {
        prompt.push_str("None.\n");
    } else {
        for (i, note) in draft.feedback_history.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, note));
        }
    }
    prompt.push_str("\nCreate or improve the recipe following the information above. Address the feedback if there is any.");
    prompt
}

pub fn meal_planner_user(lunch: &Recipe) -> String {
    let ingredients: Vec<String> = lunch
        .ingredients
        .iter()
        .map(|i| i.item.clone())
        .filter(|i| !i.is_empty())
        .collect();

    format!(
        "Today's lunch:\n- Name: {}\n- Description: {}\n- Ingredients: {}\n\nPropose a breakfast and a dinner that go with it. Return full recipes as JSON.",
        lunch.dish_name,
        lunch.description,
        list_or(&ingredients, "not listed")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbot_core::{Guidelines, Ingredient};

    #[test]
    fn test_analyst_system_lists_catalog() {
        let prompt = analyst_system(&CuisineCatalog::builtin());
        assert!(prompt.starts_with("You are the Lead Analyst."));
        assert!(prompt.contains("Peruvian"));
        assert!(prompt.contains("\"suggested_cuisine\""));
    }

    #[test]
    fn test_analyst_user_defaults() {
        let prompt = analyst_user(&AnalystContext {
            request: Some("   "),
            insights: &[],
            liked: &[],
            recent_cuisines: &[],
            recent_regions: &[],
        });
        assert!(prompt.contains("No new messages."));
        assert!(prompt.contains("None."));
    }

    #[test]
    fn test_chef_user_numbers_feedback() {
        let mut draft = Draft::new("Dumplings", "Polish (Old Polish)", Guidelines::new("cheap", vec![]));
        draft.feedback_history.push("Logistics: too pricey".to_string());
        draft.feedback_history.push("JSON format error".to_string());

        let prompt = chef_user(&draft);
        assert!(prompt.contains("**Idea:** Dumplings"));
        assert!(prompt.contains("1. Logistics: too pricey\n2. JSON format error"));
    }

    #[test]
    fn test_trend_and_planner_prompts() {
        let prompt = trend_analyst_user("Thai", "", &[], &["Pad Thai".to_string()]);
        assert!(prompt.contains("No search data available."));
        assert!(prompt.contains("avoid if possible): Pad Thai"));

        let mut lunch = Recipe::named("Green curry");
        lunch.ingredients = vec![Ingredient::new("Coconut milk", "400", "ml")];
        assert!(meal_planner_user(&lunch).contains("Ingredients: Coconut milk"));
    }
}
