//! Recipe search: TheMealDB lookup with a built-in bilingual fallback.
//!
//! The online path searches by main ingredient first, then by meal name.
//! When the API fails or finds nothing, the two recipes the assistant
//! always knew (paneer butter masala, dal tadka) answer matching queries.

use crate::assistant::messages::Language;
use crate::utils::{title_case, truncate_str};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

const MEALDB_BASE: &str = "https://www.themealdb.com/api/json/v1/1";

/// Max ingredients shown in a WhatsApp recipe message
const MAX_INGREDIENTS: usize = 10;
/// Max instruction characters shown
const MAX_INSTRUCTIONS: usize = 500;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct MealListResponse {
    meals: Option<Vec<Meal>>,
}

/// One TheMealDB meal. Ingredient/measure pairs arrive as twenty numbered
/// fields, captured via the flattened map.
#[derive(Debug, Deserialize)]
struct Meal {
    #[serde(rename = "idMeal")]
    id: String,
    #[serde(rename = "strMeal")]
    name: String,
    #[serde(rename = "strCategory", default)]
    category: Option<String>,
    #[serde(rename = "strInstructions", default)]
    instructions: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, Option<String>>,
}

impl Meal {
    /// Collect the numbered ingredient/measure pairs in order
    fn ingredients(&self) -> Vec<String> {
        let mut out = Vec::new();
        for i in 1..=20 {
            let ingredient = self
                .extra
                .get(&format!("strIngredient{i}"))
                .and_then(|v| v.as_deref())
                .unwrap_or("")
                .trim();
            if ingredient.is_empty() {
                continue;
            }
            let measure = self
                .extra
                .get(&format!("strMeasure{i}"))
                .and_then(|v| v.as_deref())
                .unwrap_or("")
                .trim();
            if measure.is_empty() {
                out.push(format!("• {ingredient}"));
            } else {
                out.push(format!("• {measure} {ingredient}"));
            }
        }
        out
    }
}

pub struct RecipeClient {
    http_client: reqwest::Client,
}

impl Default for RecipeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_client: crate::llm::http_utils::create_http_client(),
        }
    }

    /// Search TheMealDB for a recipe and format it for WhatsApp.
    ///
    /// Filters by main ingredient first, falling back to a name search.
    /// Returns `Ok(None)` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or malformed responses.
    pub async fn search(&self, query: &str) -> Result<Option<String>, RecipeError> {
        if let Some(meal) = self.filter_by_ingredient(query).await? {
            return Ok(Some(format_meal(&meal)));
        }
        if let Some(meal) = self.search_by_name(query).await? {
            return Ok(Some(format_meal(&meal)));
        }
        Ok(None)
    }

    async fn filter_by_ingredient(&self, query: &str) -> Result<Option<Meal>, RecipeError> {
        let url = format!("{MEALDB_BASE}/filter.php?i={}", urlencode(query));
        let listing: MealListResponse = self.get_json(&url).await?;

        let Some(first) = listing.meals.and_then(|meals| meals.into_iter().next()) else {
            return Ok(None);
        };

        // filter.php returns stubs; fetch the full record
        let url = format!("{MEALDB_BASE}/lookup.php?i={}", urlencode(&first.id));
        let detail: MealListResponse = self.get_json(&url).await?;
        Ok(detail.meals.and_then(|meals| meals.into_iter().next()))
    }

    async fn search_by_name(&self, query: &str) -> Result<Option<Meal>, RecipeError> {
        let url = format!("{MEALDB_BASE}/search.php?s={}", urlencode(query));
        let listing: MealListResponse = self.get_json(&url).await?;
        Ok(listing.meals.and_then(|meals| meals.into_iter().next()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, RecipeError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| RecipeError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RecipeError::Api(format!(
                "TheMealDB returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RecipeError::Api(e.to_string()))
    }
}

fn urlencode(s: &str) -> String {
    s.replace(' ', "%20")
}

/// Format a TheMealDB meal for WhatsApp
fn format_meal(meal: &Meal) -> String {
    let ingredients = meal
        .ingredients()
        .into_iter()
        .take(MAX_INGREDIENTS)
        .collect::<Vec<_>>()
        .join("\n");
    let instructions = truncate_str(
        meal.instructions.as_deref().unwrap_or("").trim(),
        MAX_INSTRUCTIONS,
    );
    let category = meal.category.as_deref().unwrap_or("");

    format!(
        "🍳 *{name}*\n📂 Category: {category}\n\n📝 *Ingredients:*\n{ingredients}\n\n\
        👨‍🍳 *Instructions:*\n{instructions}...\n\n🔗 More recipes? Just ask for another dish!",
        name = meal.name,
    )
}

/// Extract the dish name from a recipe request
#[must_use]
pub fn extract_query(text: &str, lang: Language) -> String {
    let mut query = text.to_lowercase();
    let stop_words: &[&str] = match lang {
        Language::En => &["recipe", "for", "cook", "make", "find", "food", "dish"],
        Language::Hi => &["रेसिपी", "की", "का", "बनाना", "खाना", "व्यंजन", "बताओ"],
    };
    for word in stop_words {
        query = query.replace(word, " ");
    }
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A recipe the assistant knows without going online
struct BuiltinRecipe {
    keywords: [&'static str; 2],
    name: [&'static str; 2],
    ingredients: [&'static str; 2],
    method: [&'static str; 2],
    time: [&'static str; 2],
}

// Index 0 = Hindi, 1 = English
const BUILTIN_RECIPES: [BuiltinRecipe; 2] = [
    BuiltinRecipe {
        keywords: ["paneer", "पनीर"],
        name: ["पनीर बटर मसाला", "Paneer Butter Masala"],
        ingredients: [
            "• 250g पनीर\n• 2 प्याज\n• 3 टमाटर\n• 1/2 कप क्रीम\n• मसाले",
            "• 250g paneer\n• 2 onions\n• 3 tomatoes\n• 1/2 cup cream\n• Spices",
        ],
        method: [
            "1. प्याज-टमाटर का पेस्ट बनाएं\n2. मसाले भूनें\n3. पेस्ट डालें\n4. क्रीम और पनीर मिलाएं\n5. 5 मिनट पकाएं",
            "1. Make onion-tomato paste\n2. Sauté spices\n3. Add paste\n4. Mix cream and paneer\n5. Cook for 5 mins",
        ],
        time: ["30 मिनट", "30 minutes"],
    },
    BuiltinRecipe {
        keywords: ["dal", "दाल"],
        name: ["दाल तड़का", "Dal Tadka"],
        ingredients: [
            "• 1 कप अरहर दाल\n• 1 प्याज\n• 2 टमाटर\n• तड़का मसाले",
            "• 1 cup toor dal\n• 1 onion\n• 2 tomatoes\n• Tempering spices",
        ],
        method: [
            "1. दाल उबालें\n2. तड़का तैयार करें\n3. प्याज-टमाटर भूनें\n4. दाल मिलाएं\n5. 10 मिनट पकाएं",
            "1. Boil dal\n2. Prepare tempering\n3. Sauté onion-tomato\n4. Mix dal\n5. Cook for 10 mins",
        ],
        time: ["45 मिनट", "45 minutes"],
    },
];

/// Answer a recipe query from the built-in recipes, if it names one
#[must_use]
pub fn builtin_recipe(query: &str, lang: Language) -> Option<String> {
    let lowered = query.to_lowercase();
    let idx = match lang {
        Language::Hi => 0,
        Language::En => 1,
    };

    BUILTIN_RECIPES
        .iter()
        .find(|recipe| recipe.keywords.iter().any(|k| lowered.contains(k)))
        .map(|recipe| {
            format_builtin(
                lang,
                recipe.name[idx],
                recipe.ingredients[idx],
                recipe.method[idx],
                recipe.time[idx],
            )
        })
}

fn format_builtin(lang: Language, dish: &str, ingredients: &str, method: &str, time: &str) -> String {
    match lang {
        Language::Hi => format!(
            "🍳 {dish} बनाने की विधि:\n\n📝 सामग्री:\n{ingredients}\n\n\
            👨‍🍳 विधि:\n{method}\n\n⏱️ समय: {time}"
        ),
        Language::En => format!(
            "🍳 Recipe for {dish}:\n\n📝 Ingredients:\n{ingredients}\n\n\
            👨‍🍳 Method:\n{method}\n\n⏱️ Time: {time}"
        ),
    }
}

/// Prompt shown when a recipe request named no dish
#[must_use]
pub fn query_prompt(lang: Language) -> String {
    match lang {
        Language::Hi => "क्या बनाना चाहते हैं? कोशिश करें: 'पनीर की रेसिपी'".to_string(),
        Language::En => "What would you like to cook? \
            Try: 'Recipe for chicken curry' or 'Recipe for pasta'"
            .to_string(),
    }
}

/// Apology when neither the API nor the built-ins had an answer
#[must_use]
pub fn not_found(query: &str, lang: Language) -> String {
    match lang {
        Language::Hi => format!(
            "माफ़ करें, '{query}' की रेसिपी नहीं मिली। \
            उपलब्ध: पनीर बटर मसाला, दाल तड़का। कोई और डिश आज़माएं!"
        ),
        Language::En => format!(
            "Sorry, couldn't find a recipe for '{}'. \
            Always available: Paneer Butter Masala, Dal Tadka. Or try another dish!",
            title_case(query)
        ),
    }
}
