use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use url::Url;

use crate::{Category, Ingredient, Meal};

pub const DEFAULT_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1/";
pub const MAX_INGREDIENT_SLOTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Endpoint catalogue for the remote recipe service. Holds a validated base
/// URL and builds the four request URLs the app uses; it owns no transport —
/// requests go out through the HTTP capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealApi {
    base: String,
}

impl MealApi {
    pub fn new(base: impl Into<String>) -> Result<Self, ApiError> {
        let mut base = base.into();

        let parsed = Url::parse(&base).map_err(|e| ApiError::InvalidBaseUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ApiError::InvalidBaseUrl {
                url: base,
                reason: format!("unsupported scheme '{scheme}'"),
            });
        }

        if parsed.host_str().is_none() {
            return Err(ApiError::InvalidBaseUrl {
                url: base,
                reason: "missing host".into(),
            });
        }

        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self { base })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn search_by_name_url(&self, query: &str) -> String {
        format!("{}search.php?s={}", self.base, encode(query))
    }

    #[must_use]
    pub fn filter_by_category_url(&self, category: &str) -> String {
        format!("{}filter.php?c={}", self.base, encode(category))
    }

    #[must_use]
    pub fn filter_by_area_url(&self, area: &str) -> String {
        format!("{}filter.php?a={}", self.base, encode(area))
    }

    #[must_use]
    pub fn categories_url(&self) -> String {
        format!("{}categories.php", self.base)
    }
}

impl Default for MealApi {
    fn default() -> Self {
        // DEFAULT_BASE_URL is known-valid; skip re-validation.
        Self {
            base: DEFAULT_BASE_URL.to_string(),
        }
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Response body of `search.php` and both `filter.php` variants. The service
/// returns `{"meals": null}` for no results, so the array is nullable.
#[derive(Debug, Clone, Deserialize)]
pub struct MealsDocument {
    #[serde(default)]
    pub meals: Option<Vec<MealRecord>>,
}

impl MealsDocument {
    #[must_use]
    pub fn into_meals(self) -> Vec<Meal> {
        self.meals
            .unwrap_or_default()
            .into_iter()
            .map(Meal::from)
            .collect()
    }
}

/// Response body of `categories.php`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesDocument {
    #[serde(default)]
    pub categories: Option<Vec<CategoryRecord>>,
}

impl CategoriesDocument {
    #[must_use]
    pub fn into_categories(self) -> Vec<Category> {
        self.categories
            .unwrap_or_default()
            .into_iter()
            .map(Category::from)
            .collect()
    }
}

/// One meal as the service sends it. `filter.php` returns partial records
/// (id, name, thumbnail only); `search.php` returns the full shape including
/// twenty numbered ingredient/measure slots, which land in `extra` and are
/// paired up during conversion. Absent, null, and blank fields all collapse
/// to `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct MealRecord {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strCategory", default, deserialize_with = "blank_as_none")]
    pub category: Option<String>,
    #[serde(rename = "strArea", default, deserialize_with = "blank_as_none")]
    pub area: Option<String>,
    #[serde(
        rename = "strInstructions",
        default,
        deserialize_with = "blank_as_none"
    )]
    pub instructions: Option<String>,
    #[serde(rename = "strSource", default, deserialize_with = "blank_as_none")]
    pub source_url: Option<String>,
    #[serde(rename = "strYoutube", default, deserialize_with = "blank_as_none")]
    pub youtube_url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl MealRecord {
    fn slot(&self, prefix: &str, index: usize) -> Option<String> {
        self.extra
            .get(&format!("{prefix}{index}"))
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    fn ingredients(&self) -> Vec<Ingredient> {
        let mut ingredients = Vec::new();
        for i in 1..=MAX_INGREDIENT_SLOTS {
            if let Some(name) = self.slot("strIngredient", i) {
                ingredients.push(Ingredient {
                    name,
                    measure: self.slot("strMeasure", i).unwrap_or_default(),
                });
            }
        }
        ingredients
    }
}

impl From<MealRecord> for Meal {
    fn from(record: MealRecord) -> Self {
        let ingredients = record.ingredients();
        Meal {
            id: record.id,
            name: record.name,
            thumbnail: record.thumbnail.unwrap_or_default(),
            category: record.category,
            area: record.area,
            instructions: record.instructions,
            source_url: record.source_url,
            youtube_url: record.youtube_url,
            ingredients,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "strCategory")]
    pub name: String,
    #[serde(rename = "strCategoryThumb", default)]
    pub thumbnail: Option<String>,
}

impl From<CategoryRecord> for Category {
    fn from(record: CategoryRecord) -> Self {
        Category {
            name: record.name,
            thumbnail: record.thumbnail.unwrap_or_default(),
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
