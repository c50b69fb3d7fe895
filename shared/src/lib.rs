// lib.rs - shared core of the meal recipe browser

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod capabilities;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::{CategoriesDocument, MealApi, MealsDocument};

pub use app::App;
pub use capabilities::{Capabilities, Effect};

pub const UNKNOWN_AREA: &str = "Unknown";
pub const FALLBACK_ERROR_MESSAGE: &str = "An unknown error occurred";
pub const MISSING_INSTRUCTIONS_TEXT: &str = "Instructions not available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub measure: String,
}

/// A recipe as served by the remote API. Records from the category/area
/// filter endpoints carry only id, name, and thumbnail; everything else is
/// filled in by a follow-up name search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub thumbnail: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub instructions: Option<String>,
    pub source_url: Option<String>,
    pub youtube_url: Option<String>,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub thumbnail: String,
}

/// The slice of a meal kept on the favorites list. Session-local only;
/// favorites are lost when the core is torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteMeal {
    pub id: String,
    pub name: String,
    pub thumbnail: String,
    pub area: String,
}

impl FavoriteMeal {
    #[must_use]
    pub fn for_meal(meal: &Meal) -> Self {
        Self {
            id: meal.id.clone(),
            name: meal.name.clone(),
            thumbnail: meal.thumbnail.clone(),
            area: meal
                .area
                .clone()
                .unwrap_or_else(|| UNKNOWN_AREA.to_string()),
        }
    }
}

/// Bookkeeping for an in-flight category load: the filter endpoint returns
/// partial records, so each one is re-fetched by name and merged here. The
/// list publishes only once `remaining` hits zero. A single slot keyed by
/// category name; responses carrying any other key are stale and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLoad {
    pub category: String,
    pub remaining: usize,
    pub meals: Vec<Meal>,
}

pub struct Model {
    pub api: MealApi,
    pub meals: Vec<Meal>,
    pub categories: Vec<Category>,
    pub area_meals: Vec<Meal>,
    pub favorites: Vec<FavoriteMeal>,
    pub selected_meal: Option<Meal>,
    pub error: Option<String>,
    pub is_loading: bool,
    pub meal_cache: HashMap<String, Option<Meal>>,
    pub category_cache: HashMap<String, Vec<Meal>>,
    pub pending_category: Option<CategoryLoad>,
}

impl Default for Model {
    fn default() -> Self {
        Self::with_api(MealApi::default())
    }
}

impl Model {
    #[must_use]
    pub fn with_api(api: MealApi) -> Self {
        Self {
            api,
            meals: Vec::new(),
            categories: Vec::new(),
            area_meals: Vec::new(),
            favorites: Vec::new(),
            selected_meal: None,
            error: None,
            is_loading: false,
            meal_cache: HashMap::new(),
            category_cache: HashMap::new(),
            pending_category: None,
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Name-cache lookup keyed by the literal name that was queried. A cached
    /// not-found entry and a never-queried name both come back as `None`.
    #[must_use]
    pub fn cached_meal_by_name(&self, name: &str) -> Option<&Meal> {
        self.meal_cache.get(name).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn is_favorite(&self, meal_id: &str) -> bool {
        self.favorites.iter().any(|f| f.id == meal_id)
    }

    /// Removes the favorite with the meal's id if present, appends one
    /// otherwise. Removing first is what keeps the list free of duplicates.
    pub fn toggle_favorite(&mut self, meal: &Meal) {
        let favorite = FavoriteMeal::for_meal(meal);
        if self.is_favorite(&favorite.id) {
            self.favorites.retain(|f| f.id != favorite.id);
        } else {
            self.favorites.push(favorite);
        }
    }

    pub fn remove_favorite(&mut self, meal_id: &str) {
        self.favorites.retain(|f| f.id != meal_id);
    }

    /// Resolves a meal id against everything the model currently holds:
    /// live lists, the selection, then both caches.
    #[must_use]
    pub fn find_meal(&self, meal_id: &str) -> Option<&Meal> {
        self.meals
            .iter()
            .chain(self.area_meals.iter())
            .chain(self.selected_meal.iter())
            .find(|m| m.id == meal_id)
            .or_else(|| {
                self.meal_cache
                    .values()
                    .filter_map(Option::as_ref)
                    .find(|m| m.id == meal_id)
            })
            .or_else(|| {
                self.category_cache
                    .values()
                    .flatten()
                    .find(|m| m.id == meal_id)
            })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Event {
    AppStarted,
    FetchMeals {
        query: String,
        category: String,
    },
    SearchMeals {
        query: String,
    },
    FetchMealsByArea {
        area: String,
    },
    SelectMeal {
        name: String,
    },
    ToggleFavorite {
        meal_id: String,
    },
    RemoveFavorite {
        meal_id: String,
    },
    ClearMeals,
    DismissError,

    #[serde(skip)]
    MealsLoaded(crux_http::Result<crux_http::Response<MealsDocument>>),
    #[serde(skip)]
    SearchLoaded(crux_http::Result<crux_http::Response<MealsDocument>>),
    #[serde(skip)]
    AreaMealsLoaded(crux_http::Result<crux_http::Response<MealsDocument>>),
    #[serde(skip)]
    CategoriesLoaded(crux_http::Result<crux_http::Response<CategoriesDocument>>),
    #[serde(skip)]
    CategoryFilterLoaded {
        category: String,
        result: crux_http::Result<crux_http::Response<MealsDocument>>,
    },
    #[serde(skip)]
    MealEnriched {
        category: String,
        meal_id: String,
        result: crux_http::Result<crux_http::Response<MealsDocument>>,
    },
    #[serde(skip)]
    MealDetailLoaded {
        name: String,
        result: crux_http::Result<crux_http::Response<MealsDocument>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealListItem {
    pub id: String,
    pub name: String,
    pub thumbnail: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealDetailView {
    pub id: String,
    pub name: String,
    pub thumbnail: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub instructions: String,
    pub source_url: Option<String>,
    pub youtube_url: Option<String>,
    pub ingredient_lines: Vec<String>,
    pub is_favorite: bool,
}

impl MealDetailView {
    #[must_use]
    pub fn for_meal(meal: &Meal, is_favorite: bool) -> Self {
        Self {
            id: meal.id.clone(),
            name: meal.name.clone(),
            thumbnail: meal.thumbnail.clone(),
            category: meal.category.clone(),
            area: meal.area.clone(),
            instructions: meal
                .instructions
                .clone()
                .unwrap_or_else(|| MISSING_INSTRUCTIONS_TEXT.to_string()),
            source_url: meal.source_url.clone(),
            youtube_url: meal.youtube_url.clone(),
            ingredient_lines: meal
                .ingredients
                .iter()
                .map(|i| format!("{}: {}", i.name, i.measure))
                .collect(),
            is_favorite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub meals: Vec<MealListItem>,
    pub categories: Vec<Category>,
    pub area_meals: Vec<MealListItem>,
    pub favorites: Vec<FavoriteMeal>,
    pub selected_meal: Option<MealDetailView>,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub mod app {
    use crux_http::Error as HttpError;
    use tracing::{debug, warn};

    use super::{
        CategoriesDocument, CategoryLoad, Event, FALLBACK_ERROR_MESSAGE, Meal, MealDetailView,
        MealListItem, MealsDocument, Model, ViewModel,
    };
    use crate::capabilities::Capabilities;

    #[derive(Default)]
    pub struct App;

    impl App {
        fn error_message(error: &HttpError) -> String {
            let message = error.to_string();
            if message.is_empty() {
                FALLBACK_ERROR_MESSAGE.to_string()
            } else {
                message
            }
        }

        /// Collapses transport failures, non-success statuses, and missing
        /// bodies into the single message-string failure path.
        fn parse_meals(
            result: crux_http::Result<crux_http::Response<MealsDocument>>,
        ) -> Result<Vec<Meal>, String> {
            match result {
                Ok(mut response) => {
                    if response.status().is_success() {
                        Ok(response
                            .take_body()
                            .map(MealsDocument::into_meals)
                            .unwrap_or_default())
                    } else {
                        Err(format!("request failed with status {}", response.status()))
                    }
                }
                Err(error) => Err(Self::error_message(&error)),
            }
        }

        fn send_meal_query(model: &Model, caps: &Capabilities, query: &str) {
            caps.http
                .get(model.api.search_by_name_url(query))
                .expect_json()
                .send(Event::MealsLoaded);
        }

        fn send_search(model: &Model, caps: &Capabilities, query: &str) {
            caps.http
                .get(model.api.search_by_name_url(query))
                .expect_json()
                .send(Event::SearchLoaded);
        }

        fn send_category_filter(model: &Model, caps: &Capabilities, category: String) {
            let url = model.api.filter_by_category_url(&category);
            caps.http
                .get(url)
                .expect_json()
                .send(move |result| Event::CategoryFilterLoaded {
                    category: category.clone(),
                    result,
                });
        }

        fn send_meal_details(
            model: &Model,
            caps: &Capabilities,
            category: String,
            meal_id: String,
            name: &str,
        ) {
            let url = model.api.search_by_name_url(name);
            caps.http.get(url).expect_json().send(move |result| {
                Event::MealEnriched {
                    category: category.clone(),
                    meal_id: meal_id.clone(),
                    result,
                }
            });
        }

        fn send_area_filter(model: &Model, caps: &Capabilities, area: &str) {
            caps.http
                .get(model.api.filter_by_area_url(area))
                .expect_json()
                .send(Event::AreaMealsLoaded);
        }

        fn send_categories_request(model: &Model, caps: &Capabilities) {
            caps.http
                .get(model.api.categories_url())
                .expect_json()
                .send(Event::CategoriesLoaded);
        }

        fn send_detail_lookup(model: &Model, caps: &Capabilities, name: String) {
            let url = model.api.search_by_name_url(&name);
            caps.http
                .get(url)
                .expect_json()
                .send(move |result| Event::MealDetailLoaded {
                    name: name.clone(),
                    result,
                });
        }

        fn handle_meals_loaded(
            result: crux_http::Result<crux_http::Response<MealsDocument>>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match Self::parse_meals(result) {
                Ok(meals) => {
                    model.meals = meals;
                }
                Err(message) => {
                    model.set_error(message);
                    model.meals = Vec::new();
                }
            }
            model.is_loading = false;
            caps.render.render();
        }

        fn handle_search_loaded(
            result: crux_http::Result<crux_http::Response<MealsDocument>>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match Self::parse_meals(result) {
                Ok(meals) => {
                    model.meals = meals;
                    model.clear_error();
                }
                Err(message) => {
                    model.set_error(message);
                    model.meals = Vec::new();
                }
            }
            caps.render.render();
        }

        fn handle_area_loaded(
            result: crux_http::Result<crux_http::Response<MealsDocument>>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match Self::parse_meals(result) {
                Ok(meals) => {
                    model.area_meals = meals;
                }
                Err(message) => {
                    model.set_error(message);
                    model.area_meals = Vec::new();
                }
            }
            caps.render.render();
        }

        fn handle_categories_loaded(
            result: crux_http::Result<crux_http::Response<CategoriesDocument>>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match result {
                Ok(mut response) if response.status().is_success() => {
                    model.categories = response
                        .take_body()
                        .map(CategoriesDocument::into_categories)
                        .unwrap_or_default();
                }
                Ok(response) => {
                    model.set_error(format!(
                        "request failed with status {}",
                        response.status()
                    ));
                }
                Err(error) => {
                    model.set_error(Self::error_message(&error));
                }
            }
            caps.render.render();
        }

        fn handle_category_filter(
            category: String,
            result: crux_http::Result<crux_http::Response<MealsDocument>>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            let expected = model
                .pending_category
                .as_ref()
                .map(|pending| pending.category.as_str());
            if expected != Some(category.as_str()) {
                debug!(category = %category, "dropping stale category filter response");
                return;
            }

            match Self::parse_meals(result) {
                Ok(meals) if meals.is_empty() => {
                    model.pending_category = None;
                    model.meals = Vec::new();
                    model.category_cache.insert(category, Vec::new());
                    model.is_loading = false;
                    caps.render.render();
                }
                Ok(meals) => {
                    let lookups: Vec<(String, String)> = meals
                        .iter()
                        .map(|meal| (meal.id.clone(), meal.name.clone()))
                        .collect();

                    if let Some(pending) = model.pending_category.as_mut() {
                        pending.remaining = meals.len();
                        pending.meals = meals;
                    }

                    debug!(category = %category, count = lookups.len(), "enriching category meals");
                    for (meal_id, name) in lookups {
                        Self::send_meal_details(model, caps, category.clone(), meal_id, &name);
                    }
                }
                Err(message) => {
                    model.pending_category = None;
                    model.set_error(message);
                    model.meals = Vec::new();
                    model.is_loading = false;
                    caps.render.render();
                }
            }
        }

        fn handle_meal_enriched(
            category: &str,
            meal_id: &str,
            result: crux_http::Result<crux_http::Response<MealsDocument>>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            let finished = {
                let Some(pending) = model.pending_category.as_mut() else {
                    debug!(category = %category, "dropping detail response with no pending load");
                    return;
                };
                if pending.category != category {
                    debug!(category = %category, "dropping stale detail response");
                    return;
                }

                match Self::parse_meals(result) {
                    Ok(full_meals) => {
                        // The search endpoint returns every meal sharing the
                        // name; the one with the matching id wins. No match
                        // keeps the partial record.
                        if let Some(full) = full_meals.into_iter().find(|m| m.id == meal_id) {
                            if let Some(slot) =
                                pending.meals.iter_mut().find(|m| m.id == meal_id)
                            {
                                *slot = full;
                            }
                        }
                    }
                    Err(message) => {
                        warn!(
                            meal_id = %meal_id,
                            error = %message,
                            "meal detail fetch failed, keeping partial record"
                        );
                    }
                }

                pending.remaining = pending.remaining.saturating_sub(1);
                pending.remaining == 0
            };

            if finished {
                if let Some(load) = model.pending_category.take() {
                    model.meals.clone_from(&load.meals);
                    model.category_cache.insert(load.category, load.meals);
                    model.is_loading = false;
                    caps.render.render();
                }
            }
        }

        fn handle_detail_loaded(
            name: String,
            result: crux_http::Result<crux_http::Response<MealsDocument>>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            match Self::parse_meals(result) {
                Ok(meals) => {
                    let meal = meals.into_iter().find(|m| m.name == name);
                    model.meal_cache.insert(name, meal.clone());
                    model.selected_meal = meal;
                }
                Err(message) => {
                    // Detail lookups fail silently; the error slot is for
                    // the list fetches.
                    warn!(name = %name, error = %message, "meal lookup failed");
                    model.selected_meal = None;
                }
            }
            caps.render.render();
        }

        fn list_item(model: &Model, meal: &Meal) -> MealListItem {
            MealListItem {
                id: meal.id.clone(),
                name: meal.name.clone(),
                thumbnail: meal.thumbnail.clone(),
                category: meal.category.clone(),
                area: meal.area.clone(),
                is_favorite: model.is_favorite(&meal.id),
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            match event {
                Event::AppStarted => {
                    debug!("app started");
                    self.update(
                        Event::FetchMeals {
                            query: String::new(),
                            category: String::new(),
                        },
                        model,
                        caps,
                    );
                    Self::send_categories_request(model, caps);
                }

                Event::FetchMeals { query, category } => {
                    model.is_loading = true;
                    // Supersede any in-flight category load; its late
                    // responses will no longer match and get dropped.
                    model.pending_category = None;

                    if category.is_empty() {
                        Self::send_meal_query(model, caps, &query);
                    } else if let Some(cached) = model.category_cache.get(&category) {
                        debug!(category = %category, "category cache hit");
                        model.meals = cached.clone();
                        model.is_loading = false;
                    } else {
                        model.pending_category = Some(CategoryLoad {
                            category: category.clone(),
                            remaining: 0,
                            meals: Vec::new(),
                        });
                        Self::send_category_filter(model, caps, category);
                    }
                    caps.render.render();
                }

                Event::SearchMeals { query } => {
                    model.pending_category = None;
                    if query.is_empty() {
                        model.meals = Vec::new();
                        model.clear_error();
                    } else {
                        Self::send_search(model, caps, &query);
                    }
                    caps.render.render();
                }

                Event::FetchMealsByArea { area } => {
                    Self::send_area_filter(model, caps, &area);
                    caps.render.render();
                }

                Event::SelectMeal { name } => {
                    let cached = model.cached_meal_by_name(&name).cloned();
                    if let Some(meal) = cached {
                        debug!(name = %name, "meal cache hit");
                        model.selected_meal = Some(meal);
                    } else {
                        model.selected_meal = None;
                        Self::send_detail_lookup(model, caps, name);
                    }
                    caps.render.render();
                }

                Event::ToggleFavorite { meal_id } => {
                    if let Some(meal) = model.find_meal(&meal_id).cloned() {
                        debug!(meal_id = %meal_id, "toggling favorite");
                        model.toggle_favorite(&meal);
                    } else {
                        warn!(meal_id = %meal_id, "toggle favorite for unknown meal");
                    }
                    caps.render.render();
                }

                Event::RemoveFavorite { meal_id } => {
                    model.remove_favorite(&meal_id);
                    caps.render.render();
                }

                Event::ClearMeals => {
                    model.meals = Vec::new();
                    caps.render.render();
                }

                Event::DismissError => {
                    model.clear_error();
                    caps.render.render();
                }

                Event::MealsLoaded(result) => {
                    Self::handle_meals_loaded(result, model, caps);
                }

                Event::SearchLoaded(result) => {
                    Self::handle_search_loaded(result, model, caps);
                }

                Event::AreaMealsLoaded(result) => {
                    Self::handle_area_loaded(result, model, caps);
                }

                Event::CategoriesLoaded(result) => {
                    Self::handle_categories_loaded(result, model, caps);
                }

                Event::CategoryFilterLoaded { category, result } => {
                    Self::handle_category_filter(category, result, model, caps);
                }

                Event::MealEnriched {
                    category,
                    meal_id,
                    result,
                } => {
                    Self::handle_meal_enriched(&category, &meal_id, result, model, caps);
                }

                Event::MealDetailLoaded { name, result } => {
                    Self::handle_detail_loaded(name, result, model, caps);
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            ViewModel {
                meals: model
                    .meals
                    .iter()
                    .map(|meal| Self::list_item(model, meal))
                    .collect(),
                categories: model.categories.clone(),
                area_meals: model
                    .area_meals
                    .iter()
                    .map(|meal| Self::list_item(model, meal))
                    .collect(),
                favorites: model.favorites.clone(),
                selected_meal: model
                    .selected_meal
                    .as_ref()
                    .map(|meal| MealDetailView::for_meal(meal, model.is_favorite(&meal.id))),
                is_loading: model.is_loading,
                error: model.error.clone(),
            }
        }
    }
}
