use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use shared::{App, Effect, Event, Model};

fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn json_response(body: &serde_json::Value) -> HttpResult {
    HttpResult::Ok(
        HttpResponse::ok()
            .body(serde_json::to_vec(body).unwrap())
            .build(),
    )
}

fn full_meal_body(id: &str, name: &str, area: &str) -> serde_json::Value {
    serde_json::json!({
        "meals": [{
            "idMeal": id,
            "strMeal": name,
            "strMealThumb": format!("https://img.test/{id}.jpg"),
            "strCategory": "Dessert",
            "strArea": area,
            "strInstructions": "Bake until golden.",
            "strIngredient1": "Flour",
            "strMeasure1": "200g"
        }]
    })
}

#[test]
fn category_fetch_enriches_every_stub_and_caches_the_result() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::FetchMeals {
            query: String::new(),
            category: "Dessert".into(),
        },
        &mut model,
    );
    assert!(model.is_loading);

    // 1. One filter request goes out
    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    assert!(requests[0].operation.url.ends_with("filter.php?c=Dessert"));

    let names = ["Apple Frangipan Tart", "Bakewell Tart", "Banana Pancakes"];
    let stubs: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::json!({
                "idMeal": (i + 1).to_string(),
                "strMeal": name,
                "strMealThumb": format!("https://img.test/{}.jpg", i + 1)
            })
        })
        .collect();

    let update = app
        .resolve(
            &mut requests[0],
            json_response(&serde_json::json!({ "meals": stubs })),
        )
        .expect("filter response resolves");

    // 2. The filter response fans out one detail lookup per stub
    let mut detail_requests = Vec::new();
    for event in update.events {
        let followup = app.update(event, &mut model);
        detail_requests.extend(http_requests(followup.effects));
    }
    assert_eq!(detail_requests.len(), 3);

    // Nothing publishes until the whole batch lands
    assert!(model.meals.is_empty());
    assert!(model.is_loading);

    // 3. Echo each meal back with full fields
    for (i, request) in detail_requests.iter_mut().enumerate() {
        assert!(request.operation.url.contains("search.php?s="));

        let id = (i + 1).to_string();
        let update = app
            .resolve(request, json_response(&full_meal_body(&id, names[i], "British")))
            .expect("detail response resolves");
        for event in update.events {
            app.update(event, &mut model);
        }
    }

    assert!(!model.is_loading);
    assert_eq!(model.meals.len(), 3);
    assert!(model
        .meals
        .iter()
        .all(|m| m.area.as_deref() == Some("British") && !m.ingredients.is_empty()));
    assert_eq!(model.category_cache.get("Dessert").map(Vec::len), Some(3));

    // 4. Refetching the category serves the cache without any network effect
    let update = app.update(
        Event::FetchMeals {
            query: String::new(),
            category: "Dessert".into(),
        },
        &mut model,
    );
    assert!(http_requests(update.effects).is_empty());
    assert!(!model.is_loading);
    assert_eq!(model.meals.len(), 3);
}

#[test]
fn failed_detail_fetch_falls_back_to_the_partial_record() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::FetchMeals {
            query: String::new(),
            category: "Seafood".into(),
        },
        &mut model,
    );
    let mut requests = http_requests(update.effects);

    let update = app
        .resolve(
            &mut requests[0],
            json_response(&serde_json::json!({
                "meals": [
                    {"idMeal": "10", "strMeal": "Kedgeree", "strMealThumb": "https://img.test/10.jpg"},
                    {"idMeal": "11", "strMeal": "Fish Pie", "strMealThumb": "https://img.test/11.jpg"}
                ]
            })),
        )
        .expect("filter response resolves");

    let mut detail_requests = Vec::new();
    for event in update.events {
        let followup = app.update(event, &mut model);
        detail_requests.extend(http_requests(followup.effects));
    }
    assert_eq!(detail_requests.len(), 2);

    // First lookup comes back mangled; the partial record must survive
    let update = app
        .resolve(
            &mut detail_requests[0],
            HttpResult::Ok(HttpResponse::ok().body(b"definitely not json".to_vec()).build()),
        )
        .expect("broken detail response resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    let update = app
        .resolve(
            &mut detail_requests[1],
            json_response(&full_meal_body("11", "Fish Pie", "British")),
        )
        .expect("detail response resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(!model.is_loading);
    assert_eq!(model.meals.len(), 2);

    let kedgeree = &model.meals[0];
    assert_eq!(kedgeree.id, "10");
    assert_eq!(kedgeree.thumbnail, "https://img.test/10.jpg");
    assert_eq!(kedgeree.area, None);
    assert!(kedgeree.ingredients.is_empty());

    let fish_pie = &model.meals[1];
    assert_eq!(fish_pie.area.as_deref(), Some("British"));

    // The batch failure never reaches the shared error slot
    assert_eq!(model.error, None);
}

#[test]
fn empty_filter_result_publishes_and_caches_an_empty_list() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let update = app.update(
        Event::FetchMeals {
            query: String::new(),
            category: "Goat".into(),
        },
        &mut model,
    );
    let mut requests = http_requests(update.effects);

    let update = app
        .resolve(&mut requests[0], json_response(&serde_json::json!({"meals": null})))
        .expect("filter response resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(!model.is_loading);
    assert!(model.meals.is_empty());
    assert_eq!(model.category_cache.get("Goat").map(Vec::len), Some(0));
}

#[test]
fn category_filter_failure_resets_meals_and_records_the_error() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.meals.push(shared::Meal {
        id: "1".into(),
        name: "Stale".into(),
        thumbnail: String::new(),
        category: None,
        area: None,
        instructions: None,
        source_url: None,
        youtube_url: None,
        ingredients: Vec::new(),
    });

    let update = app.update(
        Event::FetchMeals {
            query: String::new(),
            category: "Pasta".into(),
        },
        &mut model,
    );
    let mut requests = http_requests(update.effects);

    let update = app
        .resolve(
            &mut requests[0],
            HttpResult::Ok(HttpResponse::ok().body(b"<html>gateway error</html>".to_vec()).build()),
        )
        .expect("broken filter response resolves");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(!model.is_loading);
    assert!(model.meals.is_empty());
    assert!(model.error.is_some());
    assert!(model.category_cache.get("Pasta").is_none());
}

#[test]
fn superseded_category_responses_are_dropped() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    // Start loading "Beef"
    let update = app.update(
        Event::FetchMeals {
            query: String::new(),
            category: "Beef".into(),
        },
        &mut model,
    );
    let mut beef_requests = http_requests(update.effects);

    let update = app
        .resolve(
            &mut beef_requests[0],
            json_response(&serde_json::json!({
                "meals": [{"idMeal": "20", "strMeal": "Beef Wellington", "strMealThumb": "https://img.test/20.jpg"}]
            })),
        )
        .expect("beef filter resolves");

    let mut beef_details = Vec::new();
    for event in update.events {
        let followup = app.update(event, &mut model);
        beef_details.extend(http_requests(followup.effects));
    }
    assert_eq!(beef_details.len(), 1);

    // User switches to "Lamb" before the detail lands
    let update = app.update(
        Event::FetchMeals {
            query: String::new(),
            category: "Lamb".into(),
        },
        &mut model,
    );
    let mut lamb_requests = http_requests(update.effects);
    assert_eq!(lamb_requests.len(), 1);

    // The late beef detail must not publish or clear the loading flag
    let update = app
        .resolve(
            &mut beef_details[0],
            json_response(&full_meal_body("20", "Beef Wellington", "British")),
        )
        .expect("stale detail resolves");
    for event in update.events {
        app.update(event, &mut model);
    }
    assert!(model.is_loading);
    assert!(model.meals.is_empty());
    assert!(model.category_cache.get("Beef").is_none());

    // The lamb load completes normally
    let update = app
        .resolve(&mut lamb_requests[0], json_response(&serde_json::json!({"meals": null})))
        .expect("lamb filter resolves");
    for event in update.events {
        app.update(event, &mut model);
    }
    assert!(!model.is_loading);
    assert_eq!(model.category_cache.get("Lamb").map(Vec::len), Some(0));
}
