// API module entry
// Declares the route table served by the dispatcher

mod handlers;
mod types;

use hyper::Method;
use serde_json::json;
use std::collections::BTreeMap;

use crate::dispatch::{BodyField, NamedExample, ParamSpec, RouteSpec};
use crate::models::{Image, Item, Offer, User};
use crate::validation::{Constraints, ScalarKind};

/// Accepted values of the `model_name` path segment
pub const MODEL_NAMES: &[&str] = &["alexnet", "resnet", "lenet"];

const ITEMS_QUERY_DESCRIPTION: &str =
    "Query string for the items to search in the database that have a good match";

/// Every route, in declaration order
#[allow(clippy::too_many_lines)]
pub fn routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::new(Method::GET, "/", "root", handlers::root).summary("Root"),
        RouteSpec::new(Method::GET, "/user", "get_all_users", handlers::list_users)
            .summary("Get All Users"),
        RouteSpec::new(Method::GET, "/user/{user_id}", "get_user", handlers::read_user)
            .summary("Get User")
            .param(ParamSpec::path("user_id", ScalarKind::Int)),
        RouteSpec::new(Method::GET, "/models/{model_name}", "get_model", handlers::read_model)
            .summary("Get Model")
            .param(ParamSpec::path("model_name", ScalarKind::Choice(MODEL_NAMES))),
        RouteSpec::new(Method::GET, "/items/{item_id}", "read_item", handlers::read_item)
            .summary("Read Item")
            .param(ParamSpec::path("item_id", ScalarKind::Str))
            .param(ParamSpec::query("q", ScalarKind::Str))
            .param(ParamSpec::query("short", ScalarKind::Bool).default_value(false)),
        RouteSpec::new(
            Method::GET,
            "/users/{user_id}/items/{item_id}",
            "read_user_item",
            handlers::read_user_item,
        )
        .summary("Read User Item")
        .param(ParamSpec::path("user_id", ScalarKind::Int))
        .param(ParamSpec::path("item_id", ScalarKind::Str))
        .param(ParamSpec::query("q", ScalarKind::Str))
        .param(ParamSpec::query("short", ScalarKind::Bool).default_value(false)),
        RouteSpec::new(Method::POST, "/items/", "create_item", handlers::create_item)
            .summary("Create Item")
            .body(BodyField::model::<Item>("item")),
        RouteSpec::new(Method::GET, "/items/", "read_items", handlers::search_items)
            .summary("Read Items")
            .param(
                ParamSpec::query("q", ScalarKind::Str)
                    .required()
                    .title("Query string")
                    .description(ITEMS_QUERY_DESCRIPTION)
                    .constrain(Constraints::new().min_length(3).max_length(50)),
            ),
        RouteSpec::new(Method::GET, "/item/{item_id}", "read_item_number", handlers::read_item_number)
            .summary("Read Item Number")
            .param(
                ParamSpec::path("item_id", ScalarKind::Int)
                    .title("The ID of the item to get")
                    .constrain(Constraints::new().ge(1.0).le(100.0)),
            )
            .param(ParamSpec::query("q", ScalarKind::Str).alias("item-query")),
        RouteSpec::new(
            Method::PUT,
            "/itemss/{item_id}",
            "update_item_by_user",
            handlers::update_item_by_user,
        )
        .summary("Update Item By User")
        .param(ParamSpec::path("item_id", ScalarKind::Int))
        .param(ParamSpec::query("q", ScalarKind::Str))
        .body(BodyField::model::<Item>("item"))
        .body(BodyField::model::<User>("user"))
        .body(
            BodyField::scalar("importance", ScalarKind::Int).constrain(Constraints::new().gt(0.0)),
        ),
        RouteSpec::new(Method::PUT, "/items/{item_id}", "update_item", handlers::update_item)
            .summary("Update Item")
            .param(ParamSpec::path("item_id", ScalarKind::Int))
            .body(BodyField::model::<Item>("item")),
        RouteSpec::new(Method::POST, "/offers/", "create_offer", handlers::create_offer)
            .summary("Create Offer")
            .body(BodyField::model::<Offer>("offer")),
        RouteSpec::new(
            Method::POST,
            "/images/multiple/",
            "create_multiple_images",
            handlers::create_images,
        )
        .summary("Create Multiple Images")
        .body(BodyField::model::<Vec<Image>>("images")),
        RouteSpec::new(
            Method::POST,
            "/index-weights/",
            "create_index_weights",
            handlers::create_index_weights,
        )
        .summary("Create Index Weights")
        .body(BodyField::model::<BTreeMap<i64, f64>>("weights")),
        RouteSpec::new(
            Method::PUT,
            "/openapi_examples/{item_id}",
            "update_item_with_examples",
            handlers::update_item,
        )
        .summary("Update Item With Examples")
        .param(ParamSpec::path("item_id", ScalarKind::Int))
        .body(item_with_examples()),
        RouteSpec::new(
            Method::PUT,
            "/extra_data/{item_id}",
            "schedule_process",
            handlers::schedule_process,
        )
        .summary("Schedule Process")
        .param(ParamSpec::path("item_id", ScalarKind::Uuid))
        .body(BodyField::scalar("start_datetime", ScalarKind::DateTime).optional())
        .body(BodyField::scalar("end_datetime", ScalarKind::DateTime).optional())
        .body(BodyField::scalar("repeat_at", ScalarKind::Time).optional())
        .body(BodyField::scalar("process_after", ScalarKind::Duration).optional()),
        RouteSpec::new(Method::GET, "/items/cookie/", "read_ads_cookie", handlers::read_ads_cookie)
            .summary("Read Ads Cookie")
            .param(ParamSpec::cookie("ads_id", ScalarKind::Str)),
        RouteSpec::new(
            Method::GET,
            "/items/headers/",
            "read_user_agent",
            handlers::read_user_agent,
        )
        .summary("Read User Agent")
        .param(ParamSpec::header("user_agent", ScalarKind::Str)),
    ]
}

fn item_with_examples() -> BodyField {
    BodyField::model::<Item>("item")
        .example(
            NamedExample::new(
                "normal",
                "A normal example",
                json!({
                    "name": "Foo",
                    "description": "A very nice Item",
                    "price": 35.4,
                    "tax": 3.2
                }),
            )
            .description("A **normal** item works correctly."),
        )
        .example(
            NamedExample::new(
                "converted",
                "An example with converted data",
                json!({ "name": "Bar", "price": "35.4" }),
            )
            .description("Price `strings` are converted to actual `numbers` automatically"),
        )
        .example(NamedExample::new(
            "invalid",
            "Invalid data is rejected with an error",
            json!({ "name": "Baz", "price": "thirty five point four" }),
        ))
}
