// Response payload types for the endpoint handlers

use chrono::NaiveTime;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{Item, User};
use crate::validation::temporal::{IsoDuration, Timestamp};

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserDirectory {
    pub users: BTreeMap<String, User>,
}

#[derive(Debug, Serialize)]
pub struct UserId {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ModelReply<'a> {
    pub model_name: &'a str,
    pub message: &'static str,
}

/// Item lookup by name, optionally scoped to an owner
#[derive(Debug, Serialize)]
pub struct ItemSummary<'a> {
    pub item_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

/// A created item echoed back with its taxed price
#[derive(Debug, Serialize)]
pub struct CreatedItem {
    #[serde(flatten)]
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_with_tax: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ItemRef {
    pub item_id: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ItemSearch<'a> {
    pub items: Vec<ItemRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ItemNumber<'a> {
    pub item_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ItemUpdate {
    pub item_id: i64,
    pub item: Item,
}

#[derive(Debug, Serialize)]
pub struct ItemUpdateByUser<'a> {
    pub item_id: i64,
    pub item: Item,
    pub user: User,
    pub importance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<&'a str>,
}

/// Scheduling inputs echoed with the derived start and duration
#[derive(Debug, Serialize)]
pub struct ProcessSchedule {
    pub item_id: Uuid,
    pub start_datetime: Option<Timestamp>,
    pub end_datetime: Option<Timestamp>,
    pub repeat_at: Option<NaiveTime>,
    pub process_after: Option<IsoDuration>,
    pub start_process: Option<Timestamp>,
    pub duration: Option<IsoDuration>,
}

#[derive(Debug, Serialize)]
pub struct AdsCookie<'a> {
    pub ads_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct UserAgent<'a> {
    #[serde(rename = "User-Agent")]
    pub user_agent: Option<&'a str>,
}
