// Endpoint handlers
//
// Each handler receives inputs that are already decoded and validated and
// returns the JSON payload. None of them perform I/O.

use chrono::NaiveTime;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::types::{
    AdsCookie, CreatedItem, ItemNumber, ItemRef, ItemSearch, ItemSummary, ItemUpdate,
    ItemUpdateByUser, Message, ModelReply, ProcessSchedule, UserAgent, UserDirectory, UserId,
};
use crate::dispatch::{DispatchError, Inputs};
use crate::models::{Image, Item, Offer, User};
use crate::validation::temporal::{IsoDuration, Timestamp};
use crate::validation::{ErrorKind, FieldError, Loc};

const LONG_DESCRIPTION: &str = "This is an amazing item that has a long description";

fn reply<T: Serialize>(body: &T) -> Result<Value, DispatchError> {
    Ok(serde_json::to_value(body)?)
}

pub fn root(_: &Inputs) -> Result<Value, DispatchError> {
    reply(&Message {
        message: "Hello World",
    })
}

pub fn list_users(_: &Inputs) -> Result<Value, DispatchError> {
    reply(&UserDirectory {
        users: BTreeMap::new(),
    })
}

pub fn read_user(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&UserId {
        user_id: inputs.int("user_id")?,
    })
}

pub fn read_model(inputs: &Inputs) -> Result<Value, DispatchError> {
    let model_name = inputs.string("model_name")?;
    let message = match model_name {
        "alexnet" => "Deep Learning FTW!",
        "lenet" => "LeCNN all the images",
        _ => "Have some residuals",
    };
    reply(&ModelReply {
        model_name,
        message,
    })
}

fn item_summary(
    inputs: &Inputs,
    owner_id: Option<i64>,
) -> Result<ItemSummary<'_>, DispatchError> {
    Ok(ItemSummary {
        item_id: inputs.string("item_id")?,
        owner_id,
        q: inputs.non_empty("q"),
        description: (!inputs.flag("short")).then_some(LONG_DESCRIPTION),
    })
}

pub fn read_item(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&item_summary(inputs, None)?)
}

pub fn read_user_item(inputs: &Inputs) -> Result<Value, DispatchError> {
    let owner_id = inputs.int("user_id")?;
    reply(&item_summary(inputs, Some(owner_id))?)
}

pub fn create_item(inputs: &Inputs) -> Result<Value, DispatchError> {
    let item: Item = inputs.decode("item")?;
    let price_with_tax = item.price_with_tax();
    reply(&CreatedItem {
        item,
        price_with_tax,
    })
}

pub fn search_items(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&ItemSearch {
        items: vec![ItemRef { item_id: "Foo" }, ItemRef { item_id: "Bar" }],
        q: inputs.non_empty("q"),
    })
}

pub fn read_item_number(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&ItemNumber {
        item_id: inputs.int("item_id")?,
        q: inputs.non_empty("q"),
    })
}

pub fn update_item_by_user(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&ItemUpdateByUser {
        item_id: inputs.int("item_id")?,
        item: inputs.decode::<Item>("item")?,
        user: inputs.decode::<User>("user")?,
        importance: inputs.int("importance")?,
        q: inputs.non_empty("q"),
    })
}

pub fn update_item(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&ItemUpdate {
        item_id: inputs.int("item_id")?,
        item: inputs.decode("item")?,
    })
}

pub fn create_offer(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&inputs.decode::<Offer>("offer")?)
}

pub fn create_images(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&inputs.decode::<Vec<Image>>("images")?)
}

pub fn create_index_weights(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&inputs.decode::<BTreeMap<i64, f64>>("weights")?)
}

/// `start_process = start + process_after`, `duration = end - start_process`.
/// Either derived value is `null` when one of its operands is absent.
pub fn schedule_process(inputs: &Inputs) -> Result<Value, DispatchError> {
    let start_datetime: Option<Timestamp> = inputs.decode("start_datetime")?;
    let end_datetime: Option<Timestamp> = inputs.decode("end_datetime")?;
    let process_after: Option<IsoDuration> = inputs.decode("process_after")?;

    let start_process = match (start_datetime, process_after) {
        (Some(start), Some(after)) => Some(start.checked_add(after.0).ok_or_else(|| {
            body_value_error("process_after", "date value out of range", inputs)
        })?),
        _ => None,
    };

    let duration = match (end_datetime, start_process) {
        (Some(end), Some(begin)) => Some(IsoDuration(end.since(begin).ok_or_else(|| {
            body_value_error(
                "end_datetime",
                "can't subtract offset-naive and offset-aware datetimes",
                inputs,
            )
        })?)),
        _ => None,
    };

    reply(&ProcessSchedule {
        item_id: inputs.decode::<Uuid>("item_id")?,
        start_datetime,
        end_datetime,
        repeat_at: inputs.decode::<Option<NaiveTime>>("repeat_at")?,
        process_after,
        start_process,
        duration,
    })
}

fn body_value_error(field: &str, reason: &str, inputs: &Inputs) -> DispatchError {
    DispatchError::Validation(vec![FieldError::new(
        ErrorKind::ValueError,
        Loc::root("body").key(field),
        format!("Value error, {reason}"),
        inputs.get(field).clone(),
    )])
}

pub fn read_ads_cookie(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&AdsCookie {
        ads_id: inputs.get("ads_id").as_str(),
    })
}

pub fn read_user_agent(inputs: &Inputs) -> Result<Value, DispatchError> {
    reply(&UserAgent {
        user_agent: inputs.get("user_agent").as_str(),
    })
}
