//! Checkout endpoint.

use std::sync::Arc;

use ::checkout::CheckoutItem;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use store::{ProductId, SalesStore, Transaction};

use super::AppState;
use crate::error::ApiError;

// -- Request parsing --

/// Reads a checkout body: a bare array of lines, or the same array under
/// `items`. Each line is `{"product_id": <int>, "quantity": <int>}`.
///
/// Errors name the offending field, e.g. `items[1].quantity`.
pub fn parse_items(body: Value) -> Result<Vec<CheckoutItem>, ApiError> {
    let lines = match body {
        Value::Array(lines) => lines,
        Value::Object(mut fields) => match fields.remove("items") {
            Some(Value::Array(lines)) => lines,
            Some(other) => {
                return Err(ApiError::BadRequest(format!(
                    "items must be an array, got {other}"
                )));
            }
            None => return Err(ApiError::BadRequest("items is required".to_string())),
        },
        other => {
            return Err(ApiError::BadRequest(format!(
                "request body must be an array of items, got {other}"
            )));
        }
    };

    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let Value::Object(fields) = line else {
                return Err(ApiError::BadRequest(format!(
                    "items[{index}] must be an object, got {line}"
                )));
            };

            let product_id = integer_field(fields, index, "product_id")?;
            let quantity = integer_field(fields, index, "quantity")?;
            let quantity = i32::try_from(quantity).map_err(|_| {
                ApiError::BadRequest(format!(
                    "items[{index}].quantity is out of range, got {quantity}"
                ))
            })?;

            Ok(CheckoutItem::new(ProductId::new(product_id), quantity))
        })
        .collect()
}

fn integer_field(
    fields: &Map<String, Value>,
    index: usize,
    name: &str,
) -> Result<i64, ApiError> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(ApiError::BadRequest(format!(
            "items[{index}].{name} is required"
        ))),
        Some(value) => value.as_i64().ok_or_else(|| {
            ApiError::BadRequest(format!(
                "items[{index}].{name} must be an integer, got {value}"
            ))
        }),
    }
}

// -- Handlers --

/// POST /api/checkout: record a sale and deduct its stock.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: SalesStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let Json(body) = payload
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;
    let items = parse_items(body)?;

    let transaction = state.checkout.checkout(&items).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}
