//! HTTP request handlers organized by resource
//!
//! Each submodule contains the CRUD handlers for one resource. Shared
//! request parsing lives here so every resource reports malformed input
//! the same way.

pub mod budgets;
pub mod categories;
pub mod transactions;

// Re-export all handlers for use in router
pub use budgets::*;
pub use categories::*;
pub use transactions::*;

use axum::{
    extract::{rejection::QueryRejection, Query, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::{AppError, MAX_BODY_SIZE};
use openbudget_core::FilterParams;

/// GET / - Welcome message
pub async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to OpenBudget API"
    }))
}

/// Read and decode a JSON request body
pub(crate) async fn json_body<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

/// Unwrap list query parameters, reporting a malformed query string as 400
pub(crate) fn filter_params(
    query: Result<Query<FilterParams>, QueryRejection>,
) -> Result<FilterParams, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::bad_request(&e.body_text()))
}
