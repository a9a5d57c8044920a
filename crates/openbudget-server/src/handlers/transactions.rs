//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::StatusCode,
    Json,
};

use super::{filter_params, json_body};
use crate::{AppError, AppState};
use openbudget_core::models::{NewTransaction, TransactionWithRelations};
use openbudget_core::{FilterParams, TransactionFilter};

/// GET /transactions - List transactions, newest first
///
/// `startDate` and `endDate` clamp the transaction date to a closed range.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<Vec<TransactionWithRelations>>, AppError> {
    let filter = TransactionFilter::from_params(&filter_params(query)?)?;
    Ok(Json(state.db.list_transactions(&filter)?))
}

/// GET /transactions/:id - Get a transaction with its category and budget
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TransactionWithRelations>, AppError> {
    Ok(Json(state.db.get_transaction(&id)?))
}

/// POST /transactions - Create a transaction (date defaults to now)
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<TransactionWithRelations>), AppError> {
    let input: NewTransaction = json_body(request).await?;
    let transaction = state.db.create_transaction(&input)?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// PUT /transactions/:id - Replace a transaction
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<TransactionWithRelations>, AppError> {
    state.db.require_transaction(&id)?;
    let input: NewTransaction = json_body(request).await?;
    Ok(Json(state.db.update_transaction(&id, &input)?))
}

/// DELETE /transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.db.delete_transaction(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
