//! Budget handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::StatusCode,
    Json,
};

use super::{filter_params, json_body};
use crate::{AppError, AppState};
use openbudget_core::models::{BudgetWithRelations, NewBudget};
use openbudget_core::{BudgetFilter, FilterParams};

/// GET /budgets - List budgets, newest start date first
///
/// `startDate` bounds the budget start and `endDate` the budget end.
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<Vec<BudgetWithRelations>>, AppError> {
    let filter = BudgetFilter::from_params(&filter_params(query)?)?;
    Ok(Json(state.db.list_budgets(&filter)?))
}

/// GET /budgets/:id - Get a budget with its category and transactions
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BudgetWithRelations>, AppError> {
    Ok(Json(state.db.get_budget(&id)?))
}

/// POST /budgets - Create a budget
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<BudgetWithRelations>), AppError> {
    let input: NewBudget = json_body(request).await?;
    let budget = state.db.create_budget(&input)?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// PUT /budgets/:id - Replace a budget
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<BudgetWithRelations>, AppError> {
    state.db.require_budget(&id)?;
    let input: NewBudget = json_body(request).await?;
    Ok(Json(state.db.update_budget(&id, &input)?))
}

/// DELETE /budgets/:id - Delete a budget, detaching its transactions
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.db.delete_budget(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
