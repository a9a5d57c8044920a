//! Category handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::StatusCode,
    Json,
};

use super::{filter_params, json_body};
use crate::{AppError, AppState};
use openbudget_core::models::{Category, CategoryWithTransactions, NewCategory};
use openbudget_core::{CategoryFilter, FilterParams};

/// GET /categories - List categories with their transactions
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<Vec<CategoryWithTransactions>>, AppError> {
    let filter = CategoryFilter::from_params(&filter_params(query)?)?;
    let categories = state.db.list_categories(&filter)?;
    Ok(Json(categories))
}

/// GET /categories/:id - Get a category with its transactions
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryWithTransactions>, AppError> {
    Ok(Json(state.db.get_category(&id)?))
}

/// POST /categories - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let input: NewCategory = json_body(request).await?;
    let category = state.db.create_category(&input)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /categories/:id - Replace a category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<Category>, AppError> {
    // A missing record wins over a malformed body
    state.db.require_category(&id)?;
    let input: NewCategory = json_body(request).await?;
    Ok(Json(state.db.update_category(&id, &input)?))
}

/// DELETE /categories/:id - Delete a category with its budgets and transactions
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.db.delete_category(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
