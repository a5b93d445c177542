//! Day plan API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateDayPlanRequest, DayPlan, UpdateDayPlanRequest};
use crate::AppState;

/// POST /api/planner - Save a day plan.
pub async fn create_day_plan(
    State(state): State<AppState>,
    Json(request): Json<CreateDayPlanRequest>,
) -> ApiResult<DayPlan> {
    match state.repo.create_day_plan(&request).await {
        Ok(plan) => success(plan),
        Err(e) => error(e),
    }
}

/// GET /api/planner/user/:user_id - List a user's day plans.
pub async fn list_day_plans_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<DayPlan>> {
    match state.repo.list_day_plans_for_user(&user_id).await {
        Ok(plans) => success(plans),
        Err(e) => error(e),
    }
}

/// GET /api/planner/:id - Get a single day plan.
pub async fn get_day_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DayPlan> {
    match state.repo.get_day_plan(&id).await {
        Ok(Some(plan)) => success(plan),
        Ok(None) => error(AppError::NotFound(format!("Day plan {} not found", id))),
        Err(e) => error(e),
    }
}

/// PUT /api/planner/:id - Update a day plan.
pub async fn update_day_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDayPlanRequest>,
) -> ApiResult<DayPlan> {
    match state.repo.update_day_plan(&id, &request).await {
        Ok(plan) => success(plan),
        Err(e) => error(e),
    }
}

/// DELETE /api/planner/:id - Delete a day plan.
pub async fn delete_day_plan(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    match state.repo.delete_day_plan(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}
