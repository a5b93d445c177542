//! User API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateUserRequest, User};
use crate::AppState;

/// GET /api/users - List all users.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    match state.repo.list_users().await {
        Ok(users) => success(users),
        Err(e) => error(e),
    }
}

/// GET /api/users/:id - Get a single user.
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    match state.repo.get_user(&id).await {
        Ok(Some(user)) => success(user),
        Ok(None) => error(AppError::NotFound(format!("User {} not found", id))),
        Err(e) => error(e),
    }
}

/// POST /api/users - Register a user.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<User> {
    match state.repo.create_user(&request).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = user.role.as_str(), "Registered user");
            success(user)
        }
        Err(e) => error(e),
    }
}
