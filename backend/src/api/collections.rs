//! Trip collection API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    AddMemberRequest, Collection, CollectionDetails, CreateCollectionRequest,
    ListCollectionsQuery, ReplaceMembershipRequest, UpdateCollectionRequest,
};
use crate::AppState;

/// POST /api/collections - Create a collection.
pub async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollectionRequest>,
) -> ApiResult<Collection> {
    match state.repo.create_collection(&request).await {
        Ok(collection) => success(collection),
        Err(e) => error(e),
    }
}

/// GET /api/collections?userId= - List collections with their day plans, newest first.
pub async fn list_collections(
    State(state): State<AppState>,
    Query(query): Query<ListCollectionsQuery>,
) -> ApiResult<Vec<CollectionDetails>> {
    let user_id = query.user_id.as_deref().filter(|id| !id.trim().is_empty());

    match state.repo.list_collections(user_id).await {
        Ok(collections) => success(collections),
        Err(e) => error(e),
    }
}

/// GET /api/collections/:id - Get a collection with its day plans.
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CollectionDetails> {
    match state.repo.get_collection_details(&id).await {
        Ok(Some(details)) => success(details),
        Ok(None) => error(AppError::NotFound(format!("Collection {} not found", id))),
        Err(e) => error(e),
    }
}

/// PATCH /api/collections/:id - Rename or re-describe a collection.
pub async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCollectionRequest>,
) -> ApiResult<Collection> {
    match state.repo.update_collection(&id, &request).await {
        Ok(collection) => success(collection),
        Err(e) => error(e),
    }
}

/// DELETE /api/collections/:id - Delete a collection.
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    match state.repo.delete_collection(&id).await {
        Ok(()) => success(()),
        Err(e) => error(e),
    }
}

/// PUT /api/collections/:id/day-plans - Replace the membership.
pub async fn replace_membership(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReplaceMembershipRequest>,
) -> ApiResult<Collection> {
    match state
        .repo
        .replace_membership(&id, &request.day_plan_ids)
        .await
    {
        Ok(collection) => success(collection),
        Err(e) => error(e),
    }
}

/// POST /api/collections/:id/day-plans - Add one day plan.
pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddMemberRequest>,
) -> ApiResult<Collection> {
    if request.day_plan_id.trim().is_empty() {
        return error(AppError::Validation("dayPlanId is required".to_string()));
    }

    match state.repo.add_member(&id, &request.day_plan_id).await {
        Ok(collection) => success(collection),
        Err(e) => error(e),
    }
}
