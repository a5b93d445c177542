//! Collection operations.
//!
//! Each mutation validates membership, derives the trip fields and writes the
//! collection inside one transaction, so a failed check never leaves a
//! partially updated collection behind.

use std::collections::HashSet;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::repository::{
    fetch_day_plans_by_id, fetch_day_plans_in_order, fetch_plan_summaries, now_timestamp,
    parse_json_array, Repository,
};
use crate::errors::{AppError, DUPLICATE_COLLECTION_NAME};
use crate::models::{Collection, CollectionDetails, CreateCollectionRequest, UpdateCollectionRequest};
use crate::trips::{
    derive_trip, ensure_trip_dates_ordered, normalize_member_ids, order_by_ids, parse_id,
    parse_optional_date, resolve_members, TripDerivation, ValidatedMembership,
};

const COLLECTION_COLUMNS: &str = "id, user_id, name, description, destinations, trip_start, trip_end, day_plan_ids, total_budget, created_at, updated_at";

impl Repository {
    // ==================== COLLECTION READS ====================

    /// List collections, newest first, optionally for a single owner. Each
    /// collection comes with its member day plans.
    pub async fn list_collections(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<CollectionDetails>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let rows = match user_id {
            Some(raw) => {
                let user_id = parse_id(raw)
                    .ok_or_else(|| AppError::Validation(format!("Invalid user id: {}", raw)))?;
                sqlx::query(&format!(
                    "SELECT {} FROM collections WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
                    COLLECTION_COLUMNS
                ))
                .bind(user_id)
                .fetch_all(&mut *conn)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM collections ORDER BY created_at DESC, rowid DESC",
                    COLLECTION_COLUMNS
                ))
                .fetch_all(&mut *conn)
                .await?
            }
        };

        let collections = rows
            .iter()
            .map(collection_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let member_ids: Vec<String> = collections
            .iter()
            .flat_map(|collection| collection.day_plan_ids.iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let plans = fetch_day_plans_by_id(&mut conn, &member_ids).await?;

        Ok(collections
            .into_iter()
            .map(|collection| {
                let day_plans = collection
                    .day_plan_ids
                    .iter()
                    .filter_map(|id| plans.get(id).cloned())
                    .collect();
                CollectionDetails {
                    collection,
                    day_plans,
                }
            })
            .collect())
    }

    /// Get a collection with its member day plans populated.
    pub async fn get_collection_details(
        &self,
        id: &str,
    ) -> Result<Option<CollectionDetails>, AppError> {
        let collection_id = parse_collection_id(id)?;
        let mut conn = self.pool.acquire().await?;

        let Some(collection) = fetch_collection(&mut conn, &collection_id).await? else {
            return Ok(None);
        };
        let day_plans = fetch_day_plans_in_order(&mut conn, &collection.day_plan_ids).await?;

        Ok(Some(CollectionDetails {
            collection,
            day_plans,
        }))
    }

    // ==================== COLLECTION MUTATIONS ====================

    /// Create a collection.
    ///
    /// With members, the trip fields are derived from them and any manually
    /// supplied destinations or dates are ignored. Without members, the manual
    /// values are stored as given and the budget is zero.
    pub async fn create_collection(
        &self,
        request: &CreateCollectionRequest,
    ) -> Result<Collection, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        let user_id = parse_id(&request.user_id)
            .ok_or_else(|| AppError::Validation("Valid userId is required".to_string()))?;
        let member_ids = normalize_member_ids(&request.day_plan_ids)?;

        let mut tx = self.begin_write().await?;

        let (member_ids, derived) = if member_ids.is_empty() {
            let manual = TripDerivation {
                destinations: request.destinations.clone().unwrap_or_default(),
                trip_start: parse_optional_date(request.trip_start.as_deref(), "tripStart")?,
                trip_end: parse_optional_date(request.trip_end.as_deref(), "tripEnd")?,
                total_budget: 0.0,
            };
            (member_ids, manual)
        } else {
            let membership = validate_membership(&mut tx, member_ids, &user_id).await?;
            let derived = derive_trip(&membership.plans);
            (membership.ids, derived)
        };
        ensure_trip_dates_ordered(derived.trip_start, derived.trip_end)?;
        ensure_name_available(&mut tx, &user_id, name, None).await?;

        let now = now_timestamp();
        let collection = Collection {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            name: name.to_string(),
            description: normalize_description(request.description.as_deref()),
            destinations: derived.destinations,
            trip_start: derived.trip_start,
            trip_end: derived.trip_end,
            day_plan_ids: member_ids,
            total_budget: derived.total_budget,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO collections ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            COLLECTION_COLUMNS
        ))
        .bind(&collection.id)
        .bind(&collection.user_id)
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(serde_json::to_string(&collection.destinations)?)
        .bind(collection.trip_start)
        .bind(collection.trip_end)
        .bind(serde_json::to_string(&collection.day_plan_ids)?)
        .bind(collection.total_budget)
        .bind(&collection.created_at)
        .bind(&collection.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            collection_id = %collection.id,
            members = collection.day_plan_ids.len(),
            "Created collection"
        );
        Ok(collection)
    }

    /// Replace a collection's membership and re-derive its trip fields.
    ///
    /// Ownership is checked against the collection's owner. An empty list
    /// resets every derived field.
    pub async fn replace_membership(
        &self,
        id: &str,
        day_plan_ids: &[String],
    ) -> Result<Collection, AppError> {
        let collection_id = parse_collection_id(id)?;
        let mut tx = self.begin_write().await?;

        let existing = fetch_collection(&mut tx, &collection_id)
            .await?
            .ok_or_else(|| collection_not_found(&collection_id))?;

        let member_ids = normalize_member_ids(day_plan_ids)?;
        let membership = validate_membership(&mut tx, member_ids, &existing.user_id).await?;
        let derived = derive_trip(&membership.plans);

        let updated = apply_membership(&mut tx, existing, membership.ids, derived).await?;
        tx.commit().await?;

        tracing::info!(
            collection_id = %updated.id,
            members = updated.day_plan_ids.len(),
            "Replaced collection membership"
        );
        Ok(updated)
    }

    /// Add one day plan to a collection. Adding an existing member is a no-op
    /// apart from re-deriving the trip fields.
    pub async fn add_member(&self, id: &str, day_plan_id: &str) -> Result<Collection, AppError> {
        let collection_id = parse_collection_id(id)?;
        let mut tx = self.begin_write().await?;

        let existing = fetch_collection(&mut tx, &collection_id)
            .await?
            .ok_or_else(|| collection_not_found(&collection_id))?;

        let mut requested = existing.day_plan_ids.clone();
        requested.push(day_plan_id.to_string());
        let member_ids = normalize_member_ids(&requested)?;
        let membership = validate_membership(&mut tx, member_ids, &existing.user_id).await?;
        let derived = derive_trip(&membership.plans);

        let updated = apply_membership(&mut tx, existing, membership.ids, derived).await?;
        tx.commit().await?;

        tracing::debug!(
            collection_id = %updated.id,
            members = updated.day_plan_ids.len(),
            "Added day plan to collection"
        );
        Ok(updated)
    }

    /// Rename or re-describe a collection. Membership and derived fields are
    /// left untouched; an empty description clears it.
    pub async fn update_collection(
        &self,
        id: &str,
        request: &UpdateCollectionRequest,
    ) -> Result<Collection, AppError> {
        let collection_id = parse_collection_id(id)?;
        let mut tx = self.begin_write().await?;

        let existing = fetch_collection(&mut tx, &collection_id)
            .await?
            .ok_or_else(|| collection_not_found(&collection_id))?;

        let name = match request.name.as_deref().map(str::trim) {
            Some("") => {
                return Err(AppError::Validation("name cannot be empty".to_string()));
            }
            Some(name) => {
                ensure_name_available(&mut tx, &existing.user_id, name, Some(&collection_id))
                    .await?;
                name.to_string()
            }
            None => existing.name.clone(),
        };
        let description = match &request.description {
            Some(description) => normalize_description(Some(description)),
            None => existing.description.clone(),
        };

        let now = now_timestamp();
        sqlx::query("UPDATE collections SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(&description)
            .bind(&now)
            .bind(&collection_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Collection {
            name,
            description,
            updated_at: now,
            ..existing
        })
    }

    /// Delete a collection. Member day plans are not touched.
    pub async fn delete_collection(&self, id: &str) -> Result<(), AppError> {
        let collection_id = parse_collection_id(id)?;

        let result = sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(&collection_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(collection_not_found(&collection_id));
        }

        tracing::info!(collection_id = %collection_id, "Deleted collection");
        Ok(())
    }
}

/// Fetch the members' records and check existence and ownership.
async fn validate_membership(
    conn: &mut SqliteConnection,
    ids: Vec<String>,
    owner_id: &str,
) -> Result<ValidatedMembership, AppError> {
    let fetched = fetch_plan_summaries(conn, &ids).await?;
    resolve_members(ids, fetched, owner_id)
}

/// Persist a new membership and its derivation, returning the updated record.
async fn apply_membership(
    conn: &mut SqliteConnection,
    existing: Collection,
    member_ids: Vec<String>,
    derived: TripDerivation,
) -> Result<Collection, AppError> {
    ensure_trip_dates_ordered(derived.trip_start, derived.trip_end)?;

    let now = now_timestamp();
    write_membership(conn, &existing.id, &member_ids, &derived, &now).await?;

    Ok(Collection {
        destinations: derived.destinations,
        trip_start: derived.trip_start,
        trip_end: derived.trip_end,
        day_plan_ids: member_ids,
        total_budget: derived.total_budget,
        updated_at: now,
        ..existing
    })
}

async fn write_membership(
    conn: &mut SqliteConnection,
    collection_id: &str,
    member_ids: &[String],
    derived: &TripDerivation,
    now: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE collections SET day_plan_ids = ?, destinations = ?, trip_start = ?, trip_end = ?, total_budget = ?, updated_at = ? WHERE id = ?",
    )
    .bind(serde_json::to_string(member_ids)?)
    .bind(serde_json::to_string(&derived.destinations)?)
    .bind(derived.trip_start)
    .bind(derived.trip_end)
    .bind(derived.total_budget)
    .bind(now)
    .bind(collection_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Collections of `owner_id` whose membership includes `day_plan_id`.
///
/// Only the plan's owner can hold it in a collection, so scanning that
/// owner's collections is sufficient.
pub(super) async fn collections_holding(
    conn: &mut SqliteConnection,
    owner_id: &str,
    day_plan_id: &str,
) -> Result<Vec<Collection>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM collections WHERE user_id = ?",
        COLLECTION_COLUMNS
    ))
    .bind(owner_id)
    .fetch_all(&mut *conn)
    .await?;

    let collections = rows
        .iter()
        .map(collection_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(collections
        .into_iter()
        .filter(|collection| collection.day_plan_ids.iter().any(|id| id == day_plan_id))
        .collect())
}

/// Recompute a collection's trip fields from the given members.
///
/// Used when a member day plan changes or disappears underneath a collection;
/// ids that no longer resolve are dropped rather than failing the caller.
pub(super) async fn rederive_collection(
    conn: &mut SqliteConnection,
    collection_id: &str,
    member_ids: &[String],
    now: &str,
) -> Result<(), AppError> {
    let fetched = fetch_plan_summaries(conn, member_ids).await?;
    let (plans, _missing) = order_by_ids(member_ids, fetched);
    let kept: Vec<String> = plans.iter().map(|plan| plan.id.clone()).collect();

    write_membership(conn, collection_id, &kept, &derive_trip(&plans), now).await
}

async fn fetch_collection(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Collection>, AppError> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM collections WHERE id = ?",
        COLLECTION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(collection_from_row).transpose()?)
}

/// Pre-check for `(user_id, name)` uniqueness. The unique index remains the
/// final arbiter for concurrent writers.
async fn ensure_name_available(
    conn: &mut SqliteConnection,
    user_id: &str,
    name: &str,
    exclude_id: Option<&str>,
) -> Result<(), AppError> {
    let taken = sqlx::query("SELECT id FROM collections WHERE user_id = ? AND name = ? AND id != ?")
        .bind(user_id)
        .bind(name)
        .bind(exclude_id.unwrap_or(""))
        .fetch_optional(&mut *conn)
        .await?;

    if taken.is_some() {
        return Err(AppError::Conflict(DUPLICATE_COLLECTION_NAME.to_string()));
    }
    Ok(())
}

fn parse_collection_id(id: &str) -> Result<String, AppError> {
    parse_id(id).ok_or_else(|| AppError::Validation(format!("Invalid collection id: {}", id)))
}

fn collection_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Collection {} not found", id))
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .map(str::to_string)
}

fn collection_from_row(row: &SqliteRow) -> Result<Collection, sqlx::Error> {
    let destinations: String = row.try_get("destinations")?;
    let day_plan_ids: String = row.try_get("day_plan_ids")?;
    Ok(Collection {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        destinations: parse_json_array(&destinations),
        trip_start: row.try_get("trip_start")?,
        trip_end: row.try_get("trip_end")?,
        day_plan_ids: parse_json_array(&day_plan_ids),
        total_budget: row.try_get("total_budget")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
