//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity. Collection
//! operations live in the sibling `collections` module.

use std::collections::HashMap;

use chrono::{NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::collections::{collections_holding, rederive_collection};
use crate::errors::AppError;
use crate::models::{
    CreateDayPlanRequest, CreateUserRequest, DayPlan, DayPlanSummary, MealSelection,
    UpdateDayPlanRequest, User, UserRole,
};
use crate::trips::{parse_id, parse_plan_date};

const DAY_PLAN_COLUMNS: &str =
    "id, user_id, date, city, places, hotel, meals, total_budget, created_at, updated_at";

/// Ids bound per `IN (...)` query; well below SQLite's host parameter limit.
const ID_CHUNK_SIZE: usize = 500;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a transaction that holds the write lock from its first statement.
    ///
    /// Under WAL a deferred transaction that reads before writing fails with
    /// `SQLITE_BUSY` instead of waiting on the busy timeout.
    pub(super) async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    // ==================== USER OPERATIONS ====================

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query("SELECT id, name, email, role, created_at FROM users ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let Some(user_id) = parse_id(id) else {
            return Err(AppError::Validation(format!("Invalid user id: {}", id)));
        };

        let row = sqlx::query("SELECT id, name, email, role, created_at FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    /// Register a new user. Emails are unique and stored lowercase.
    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let email = request.email.trim().to_lowercase();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed || email.contains(char::is_whitespace) {
            return Err(AppError::Validation(format!("Invalid email: {}", email)));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            role: request.role.unwrap_or_default(),
            created_at: now_timestamp(),
        };

        sqlx::query("INSERT INTO users (id, name, email, role, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(&user.created_at)
            .execute(&self.pool)
            .await?;

        Ok(user)
    }

    // ==================== DAY PLAN OPERATIONS ====================

    /// List a user's day plans, earliest first.
    pub async fn list_day_plans_for_user(&self, user_id: &str) -> Result<Vec<DayPlan>, AppError> {
        let Some(user_id) = parse_id(user_id) else {
            return Err(AppError::Validation(format!("Invalid user id: {}", user_id)));
        };

        let rows = sqlx::query(&format!(
            "SELECT {} FROM day_plans WHERE user_id = ? ORDER BY date, created_at",
            DAY_PLAN_COLUMNS
        ))
        .bind(&user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(day_plan_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Get a day plan by ID.
    pub async fn get_day_plan(&self, id: &str) -> Result<Option<DayPlan>, AppError> {
        let plan_id = parse_plan_id(id)?;
        let mut conn = self.pool.acquire().await?;
        fetch_day_plan(&mut conn, &plan_id).await
    }

    /// Create a day plan for an existing user.
    pub async fn create_day_plan(&self, request: &CreateDayPlanRequest) -> Result<DayPlan, AppError> {
        let user_id = parse_id(&request.user_id)
            .ok_or_else(|| AppError::Validation("Valid userId is required".to_string()))?;
        if self.get_user(&user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let date = parse_required_date(&request.date)?;
        let total_budget = request
            .total_budget
            .ok_or_else(|| AppError::Validation("totalBudget is required".to_string()))?;
        validate_plan_fields(&request.city, &request.hotel, total_budget)?;

        let now = now_timestamp();
        let plan = DayPlan {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            date,
            city: request.city.trim().to_string(),
            places: request.places.clone(),
            hotel: request.hotel.trim().to_string(),
            meals: request.meals.clone(),
            total_budget,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(&format!(
            "INSERT INTO day_plans ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            DAY_PLAN_COLUMNS
        ))
        .bind(&plan.id)
        .bind(&plan.user_id)
        .bind(plan.date)
        .bind(&plan.city)
        .bind(serde_json::to_string(&plan.places)?)
        .bind(&plan.hotel)
        .bind(serde_json::to_string(&plan.meals)?)
        .bind(plan.total_budget)
        .bind(&plan.created_at)
        .bind(&plan.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(plan)
    }

    /// Update a day plan and re-derive every collection that contains it.
    pub async fn update_day_plan(
        &self,
        id: &str,
        request: &UpdateDayPlanRequest,
    ) -> Result<DayPlan, AppError> {
        let plan_id = parse_plan_id(id)?;
        let mut tx = self.begin_write().await?;

        let existing = fetch_day_plan(&mut tx, &plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Day plan {} not found", plan_id)))?;

        let date = match &request.date {
            Some(raw) => parse_required_date(raw)?,
            None => existing.date,
        };
        let city = request.city.as_ref().unwrap_or(&existing.city);
        let hotel = request.hotel.as_ref().unwrap_or(&existing.hotel);
        let total_budget = request.total_budget.unwrap_or(existing.total_budget);
        validate_plan_fields(city, hotel, total_budget)?;

        let now = now_timestamp();
        let plan = DayPlan {
            id: plan_id,
            user_id: existing.user_id.clone(),
            date,
            city: city.trim().to_string(),
            places: request.places.clone().unwrap_or(existing.places.clone()),
            hotel: hotel.trim().to_string(),
            meals: request.meals.clone().unwrap_or(existing.meals.clone()),
            total_budget,
            created_at: existing.created_at.clone(),
            updated_at: now.clone(),
        };

        sqlx::query(
            "UPDATE day_plans SET date = ?, city = ?, places = ?, hotel = ?, meals = ?, total_budget = ?, updated_at = ? WHERE id = ?",
        )
        .bind(plan.date)
        .bind(&plan.city)
        .bind(serde_json::to_string(&plan.places)?)
        .bind(&plan.hotel)
        .bind(serde_json::to_string(&plan.meals)?)
        .bind(plan.total_budget)
        .bind(&plan.updated_at)
        .bind(&plan.id)
        .execute(&mut *tx)
        .await?;

        for collection in collections_holding(&mut tx, &plan.user_id, &plan.id).await? {
            rederive_collection(&mut tx, &collection.id, &collection.day_plan_ids, &now).await?;
        }

        tx.commit().await?;

        Ok(plan)
    }

    /// Delete a day plan, detaching it from every collection that holds it.
    pub async fn delete_day_plan(&self, id: &str) -> Result<(), AppError> {
        let plan_id = parse_plan_id(id)?;
        let mut tx = self.begin_write().await?;

        let existing = fetch_day_plan(&mut tx, &plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Day plan {} not found", plan_id)))?;

        sqlx::query("DELETE FROM day_plans WHERE id = ?")
            .bind(&plan_id)
            .execute(&mut *tx)
            .await?;

        let now = now_timestamp();
        let affected = collections_holding(&mut tx, &existing.user_id, &plan_id).await?;
        for collection in &affected {
            let remaining: Vec<String> = collection
                .day_plan_ids
                .iter()
                .filter(|member| **member != plan_id)
                .cloned()
                .collect();
            rederive_collection(&mut tx, &collection.id, &remaining, &now).await?;
        }

        tx.commit().await?;

        if !affected.is_empty() {
            tracing::info!(
                "Day plan {} removed from {} collection(s)",
                plan_id,
                affected.len()
            );
        }
        Ok(())
    }
}

// Shared helpers for the repository modules

/// Current time as an RFC 3339 timestamp with fixed precision, so stored
/// timestamps sort lexicographically.
pub(super) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fetch one day plan by canonical ID.
pub(super) async fn fetch_day_plan(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<DayPlan>, AppError> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM day_plans WHERE id = ?",
        DAY_PLAN_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.as_ref().map(day_plan_from_row).transpose()?)
}

/// Bulk-fetch the derivation fields of the given day plans.
///
/// Unknown ids are silently omitted; callers detect them by comparing against
/// the requested list.
pub(super) async fn fetch_plan_summaries(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<Vec<DayPlanSummary>, AppError> {
    let mut summaries = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(ID_CHUNK_SIZE) {
        let rows = select_day_plans_in("id, user_id, date, city, total_budget", chunk)
            .build()
            .fetch_all(&mut *conn)
            .await?;
        for row in &rows {
            summaries.push(summary_from_row(row)?);
        }
    }

    Ok(summaries)
}

/// Bulk-fetch full day plans keyed by id. Unknown ids are skipped.
pub(super) async fn fetch_day_plans_by_id(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<HashMap<String, DayPlan>, AppError> {
    let mut by_id = HashMap::with_capacity(ids.len());

    for chunk in ids.chunks(ID_CHUNK_SIZE) {
        let rows = select_day_plans_in(DAY_PLAN_COLUMNS, chunk)
            .build()
            .fetch_all(&mut *conn)
            .await?;
        for row in &rows {
            let plan = day_plan_from_row(row)?;
            by_id.insert(plan.id.clone(), plan);
        }
    }

    Ok(by_id)
}

/// Bulk-fetch full day plans, returned in `ids` order. Unknown ids are skipped.
pub(super) async fn fetch_day_plans_in_order(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<Vec<DayPlan>, AppError> {
    let mut by_id = fetch_day_plans_by_id(conn, ids).await?;
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

fn select_day_plans_in<'a>(columns: &str, ids: &'a [String]) -> QueryBuilder<'a, Sqlite> {
    let mut query = QueryBuilder::new(format!("SELECT {} FROM day_plans WHERE id IN (", columns));
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(")");
    query
}

fn parse_plan_id(id: &str) -> Result<String, AppError> {
    parse_id(id).ok_or_else(|| AppError::Validation(format!("Invalid plan id: {}", id)))
}

fn parse_required_date(raw: &str) -> Result<NaiveDate, AppError> {
    parse_plan_date(raw).ok_or_else(|| AppError::Validation(format!("Invalid date: {}", raw)))
}

fn validate_plan_fields(city: &str, hotel: &str, total_budget: f64) -> Result<(), AppError> {
    if city.trim().is_empty() {
        return Err(AppError::Validation("city is required".to_string()));
    }
    if hotel.trim().is_empty() {
        return Err(AppError::Validation("hotel is required".to_string()));
    }
    if !total_budget.is_finite() || total_budget < 0.0 {
        return Err(AppError::Validation(
            "totalBudget must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

// Helper functions for row conversion

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: UserRole::parse(&role).unwrap_or_default(),
        created_at: row.try_get("created_at")?,
    })
}

fn day_plan_from_row(row: &SqliteRow) -> Result<DayPlan, sqlx::Error> {
    let places: String = row.try_get("places")?;
    let meals: String = row.try_get("meals")?;
    Ok(DayPlan {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        date: row.try_get("date")?,
        city: row.try_get("city")?,
        places: parse_json_array(&places),
        hotel: row.try_get("hotel")?,
        meals: parse_json_object(&meals),
        total_budget: row.try_get("total_budget")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn summary_from_row(row: &SqliteRow) -> Result<DayPlanSummary, sqlx::Error> {
    Ok(DayPlanSummary {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        date: row.try_get("date")?,
        city: row.try_get("city")?,
        total_budget: row.try_get("total_budget")?,
    })
}

pub(super) fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

fn parse_json_object(s: &str) -> MealSelection {
    serde_json::from_str(s).unwrap_or_default()
}
