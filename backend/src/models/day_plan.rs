//! Day plan model: one day of an itinerary.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Meal slot (`breakfast`, `lunch`, `dinner`, `other`, ...) to the chosen meal.
pub type MealSelection = BTreeMap<String, serde_json::Value>;

/// A single day of a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub city: String,
    pub places: Vec<String>,
    pub hotel: String,
    pub meals: MealSelection,
    /// Hotel room price plus chosen meal prices, computed by the client.
    pub total_budget: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// The fields of a day plan that collection derivation reads.
///
/// `date` is kept as stored text and `total_budget` as an optional number so
/// derivation stays total over whatever the store hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlanSummary {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub total_budget: Option<f64>,
}

/// Request body for creating a day plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDayPlanRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub places: Vec<String>,
    #[serde(default)]
    pub hotel: String,
    #[serde(default)]
    pub meals: MealSelection,
    #[serde(default)]
    pub total_budget: Option<f64>,
}

/// Request body for updating a day plan. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDayPlanRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub places: Option<Vec<String>>,
    #[serde(default)]
    pub hotel: Option<String>,
    #[serde(default)]
    pub meals: Option<MealSelection>,
    #[serde(default)]
    pub total_budget: Option<f64>,
}
