//! Trip collection model: a named, user-owned group of day plans.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DayPlan;

/// A trip collection.
///
/// `destinations`, `trip_start`, `trip_end` and `total_budget` are derived
/// from the member day plans on every membership change. A collection with no
/// members keeps whatever destinations and dates were supplied at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub destinations: Vec<String>,
    pub trip_start: Option<NaiveDate>,
    pub trip_end: Option<NaiveDate>,
    pub day_plan_ids: Vec<String>,
    pub total_budget: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// A collection together with its member day plans, in membership order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDetails {
    #[serde(flatten)]
    pub collection: Collection,
    pub day_plans: Vec<DayPlan>,
}

/// Request body for creating a collection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub day_plan_ids: Vec<String>,
    /// Only used when `day_plan_ids` is empty.
    #[serde(default)]
    pub destinations: Option<Vec<String>>,
    /// Only used when `day_plan_ids` is empty.
    #[serde(default)]
    pub trip_start: Option<String>,
    /// Only used when `day_plan_ids` is empty.
    #[serde(default)]
    pub trip_end: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for renaming or re-describing a collection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollectionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body replacing a collection's membership.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceMembershipRequest {
    #[serde(default)]
    pub day_plan_ids: Vec<String>,
}

/// Request body adding one day plan to a collection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    #[serde(default)]
    pub day_plan_id: String,
}

/// Query string for listing collections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}
