//! Derivation of a collection's trip fields from its member day plans.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::DayPlanSummary;

/// Fields of a collection computed from its membership.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripDerivation {
    pub destinations: Vec<String>,
    pub trip_start: Option<NaiveDate>,
    pub trip_end: Option<NaiveDate>,
    pub total_budget: f64,
}

/// Compute destinations, date bounds and total budget for a set of day plans.
///
/// Never fails. Input order only affects the order of `destinations`; the date
/// bounds and the budget are the same for any permutation of the input.
pub fn derive_trip(plans: &[DayPlanSummary]) -> TripDerivation {
    let mut seen = HashSet::new();
    let destinations = plans
        .iter()
        .filter_map(|plan| plan.city.as_deref())
        .filter(|city| !city.trim().is_empty())
        .filter(|city| seen.insert(*city))
        .map(str::to_string)
        .collect();

    let dates: Vec<NaiveDate> = plans
        .iter()
        .filter_map(|plan| plan.date.as_deref())
        .filter_map(parse_plan_date)
        .collect();

    // Summing in sorted order keeps the float result independent of input order.
    let mut budgets: Vec<f64> = plans
        .iter()
        .map(|plan| budget_or_zero(plan.total_budget))
        .collect();
    budgets.sort_by(f64::total_cmp);

    TripDerivation {
        destinations,
        trip_start: dates.iter().min().copied(),
        trip_end: dates.iter().max().copied(),
        total_budget: budgets.into_iter().sum(),
    }
}

/// Parse a stored or client-supplied date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps (whose UTC calendar date is
/// used). Anything else is treated as no date.
pub fn parse_plan_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

fn budget_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
