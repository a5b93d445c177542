//! Validation of the day plan ids supplied as a collection's membership.
//!
//! The checks run in a fixed order: syntax, deduplication, existence,
//! ownership. The repository performs the bulk fetch between
//! [`normalize_member_ids`] and [`resolve_members`].

use std::collections::{HashMap, HashSet};

use crate::errors::AppError;
use crate::models::DayPlanSummary;

use super::parse_id;

/// Validated membership: deduplicated ids and their records, in the same order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedMembership {
    pub ids: Vec<String>,
    pub plans: Vec<DayPlanSummary>,
}

/// Check every id is well formed and collapse duplicates.
///
/// Ids are canonicalised before comparison so different spellings of the same
/// UUID count as one member. First occurrence wins.
pub fn normalize_member_ids(raw: &[String]) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(raw.len());

    for candidate in raw {
        let id = parse_id(candidate)
            .ok_or_else(|| AppError::Validation(format!("Invalid day plan id: {}", candidate)))?;
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    Ok(ids)
}

/// Match fetched records against the requested ids and check ownership.
///
/// Fails with [`AppError::UnresolvableMembers`] naming every id the store did
/// not return, then with [`AppError::Ownership`] on the first plan that is not
/// owned by `owner_id`.
pub fn resolve_members(
    ids: Vec<String>,
    fetched: Vec<DayPlanSummary>,
    owner_id: &str,
) -> Result<ValidatedMembership, AppError> {
    let (plans, missing_ids) = order_by_ids(&ids, fetched);
    if !missing_ids.is_empty() {
        return Err(AppError::UnresolvableMembers { missing_ids });
    }

    if let Some(foreign) = plans.iter().find(|plan| plan.user_id != owner_id) {
        return Err(AppError::Ownership(format!(
            "Day plan {} belongs to a different user",
            foreign.id
        )));
    }

    Ok(ValidatedMembership { ids, plans })
}

/// Arrange fetched records in `ids` order, returning the ids with no record.
pub fn order_by_ids(
    ids: &[String],
    fetched: Vec<DayPlanSummary>,
) -> (Vec<DayPlanSummary>, Vec<String>) {
    let mut by_id: HashMap<String, DayPlanSummary> = fetched
        .into_iter()
        .map(|plan| (plan.id.clone(), plan))
        .collect();

    let mut plans = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match by_id.remove(id) {
            Some(plan) => plans.push(plan),
            None => missing.push(id.clone()),
        }
    }

    (plans, missing)
}
