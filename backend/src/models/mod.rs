//! Data models for the trip planner.
//!
//! Wire names are camelCase to match the browser client.

mod collection;
mod day_plan;
mod user;

pub use collection::*;
pub use day_plan::*;
pub use user::*;
