//! User model for the identity store.

use serde::{Deserialize, Serialize};

/// Role a user holds in the application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Admin,
    HotelManager,
    #[default]
    Traveler,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::HotelManager => "hotel-manager",
            UserRole::Traveler => "traveler",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "hotel-manager" => Some(UserRole::HotelManager),
            "traveler" => Some(UserRole::Traveler),
            _ => None,
        }
    }
}

/// A registered user. Day plans and collections are owned by users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: String,
}

/// Request body for registering a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}
