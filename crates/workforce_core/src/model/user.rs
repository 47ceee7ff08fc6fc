//! API user and token model.

use serde::Serialize;

/// Row id of an API user.
pub type UserId = i64;

/// Persisted API user. The password hash never leaves the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: i64,
}

/// Opaque bearer token bound to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthToken {
    pub key: String,
    pub user_id: UserId,
    pub created_at: i64,
}
