//! Database request/response models for users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::UserId;

/// Request to insert a new user row
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub first_name: String,
    pub last_name: String,
    /// Display name, derived from first and last name at registration
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A user row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
