//! Database request/response models for expenses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{ExpenseId, UserId};

/// Request to insert a new expense row.
///
/// The owner is part of the request and is always taken from the authenticated
/// user, never from client input.
#[derive(Debug, Clone)]
pub struct ExpenseCreateDBRequest {
    pub user_id: UserId,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Partial update of an expense row. `None` fields keep their stored values.
/// The `date` column is never updated.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdateDBRequest {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// An expense row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExpenseDBResponse {
    pub id: ExpenseId,
    pub user_id: UserId,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
