//! API request/response models for expenses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::models::pagination::Pagination;
use crate::db::models::expenses::ExpenseDBResponse;
use crate::types::{ExpenseId, UserId};

/// Request body for creating an expense.
///
/// The required fields are optional here so the handler can reject incomplete
/// bodies with the expected message instead of a deserialization error. The
/// owner is never part of the body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ExpenseCreateRequest {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Request body for updating an expense. Absent fields keep their stored
/// values; the date of an expense cannot be changed.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ExpenseUpdateRequest {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// An expense as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ExpenseId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ExpenseDBResponse> for ExpenseResponse {
    fn from(expense: ExpenseDBResponse) -> Self {
        Self {
            id: expense.id,
            user_id: expense.user_id,
            amount: expense.amount,
            category: expense.category,
            date: expense.date,
            description: expense.description,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}

/// One page of expenses plus the page count for the whole filtered set
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePage {
    pub expenses: Vec<ExpenseResponse>,
    pub total_pages: i64,
}

/// Response body for create/update operations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseMutationResponse {
    pub message: String,
    pub expense: ExpenseResponse,
}

/// Query parameters for listing expenses
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListExpensesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return expenses in this category (exact match)
    pub category: Option<String>,

    /// Start of the date range (inclusive); only applied together with `endDate`
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,

    /// End of the date range (inclusive); only applied together with `startDate`
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
}
