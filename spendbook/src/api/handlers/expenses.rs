//! Expense CRUD endpoints. Every operation is scoped to the authenticated
//! user; an expense owned by someone else is indistinguishable from one that
//! does not exist.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::expenses::{
        ExpenseCreateRequest, ExpenseMutationResponse, ExpensePage, ExpenseUpdateRequest,
        ListExpensesQuery,
    },
    auth::middleware::CurrentUser,
    db::{
        errors::DbError,
        handlers::{expenses::ExpenseFilter, expenses::Expenses, repository::Repository},
        models::expenses::{ExpenseCreateDBRequest, ExpenseUpdateDBRequest},
    },
    errors::Error,
    types::ExpenseId,
};

fn not_found() -> Error {
    Error::NotFoundOrUnauthorized {
        resource: "Expense".to_string(),
    }
}

/// List the authenticated user's expenses, paginated and optionally filtered
#[utoipa::path(
    get,
    path = "/api/expenses",
    params(ListExpensesQuery),
    tag = "expenses",
    responses(
        (status = 200, description = "One page of expenses", body = ExpensePage),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Invalid or expired token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_expenses(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListExpensesQuery>,
) -> Result<Json<ExpensePage>, Error> {
    let filter = ExpenseFilter {
        user_id: user.user_id,
        category: query.category.clone(),
        start_date: query.start_date,
        end_date: query.end_date,
        skip: query.pagination.skip(),
        limit: query.pagination.limit(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut expense_repo = Expenses::new(&mut conn);

    let total = expense_repo.count(&filter).await?;
    let expenses = expense_repo.list(&filter).await?;

    Ok(Json(ExpensePage {
        expenses: expenses.into_iter().map(Into::into).collect(),
        total_pages: query.pagination.total_pages(total),
    }))
}

/// Create an expense owned by the authenticated user
#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = ExpenseCreateRequest,
    tag = "expenses",
    responses(
        (status = 201, description = "Expense created", body = ExpenseMutationResponse),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Invalid or expired token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ExpenseCreateRequest>,
) -> Result<(StatusCode, Json<ExpenseMutationResponse>), Error> {
    let (Some(amount), Some(category), Some(date)) = (request.amount, request.category, request.date)
    else {
        return Err(Error::BadRequest {
            message: "Amount, category, and date are required".to_string(),
        });
    };
    if category.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Amount, category, and date are required".to_string(),
        });
    }

    // The owner always comes from the verified token, never from the body
    let create_request = ExpenseCreateDBRequest {
        user_id: user.user_id,
        amount,
        category,
        date,
        description: request.description,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut expense_repo = Expenses::new(&mut conn);
    let expense = expense_repo.create(&create_request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ExpenseMutationResponse {
            message: "Expense added successfully".to_string(),
            expense: expense.into(),
        }),
    ))
}

/// Update an expense owned by the authenticated user.
///
/// Absent fields keep their stored values. The date of an expense cannot be
/// changed after creation.
#[utoipa::path(
    put,
    path = "/api/expenses/{id}",
    request_body = ExpenseUpdateRequest,
    params(("id" = String, Path, format = "uuid", description = "Expense id")),
    tag = "expenses",
    responses(
        (status = 200, description = "Expense updated", body = ExpenseMutationResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "Expense not found or owned by another user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ExpenseId>,
    Json(request): Json<ExpenseUpdateRequest>,
) -> Result<Json<ExpenseMutationResponse>, Error> {
    let update_request = ExpenseUpdateDBRequest {
        amount: request.amount,
        category: request.category,
        description: request.description,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut expense_repo = Expenses::new(&mut conn);

    let expense = expense_repo
        .update((user.user_id, id), &update_request)
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(),
            other => Error::Database(other),
        })?;

    Ok(Json(ExpenseMutationResponse {
        message: "Expense updated successfully".to_string(),
        expense: expense.into(),
    }))
}

/// Delete an expense owned by the authenticated user
#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    params(("id" = String, Path, format = "uuid", description = "Expense id")),
    tag = "expenses",
    responses(
        (status = 200, description = "Expense deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "Expense not found or owned by another user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ExpenseId>,
) -> Result<Json<crate::api::models::auth::MessageResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut expense_repo = Expenses::new(&mut conn);

    let deleted = expense_repo.delete((user.user_id, id)).await?;
    if !deleted {
        return Err(not_found());
    }

    Ok(Json(crate::api::models::auth::MessageResponse::new(
        "Expense deleted successfully",
    )))
}
