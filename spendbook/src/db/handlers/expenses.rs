//! Database repository for expenses.
//!
//! Every operation here is scoped by owner: reads filter on `user_id`, and
//! update/delete match `{id, user_id}` jointly so a row owned by someone else
//! behaves exactly like a row that does not exist.

use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::expenses::{ExpenseCreateDBRequest, ExpenseDBResponse, ExpenseUpdateDBRequest},
};
use crate::types::{ExpenseId, UserId, abbrev_uuid};
use chrono::NaiveDate;

/// Filter for listing expenses.
///
/// `category` matches exactly; the date range is only applied when both ends
/// are present.
#[derive(Debug, Clone)]
pub struct ExpenseFilter {
    pub user_id: UserId,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub skip: i64,
    pub limit: i64,
}

impl ExpenseFilter {
    fn date_range(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (Some(start), Some(end)),
            // A half-open range is ignored, matching the list endpoint contract
            _ => (None, None),
        }
    }
}

pub struct Expenses<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Expenses<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Count the rows matching a filter, ignoring its pagination fields
    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    pub async fn count(&mut self, filter: &ExpenseFilter) -> Result<i64> {
        let (start_date, end_date) = filter.date_range();

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM expenses
            WHERE user_id = ?1
              AND (?2 IS NULL OR category = ?2)
              AND (?3 IS NULL OR date >= ?3)
              AND (?4 IS NULL OR date <= ?4)
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.category.as_deref())
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Expenses<'c> {
    type CreateRequest = ExpenseCreateDBRequest;
    type UpdateRequest = ExpenseUpdateDBRequest;
    type Response = ExpenseDBResponse;
    /// Owner plus row ID; the owner half enforces the access scope
    type Id = (UserId, ExpenseId);
    type Filter = ExpenseFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let expense_id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let expense = sqlx::query_as::<_, ExpenseDBResponse>(
            r#"
            INSERT INTO expenses (id, user_id, amount, category, date, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(expense_id)
        .bind(request.user_id)
        .bind(request.amount)
        .bind(request.category.as_str())
        .bind(request.date)
        .bind(request.description.as_deref())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(expense)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id.0), expense_id = %abbrev_uuid(&id.1)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let (user_id, expense_id) = id;
        let expense = sqlx::query_as::<_, ExpenseDBResponse>("SELECT * FROM expenses WHERE id = ? AND user_id = ?")
            .bind(expense_id)
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(expense)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let (start_date, end_date) = filter.date_range();

        let expenses = sqlx::query_as::<_, ExpenseDBResponse>(
            r#"
            SELECT * FROM expenses
            WHERE user_id = ?1
              AND (?2 IS NULL OR category = ?2)
              AND (?3 IS NULL OR date >= ?3)
              AND (?4 IS NULL OR date <= ?4)
            ORDER BY created_at, id
            LIMIT ?5 OFFSET ?6
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.category.as_deref())
        .bind(start_date)
        .bind(end_date)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(expenses)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id.0), expense_id = %abbrev_uuid(&id.1)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let (user_id, expense_id) = id;
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
            .bind(expense_id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id.0), expense_id = %abbrev_uuid(&id.1)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (user_id, expense_id) = id;
        let now = chrono::Utc::now();

        // COALESCE keeps stored values for absent fields; date is never touched
        let expense = sqlx::query_as::<_, ExpenseDBResponse>(
            r#"
            UPDATE expenses
            SET amount = COALESCE(?1, amount),
                category = COALESCE(?2, category),
                description = COALESCE(?3, description),
                updated_at = ?4
            WHERE id = ?5 AND user_id = ?6
            RETURNING *
            "#,
        )
        .bind(request.amount)
        .bind(request.category.as_deref())
        .bind(request.description.as_deref())
        .bind(now)
        .bind(expense_id)
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(expense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::SqlitePool;

    async fn create_owner(pool: &SqlitePool, email: &str) -> UserId {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = crate::db::handlers::users::Users::new(&mut conn);
        users
            .create(&UserCreateDBRequest {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash: "$argon2id$fake".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn expense_request(user_id: UserId, amount: f64, category: &str, date: &str) -> ExpenseCreateDBRequest {
        ExpenseCreateDBRequest {
            user_id,
            amount,
            category: category.to_string(),
            date: date.parse().unwrap(),
            description: None,
        }
    }

    fn all_of(user_id: UserId) -> ExpenseFilter {
        ExpenseFilter {
            user_id,
            category: None,
            start_date: None,
            end_date: None,
            skip: 0,
            limit: 100,
        }
    }

    #[sqlx::test]
    async fn test_create_and_get_expense(pool: SqlitePool) {
        let owner = create_owner(&pool, "owner@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut expenses = Expenses::new(&mut conn);

        let created = expenses
            .create(&expense_request(owner, 42.5, "Groceries", "2024-01-15"))
            .await
            .unwrap();
        assert_eq!(created.user_id, owner);
        assert_eq!(created.amount, 42.5);
        assert_eq!(created.category, "Groceries");

        let fetched = expenses.get_by_id((owner, created.id)).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[sqlx::test]
    async fn test_cross_user_reads_see_nothing(pool: SqlitePool) {
        let owner = create_owner(&pool, "owner@example.com").await;
        let other = create_owner(&pool, "other@example.com").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut expenses = Expenses::new(&mut conn);

        let created = expenses
            .create(&expense_request(owner, 10.0, "Transport", "2024-02-01"))
            .await
            .unwrap();

        assert!(expenses.get_by_id((other, created.id)).await.unwrap().is_none());
        assert!(expenses.list(&all_of(other)).await.unwrap().is_empty());
        assert_eq!(expenses.count(&all_of(other)).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn test_list_filters_and_pagination(pool: SqlitePool) {
        let owner = create_owner(&pool, "owner@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut expenses = Expenses::new(&mut conn);

        for (amount, category, date) in [
            (5.0, "Food", "2024-01-01"),
            (6.0, "Food", "2024-01-10"),
            (7.0, "Rent", "2024-01-20"),
            (8.0, "Food", "2024-02-05"),
        ] {
            expenses
                .create(&expense_request(owner, amount, category, date))
                .await
                .unwrap();
        }

        // Category filter
        let food = expenses
            .list(&ExpenseFilter {
                category: Some("Food".to_string()),
                ..all_of(owner)
            })
            .await
            .unwrap();
        assert_eq!(food.len(), 3);

        // Date range, inclusive on both ends
        let january = ExpenseFilter {
            start_date: Some("2024-01-01".parse().unwrap()),
            end_date: Some("2024-01-31".parse().unwrap()),
            ..all_of(owner)
        };
        assert_eq!(expenses.list(&january).await.unwrap().len(), 3);
        assert_eq!(expenses.count(&january).await.unwrap(), 3);

        // Half-open ranges are ignored
        let half_open = ExpenseFilter {
            start_date: Some("2024-02-01".parse().unwrap()),
            ..all_of(owner)
        };
        assert_eq!(expenses.list(&half_open).await.unwrap().len(), 4);

        // Combined category + range
        let january_food = ExpenseFilter {
            category: Some("Food".to_string()),
            start_date: Some("2024-01-01".parse().unwrap()),
            end_date: Some("2024-01-31".parse().unwrap()),
            ..all_of(owner)
        };
        assert_eq!(expenses.count(&january_food).await.unwrap(), 2);

        // Pagination in insertion order
        let page = expenses
            .list(&ExpenseFilter {
                skip: 1,
                limit: 2,
                ..all_of(owner)
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].amount, 6.0);
        assert_eq!(page[1].amount, 7.0);
    }

    #[sqlx::test]
    async fn test_partial_update_keeps_other_fields(pool: SqlitePool) {
        let owner = create_owner(&pool, "owner@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut expenses = Expenses::new(&mut conn);

        let created = expenses
            .create(&ExpenseCreateDBRequest {
                user_id: owner,
                amount: 30.0,
                category: "Books".to_string(),
                date: "2024-03-03".parse().unwrap(),
                description: Some("paperback".to_string()),
            })
            .await
            .unwrap();

        let updated = expenses
            .update(
                (owner, created.id),
                &ExpenseUpdateDBRequest {
                    amount: Some(35.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.amount, 35.0);
        assert_eq!(updated.category, "Books");
        assert_eq!(updated.description.as_deref(), Some("paperback"));
        assert_eq!(updated.date, created.date);
    }

    #[sqlx::test]
    async fn test_update_foreign_expense_is_not_found(pool: SqlitePool) {
        let owner = create_owner(&pool, "owner@example.com").await;
        let other = create_owner(&pool, "other@example.com").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut expenses = Expenses::new(&mut conn);

        let created = expenses
            .create(&expense_request(owner, 12.0, "Misc", "2024-04-01"))
            .await
            .unwrap();

        let err = expenses
            .update(
                (other, created.id),
                &ExpenseUpdateDBRequest {
                    amount: Some(99.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));

        // The row is untouched
        let unchanged = expenses.get_by_id((owner, created.id)).await.unwrap().unwrap();
        assert_eq!(unchanged.amount, 12.0);
    }

    #[sqlx::test]
    async fn test_delete_scoped_by_owner(pool: SqlitePool) {
        let owner = create_owner(&pool, "owner@example.com").await;
        let other = create_owner(&pool, "other@example.com").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut expenses = Expenses::new(&mut conn);

        let created = expenses
            .create(&expense_request(owner, 20.0, "Misc", "2024-05-01"))
            .await
            .unwrap();

        // Someone else cannot delete it
        assert!(!expenses.delete((other, created.id)).await.unwrap());
        assert!(expenses.get_by_id((owner, created.id)).await.unwrap().is_some());

        // The owner can
        assert!(expenses.delete((owner, created.id)).await.unwrap());
        assert!(expenses.get_by_id((owner, created.id)).await.unwrap().is_none());

        // Deleting again reports nothing to delete
        assert!(!expenses.delete((owner, created.id)).await.unwrap());
    }
}
