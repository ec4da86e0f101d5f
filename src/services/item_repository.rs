//! Item repository - single-row SQL operations on the `items` table.
//!
//! Handlers talk to the [`ItemRepository`] trait so tests can swap in a
//! fake. [`PgItemRepository`] is the PostgreSQL implementation.
//!
//! # Query Safety
//!
//! Every statement binds user input through `$n` placeholders. No value
//! from a request is ever formatted into SQL text.

use crate::{
    db::DbPool,
    error::AppError,
    models::item::{Item, ItemFields},
};
use async_trait::async_trait;

/// Storage operations for items.
///
/// `update` and `delete` succeed when no row matches the id; callers
/// must not treat success as proof the item existed.
#[async_trait]
pub trait ItemRepository: Send + Sync + 'static {
    /// Insert a new item and return its generated id.
    async fn create(&self, fields: &ItemFields) -> Result<i32, AppError>;

    /// All items in insertion order. Empty when the table is empty.
    async fn get_all(&self) -> Result<Vec<Item>, AppError>;

    /// # Errors
    ///
    /// - `ItemNotFound`: no row has this id
    /// - `Database`: query or connection failure
    async fn get_by_id(&self, id: i32) -> Result<Item, AppError>;

    /// Replace name and description of the item with this id.
    async fn update(&self, id: i32, fields: &ItemFields) -> Result<(), AppError>;

    /// Remove the item with this id permanently.
    async fn delete(&self, id: i32) -> Result<(), AppError>;
}

/// PostgreSQL-backed [`ItemRepository`].
#[derive(Debug, Clone)]
pub struct PgItemRepository {
    pool: DbPool,
}

impl PgItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn create(&self, fields: &ItemFields) -> Result<i32, AppError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO items (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(fields.name())
        .bind(fields.description())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_all(&self) -> Result<Vec<Item>, AppError> {
        let items =
            sqlx::query_as::<_, Item>("SELECT id, name, description FROM items ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(items)
    }

    async fn get_by_id(&self, id: i32) -> Result<Item, AppError> {
        sqlx::query_as::<_, Item>("SELECT id, name, description FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ItemNotFound)
    }

    async fn update(&self, id: i32, fields: &ItemFields) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE items SET name = $1, description = $2 WHERE id = $3")
            .bind(fields.name())
            .bind(fields.description())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(id, "update matched no item");
        }

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(id, "delete matched no item");
        }

        Ok(())
    }
}
