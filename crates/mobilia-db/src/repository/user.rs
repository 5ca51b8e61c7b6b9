//! # User / Store Repository
//!
//! Read-mostly lookups for users and stores. The engine needs these for
//! the customer-exists check, store-access decisions, and the names joined
//! into sale details and notification payloads. Account management itself
//! lives outside this service; inserts exist for seeding and tests.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::DbResult;
use mobilia_core::{Store, User};

/// Repository for user and store lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID.
    pub async fn get_by_id<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        id: &str,
    ) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, role, store_id FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Gets a store by ID.
    pub async fn get_store<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        id: &str,
    ) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>("SELECT id, name FROM stores WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(store)
    }

    /// Inserts a user (seeding/tests).
    pub async fn insert_user(&self, user: &User) -> DbResult<()> {
        sqlx::query("INSERT INTO users (id, name, role, store_id) VALUES (?1, ?2, ?3, ?4)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(user.role)
            .bind(&user.store_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Inserts a store (seeding/tests).
    pub async fn insert_store(&self, store: &Store) -> DbResult<()> {
        sqlx::query("INSERT INTO stores (id, name) VALUES (?1, ?2)")
            .bind(&store.id)
            .bind(&store.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
