//! # Store Inventory Repository
//!
//! Database operations for the per-(product, store) stock ledger.
//!
//! ## No-Oversell Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Guarded Decrement Strategy                              │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write (two sales can both pass the check)         │
//! │     SELECT quantity ... ; UPDATE ... SET quantity = 3                  │
//! │                                                                         │
//! │  ✅ CORRECT: single guarded statement                                  │
//! │     UPDATE store_inventory                                             │
//! │     SET quantity = quantity - ?                                        │
//! │     WHERE product_id = ? AND store_id = ? AND quantity >= ?            │
//! │                                                                         │
//! │  rows_affected = 0 ⇒ a concurrent sale won the last units; the         │
//! │  caller's transaction rolls back instead of overselling.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::generate_id;
use mobilia_core::StoreInventory;

/// Repository for store-inventory ledger operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets the ledger row for a (product, store) pair, if one exists.
    pub async fn get<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        product_id: &str,
        store_id: &str,
    ) -> DbResult<Option<StoreInventory>> {
        let row = sqlx::query_as::<_, StoreInventory>(
            r#"
            SELECT id, product_id, store_id, quantity, min_stock
            FROM store_inventory
            WHERE product_id = ?1 AND store_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(store_id)
        .fetch_optional(executor)
        .await?;

        Ok(row)
    }

    /// All ledger rows for one product.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<StoreInventory>> {
        let rows = sqlx::query_as::<_, StoreInventory>(
            r#"
            SELECT id, product_id, store_id, quantity, min_stock
            FROM store_inventory
            WHERE product_id = ?1
            ORDER BY store_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Guarded decrement: subtracts `quantity` only when at least that much
    /// is on hand, in a single statement.
    ///
    /// ## Returns
    /// `false` when no row matched - either the pair has no ledger row or a
    /// concurrent sale took the stock first. The caller distinguishes the
    /// two cases by reading the row beforehand inside the same transaction.
    pub async fn decrement_guarded<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        product_id: &str,
        store_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(product_id, store_id, quantity, "Decrementing store inventory");

        let result = sqlx::query(
            r#"
            UPDATE store_inventory
            SET quantity = quantity - ?3
            WHERE product_id = ?1 AND store_id = ?2 AND quantity >= ?3
            "#,
        )
        .bind(product_id)
        .bind(store_id)
        .bind(quantity)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Restitution increment on cancellation.
    ///
    /// ## Returns
    /// `false` when the pair has no ledger row; the caller then credits the
    /// product's aggregate stock directly instead.
    pub async fn increment<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        product_id: &str,
        store_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(product_id, store_id, quantity, "Restoring store inventory");

        let result = sqlx::query(
            r#"
            UPDATE store_inventory
            SET quantity = quantity + ?3
            WHERE product_id = ?1 AND store_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(store_id)
        .bind(quantity)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Creates a ledger row for a (product, store) pair (seeding concern).
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the pair already has a row
    pub async fn insert(
        &self,
        product_id: &str,
        store_id: &str,
        quantity: i64,
        min_stock: i64,
    ) -> DbResult<StoreInventory> {
        let row = StoreInventory {
            id: generate_id(),
            product_id: product_id.to_string(),
            store_id: store_id.to_string(),
            quantity,
            min_stock,
        };

        sqlx::query(
            r#"
            INSERT INTO store_inventory (id, product_id, store_id, quantity, min_stock)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&row.id)
        .bind(&row.product_id)
        .bind(&row.store_id)
        .bind(row.quantity)
        .bind(row.min_stock)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }
}
