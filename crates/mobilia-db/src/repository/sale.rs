//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (one transaction, driven by the engine)                     │
//! │     └── latest_number_with_prefix() → compose sale_number              │
//! │     └── insert_sale() → Sale { status: Pending }                       │
//! │     └── insert_item() × N  (price/cost snapshots)                      │
//! │     └── ledger decrements + aggregate recompute                        │
//! │                                                                         │
//! │  2. STATUS UPDATES                                                     │
//! │     └── apply_update() after the transition table approves             │
//! │                                                                         │
//! │  3. CANCELLATION                                                       │
//! │     └── never DELETE - restitution + status = cancelled                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use mobilia_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = r#"
    id, sale_number, status,
    total_cents, discount_cents, tax_cents,
    payment_method, payment_reference, notes,
    customer_id, employee_id, store_id, fulfillment_store_id,
    is_online_order, delivered_at,
    created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, sale_id, product_id, name_snapshot,
    quantity, unit_price_cents, total_cents,
    cost_price_cents, profit_cents, created_at
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale by ID.
    pub async fn get_by_id<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        sale_id: &str,
    ) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    /// Lists sales, newest first, optionally scoped to one store.
    pub async fn list(&self, store_id: Option<&str>, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = match store_id {
            Some(store) => {
                sqlx::query_as::<_, Sale>(&format!(
                    "SELECT {SALE_COLUMNS} FROM sales WHERE store_id = ?1 \
                     ORDER BY created_at DESC LIMIT ?2"
                ))
                .bind(store)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Sale>(&format!(
                    "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC LIMIT ?1"
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(sales)
    }

    /// Lists a customer's sales, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists sales in a created_at range, optionally scoped to one store.
    pub async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        store_id: Option<&str>,
    ) -> DbResult<Vec<Sale>> {
        let sales = match store_id {
            Some(store) => {
                sqlx::query_as::<_, Sale>(&format!(
                    "SELECT {SALE_COLUMNS} FROM sales \
                     WHERE created_at >= ?1 AND created_at <= ?2 AND store_id = ?3 \
                     ORDER BY created_at DESC"
                ))
                .bind(start)
                .bind(end)
                .bind(store)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Sale>(&format!(
                    "SELECT {SALE_COLUMNS} FROM sales \
                     WHERE created_at >= ?1 AND created_at <= ?2 \
                     ORDER BY created_at DESC"
                ))
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(sales)
    }

    /// Highest persisted sale number carrying the given day prefix.
    ///
    /// Lexicographic DESC is numeric DESC here because the sequence suffix
    /// is fixed-width. Runs inside the sale transaction so the generated
    /// number and the insert see the same snapshot.
    pub async fn latest_number_with_prefix<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        prefix: &str,
    ) -> DbResult<Option<String>> {
        let pattern = format!("{}%", prefix);

        let number: Option<String> = sqlx::query_scalar(
            r#"
            SELECT sale_number FROM sales
            WHERE sale_number LIKE ?1
            ORDER BY sale_number DESC
            LIMIT 1
            "#,
        )
        .bind(pattern)
        .fetch_optional(executor)
        .await?;

        Ok(number)
    }

    // =========================================================================
    // Writes (transaction-composed by the engine)
    // =========================================================================

    /// Inserts a sale row.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` on a sale_number collision; the
    ///   engine retries the whole transaction with a fresh number
    pub async fn insert_sale<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        sale: &Sale,
    ) -> DbResult<()> {
        debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, status,
                total_cents, discount_cents, tax_cents,
                payment_method, payment_reference, notes,
                customer_id, employee_id, store_id, fulfillment_store_id,
                is_online_order, delivered_at,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.sale_number)
        .bind(sale.status)
        .bind(sale.total_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.payment_method)
        .bind(&sale.payment_reference)
        .bind(&sale.notes)
        .bind(&sale.customer_id)
        .bind(&sale.employee_id)
        .bind(&sale.store_id)
        .bind(&sale.fulfillment_store_id)
        .bind(sale.is_online_order)
        .bind(sale.delivered_at)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Inserts a sale item.
    ///
    /// ## Snapshot Pattern
    /// Name, unit price, and cost are frozen copies; later product edits
    /// never change a persisted item or its profit.
    pub async fn insert_item<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        item: &SaleItem,
    ) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, product_id = %item.product_id, "Inserting sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, name_snapshot,
                quantity, unit_price_cents, total_cents,
                cost_price_cents, profit_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_cents)
        .bind(item.cost_price_cents)
        .bind(item.profit_cents)
        .bind(item.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Persists the mutable sale fields after the transition table (and
    /// authorization) have approved the change.
    pub async fn apply_update<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        sale: &Sale,
    ) -> DbResult<()> {
        debug!(id = %sale.id, status = %sale.status, "Updating sale");

        sqlx::query(
            r#"
            UPDATE sales SET
                status = ?2,
                payment_reference = ?3,
                notes = ?4,
                delivered_at = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&sale.id)
        .bind(sale.status)
        .bind(&sale.payment_reference)
        .bind(&sale.notes)
        .bind(sale.delivered_at)
        .bind(sale.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}
