//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Key Operations
//! - Lookups (by id, active listing)
//! - Aggregate-stock maintenance: `stock` is the cached SUM of the product's
//!   store-inventory rows and is recomputed inside the same transaction as
//!   every ledger write, so the cache can never drift silently
//! - Flash-sale field writes, including the overlap-deactivation scan

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mobilia_core::Product;

/// All product columns, in struct order. Kept in one place so every
/// `query_as` stays in sync with the `Product` FromRow derive.
const PRODUCT_COLUMNS: &str = r#"
    id, sku, name, description,
    price_cents, cost_cents, stock, min_stock,
    is_on_sale, is_flash_sale,
    flash_sale_discount_percent, flash_sale_price_cents,
    flash_sale_starts_at, flash_sale_ends_at,
    is_active, created_at, updated_at
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Gets a product by its ID.
    ///
    /// Takes an executor so the sale engine can read the cost/name snapshot
    /// source inside its transaction.
    pub async fn get_by_id<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products whose flash flag is set, regardless of window. The caller
    /// derives "active" from the window at read time.
    pub async fn list_flash_flagged(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_flash_sale = 1"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    // =========================================================================
    // Catalog Writes
    // =========================================================================

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description,
                price_cents, cost_cents, stock, min_stock,
                is_on_sale, is_flash_sale,
                flash_sale_discount_percent, flash_sale_price_cents,
                flash_sale_starts_at, flash_sale_ends_at,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.is_on_sale)
        .bind(product.is_flash_sale)
        .bind(product.flash_sale_discount_percent)
        .bind(product.flash_sale_price_cents)
        .bind(product.flash_sale_starts_at)
        .bind(product.flash_sale_ends_at)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's catalog fields (price, cost, thresholds, name).
    ///
    /// Flash-sale fields and `stock` are deliberately excluded: the former
    /// go through the scheduler, the latter through the ledger writes.
    pub async fn update_catalog_fields(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                cost_cents = ?6,
                min_stock = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.min_stock)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    // =========================================================================
    // Aggregate Stock
    // =========================================================================

    /// Recomputes the denormalized aggregate from the ledger.
    ///
    /// `stock` becomes the SUM of *all* the product's store-inventory rows,
    /// not a delta on the touched row. Must run in the same transaction as
    /// the ledger write it follows.
    pub async fn recompute_stock_from_ledger<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        product_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock = (
                    SELECT COALESCE(SUM(quantity), 0)
                    FROM store_inventory
                    WHERE product_id = ?1
                ),
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Guarded direct decrement of the aggregate, for products with no
    /// ledger row at the fulfillment store.
    ///
    /// ## Returns
    /// `false` when `stock < quantity` - the caller lost a race and must
    /// fail the sale rather than oversell.
    pub async fn decrement_stock_direct<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(id = %product_id, quantity, "Decrementing aggregate stock directly");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock = stock - ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Direct increment of the aggregate (cancellation restitution for
    /// products with no ledger row at the sale's store).
    pub async fn increment_stock_direct<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock = stock + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    // =========================================================================
    // Flash-Sale Fields
    // =========================================================================

    /// Writes the four flash-sale fields, sets the flag, and clears the
    /// mutually-exclusive regular-sale flag.
    pub async fn set_flash_sale<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        product_id: &str,
        discount_percent: i64,
        flash_price_cents: i64,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %product_id, discount_percent, "Setting flash sale");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                is_flash_sale = 1,
                is_on_sale = 0,
                flash_sale_discount_percent = ?2,
                flash_sale_price_cents = ?3,
                flash_sale_starts_at = ?4,
                flash_sale_ends_at = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(discount_percent)
        .bind(flash_price_cents)
        .bind(starts_at)
        .bind(ends_at)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Clears all five flash-sale fields.
    pub async fn clear_flash_sale<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        product_id: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                is_flash_sale = 0,
                flash_sale_discount_percent = NULL,
                flash_sale_price_cents = NULL,
                flash_sale_starts_at = NULL,
                flash_sale_ends_at = NULL,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Deactivates every *other* product whose flash window overlaps
    /// `[starts_at, ends_at)`.
    ///
    /// This is the write-time enforcement of the single-active invariant:
    /// it runs in the same transaction that writes the new window, so two
    /// concurrent schedulers cannot leave two overlapping offers behind.
    ///
    /// ## Returns
    /// Number of products deactivated.
    pub async fn deactivate_overlapping_flash_sales<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        except_product_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                is_flash_sale = 0,
                flash_sale_discount_percent = NULL,
                flash_sale_price_cents = NULL,
                flash_sale_starts_at = NULL,
                flash_sale_ends_at = NULL,
                updated_at = ?4
            WHERE is_flash_sale = 1
              AND id != ?1
              AND flash_sale_starts_at < ?3
              AND flash_sale_ends_at > ?2
            "#,
        )
        .bind(except_product_id)
        .bind(starts_at)
        .bind(ends_at)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
