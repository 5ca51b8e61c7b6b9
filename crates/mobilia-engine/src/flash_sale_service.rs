//! # Flash-Sale Scheduler
//!
//! Time-boxed discounts on single products, with the single-active
//! invariant enforced at write time: scheduling a window deactivates every
//! other product whose window overlaps it, inside the same transaction
//! that writes the new one. Two concurrent schedulers therefore cannot
//! leave two overlapping offers behind.
//!
//! Activation and expiry need no background job; "active" is derived at
//! read time from the persisted window.

use chrono::{DateTime, Utc};
use tracing::info;

use mobilia_core::{Actor, CoreError, FlashSaleWindow, Product, Role};
use mobilia_db::{Database, DbError};

use crate::error::{EngineError, EngineResult};

/// Schedules and removes flash-sale windows.
#[derive(Debug, Clone)]
pub struct FlashSaleService {
    db: Database,
}

impl FlashSaleService {
    pub fn new(db: Database) -> Self {
        FlashSaleService { db }
    }

    /// Schedules a flash sale on one product.
    ///
    /// ## Arguments
    /// * `discount_percent` - whole percent, exclusive 0..100
    /// * `starts_at` - window start, at most 60s in the past
    /// * `duration_hours` - positive; the window ends this many hours later
    ///
    /// ## Returns
    /// The product with its flash fields written, including the derived
    /// `flash_sale_price_cents`.
    pub async fn schedule(
        &self,
        product_id: &str,
        discount_percent: i64,
        starts_at: DateTime<Utc>,
        duration_hours: i64,
        actor: &Actor,
    ) -> EngineResult<Product> {
        if !matches!(actor.role, Role::Admin | Role::Manager) {
            return Err(EngineError::forbidden(
                "only admins and managers schedule flash sales",
            ));
        }

        let window = FlashSaleWindow::build(discount_percent, starts_at, duration_hours, Utc::now())?;

        let products = self.db.products();
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let product = products
            .get_by_id(&mut *tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        // Derived once, here; reads never recompute it.
        let flash_price = window.flash_price(product.price());

        let displaced = products
            .deactivate_overlapping_flash_sales(&mut *tx, window.starts_at, window.ends_at, product_id)
            .await?;

        products
            .set_flash_sale(
                &mut *tx,
                product_id,
                window.discount_percent,
                flash_price.cents(),
                window.starts_at,
                window.ends_at,
            )
            .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product = %product.name,
            discount_percent = window.discount_percent,
            flash_price_cents = flash_price.cents(),
            displaced,
            "Flash sale scheduled"
        );

        self.reload(product_id).await
    }

    /// Removes a product's flash sale, clearing all flash fields.
    pub async fn remove(&self, product_id: &str, actor: &Actor) -> EngineResult<Product> {
        if !matches!(actor.role, Role::Admin | Role::Manager) {
            return Err(EngineError::forbidden(
                "only admins and managers remove flash sales",
            ));
        }

        self.db
            .products()
            .clear_flash_sale(self.db.pool(), product_id)
            .await?;
        info!(product_id, "Flash sale removed");

        self.reload(product_id).await
    }

    /// The product whose flash window covers `now`, if any.
    ///
    /// At most one exists thanks to the write-time overlap deactivation.
    pub async fn active_flash_sale(&self, now: DateTime<Utc>) -> EngineResult<Option<Product>> {
        let flagged = self.db.products().list_flash_flagged().await?;
        Ok(flagged.into_iter().find(|p| p.flash_sale_active_at(now)))
    }

    async fn reload(&self, product_id: &str) -> EngineResult<Product> {
        self.db
            .products()
            .get_by_id(self.db.pool(), product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }
}
