//! # Sale Transaction Engine
//!
//! Creates, reads, updates, and cancels sales. The single writer of stock
//! quantities in the whole system.
//!
//! ## Creation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  create_sale (one transaction)                          │
//! │                                                                         │
//! │  role gate → cart shape → customer exists                              │
//! │       │                                                                 │
//! │       ▼  BEGIN (15s budget, retried on sale-number collision)          │
//! │  per line: product exists, availability at fulfillment store           │
//! │  compose sale_number from today's highest → INSERT sale (UNIQUE)       │
//! │  per line: INSERT item with name/price/cost/profit snapshots           │
//! │  per line: guarded ledger decrement + aggregate recompute              │
//! │            (no ledger row: guarded direct decrement)                   │
//! │  collect resulting stock levels                                         │
//! │       ▼  COMMIT                                                         │
//! │  fan out: new-sale, then out-of-stock / low-stock per product          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before COMMIT rolls the whole transaction back: no sale row,
//! no items, no stock movement. Notification failures after COMMIT are
//! logged and swallowed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use mobilia_core::{
    sale_number, Actor, CoreError, CreateSaleRequest, Money, PaymentMethod, Role, Sale, SaleItem,
    SaleStatus,
};
use mobilia_db::{generate_id, Database, DbError};

use crate::error::{EngineError, EngineResult};
use crate::notify::{
    NewSaleEvent, LowStockEvent, NotificationPort, OrderDeliveredEvent, OrderStatusEvent,
    OutOfStockEvent,
};

/// Wall-clock budget for one sale transaction, begin to commit.
const TX_BUDGET: Duration = Duration::from_secs(15);

/// How many times a sale-number collision is retried before giving up.
const MAX_NUMBER_RETRIES: u32 = 3;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Mutable-field patch for an existing sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleRequest {
    /// New status token ("completed", "shipped", ...). Parsed and checked
    /// against the transition table; absent means "leave unchanged".
    pub status: Option<String>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

/// A sale with its items and the display names the caller renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetails {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub customer_name: Option<String>,
    pub employee_name: Option<String>,
    pub store_name: Option<String>,
}

/// Stock level of one product right after the transaction, captured inside
/// it so the alert decision and the decrement see the same state.
#[derive(Debug, Clone)]
struct StockSnapshot {
    product_id: String,
    product_name: String,
    stock: i64,
    min_stock: i64,
}

// =============================================================================
// Sale Service
// =============================================================================

/// The sale transaction engine.
///
/// Cheap to clone; clones share the pool and the notification port.
#[derive(Clone)]
pub struct SaleService {
    db: Database,
    notifier: Arc<dyn NotificationPort>,
}

impl SaleService {
    pub fn new(db: Database, notifier: Arc<dyn NotificationPort>) -> Self {
        SaleService { db, notifier }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a sale atomically: validation, sale + item inserts, stock
    /// decrements, and aggregate recompute all commit or all roll back.
    pub async fn create_sale(
        &self,
        req: CreateSaleRequest,
        actor: &Actor,
    ) -> EngineResult<SaleDetails> {
        if actor.role == Role::Customer {
            return Err(EngineError::forbidden("customers cannot create sales"));
        }
        req.validate()?;

        if let Some(customer_id) = &req.customer_id {
            self.db
                .users()
                .get_by_id(self.db.pool(), customer_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Customer", customer_id.as_str()))?;
        }

        self.db
            .users()
            .get_store(self.db.pool(), &req.store_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Store", req.store_id.as_str()))?;

        // One store for both the availability check and the decrement.
        let fulfillment_store = actor
            .store_id
            .clone()
            .unwrap_or_else(|| req.store_id.clone());

        let mut attempt = 0;
        let (sale_id, snapshots) = loop {
            attempt += 1;
            let outcome = timeout(
                TX_BUDGET,
                self.execute_create(&req, actor, &fulfillment_store),
            )
            .await;
            match outcome {
                Err(_) => return Err(EngineError::Timeout),
                Ok(Ok(created)) => break created,
                Ok(Err(EngineError::Conflict(reason))) if attempt < MAX_NUMBER_RETRIES => {
                    debug!(attempt, %reason, "Sale number collision, retrying");
                    continue;
                }
                Ok(Err(err)) => return Err(err),
            }
        };

        let details = self.load_details(&sale_id).await?;
        info!(
            sale_number = %details.sale.sale_number,
            total_cents = details.sale.total_cents,
            items = details.items.len(),
            "Sale created"
        );

        self.fan_out_created(&details, &snapshots, &fulfillment_store)
            .await;

        Ok(details)
    }

    /// The transactional body of create_sale. Dropping the transaction on
    /// any early return rolls everything back.
    async fn execute_create(
        &self,
        req: &CreateSaleRequest,
        actor: &Actor,
        fulfillment_store: &str,
    ) -> EngineResult<(String, Vec<StockSnapshot>)> {
        let products = self.db.products();
        let inventory = self.db.inventory();
        let sales = self.db.sales();

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        // Preconditions first, so a doomed cart fails before any write.
        let mut lines = Vec::with_capacity(req.items.len());
        for line in &req.items {
            let product = products
                .get_by_id(&mut *tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let available = match inventory
                .get(&mut *tx, &line.product_id, fulfillment_store)
                .await?
            {
                Some(row) => row.quantity,
                None => product.stock,
            };
            if available < line.quantity {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available,
                    requested: line.quantity,
                }
                .into());
            }
            lines.push((line, product));
        }

        let now = Utc::now();
        let prefix = sale_number::date_prefix(now.date_naive());
        let latest = sales.latest_number_with_prefix(&mut *tx, &prefix).await?;
        let number = sale_number::next_in_sequence(latest.as_deref(), &prefix);

        let sale = Sale {
            id: generate_id(),
            sale_number: number,
            status: SaleStatus::Pending,
            total_cents: req.total_cents,
            discount_cents: req.discount_cents,
            tax_cents: req.tax_cents,
            payment_method: PaymentMethod::from_token(&req.payment_method),
            payment_reference: req.payment_reference.clone(),
            notes: req.notes.clone(),
            customer_id: req.customer_id.clone(),
            employee_id: actor.id.clone(),
            store_id: req.store_id.clone(),
            fulfillment_store_id: fulfillment_store.to_string(),
            is_online_order: req.is_online_order,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = sales.insert_sale(&mut *tx, &sale).await {
            if err.is_unique_violation_on("sale_number") {
                return Err(EngineError::Conflict(format!(
                    "sale number {} already taken",
                    sale.sale_number
                )));
            }
            return Err(err.into());
        }

        // Item inserts: name, price, and cost frozen now.
        for (line, product) in &lines {
            let unit_price = Money::from_cents(line.unit_price_cents);
            let profit = Money::line_profit(unit_price, product.cost(), line.quantity);
            let item = SaleItem {
                id: generate_id(),
                sale_id: sale.id.clone(),
                product_id: product.id.clone(),
                name_snapshot: product.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                total_cents: unit_price.times(line.quantity).cents(),
                cost_price_cents: product.cost_cents,
                profit_cents: profit.map(|p| p.cents()),
                created_at: now,
            };
            sales.insert_item(&mut *tx, &item).await?;
        }

        // Stock movement: ledger row when one exists, aggregate otherwise.
        // The guarded UPDATE is the actual no-oversell enforcement; the
        // precondition check above only produces the friendly message.
        for (line, product) in &lines {
            let has_ledger_row = inventory
                .get(&mut *tx, &product.id, fulfillment_store)
                .await?
                .is_some();

            let decremented = if has_ledger_row {
                let ok = inventory
                    .decrement_guarded(&mut *tx, &product.id, fulfillment_store, line.quantity)
                    .await?;
                if ok {
                    products
                        .recompute_stock_from_ledger(&mut *tx, &product.id)
                        .await?;
                }
                ok
            } else {
                products
                    .decrement_stock_direct(&mut *tx, &product.id, line.quantity)
                    .await?
            };

            if !decremented {
                let available = if has_ledger_row {
                    inventory
                        .get(&mut *tx, &product.id, fulfillment_store)
                        .await?
                        .map(|row| row.quantity)
                        .unwrap_or(0)
                } else {
                    products
                        .get_by_id(&mut *tx, &product.id)
                        .await?
                        .map(|p| p.stock)
                        .unwrap_or(0)
                };
                return Err(CoreError::InsufficientStock {
                    name: product.name.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }
        }

        // Resulting levels, read inside the transaction so alerts match
        // exactly what was committed.
        let mut snapshots: Vec<StockSnapshot> = Vec::new();
        for (_, product) in &lines {
            if snapshots.iter().any(|s| s.product_id == product.id) {
                continue;
            }
            let current = products
                .get_by_id(&mut *tx, &product.id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(product.id.clone()))?;
            snapshots.push(StockSnapshot {
                product_id: current.id,
                product_name: current.name,
                stock: current.stock,
                min_stock: current.min_stock,
            });
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok((sale.id, snapshots))
    }

    /// Post-commit fan-out. Failures are logged, never propagated.
    async fn fan_out_created(
        &self,
        details: &SaleDetails,
        snapshots: &[StockSnapshot],
        store_id: &str,
    ) {
        let event = NewSaleEvent {
            sale_id: details.sale.id.clone(),
            sale_number: details.sale.sale_number.clone(),
            total_cents: details.sale.total_cents,
            store_id: details.sale.store_id.clone(),
            store_name: details.store_name.clone(),
            employee_id: details.sale.employee_id.clone(),
            customer_name: details.customer_name.clone(),
        };
        if let Err(err) = self.notifier.notify_new_sale(event).await {
            warn!(error = %err, "New-sale notification failed");
        }

        for snapshot in snapshots {
            let result = if snapshot.stock == 0 {
                self.notifier
                    .notify_out_of_stock(OutOfStockEvent {
                        product_id: snapshot.product_id.clone(),
                        product_name: snapshot.product_name.clone(),
                        store_id: store_id.to_string(),
                    })
                    .await
            } else if snapshot.stock <= snapshot.min_stock {
                self.notifier
                    .notify_low_stock(LowStockEvent {
                        product_id: snapshot.product_id.clone(),
                        product_name: snapshot.product_name.clone(),
                        stock: snapshot.stock,
                        min_stock: snapshot.min_stock,
                        store_id: store_id.to_string(),
                    })
                    .await
            } else {
                Ok(())
            };
            if let Err(err) = result {
                warn!(
                    product = %snapshot.product_name,
                    error = %err,
                    "Stock notification failed"
                );
            }
        }
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Loads one sale with items and display names.
    ///
    /// Customers may only read their own sales; staff need store access.
    pub async fn get_sale(&self, sale_id: &str, actor: &Actor) -> EngineResult<SaleDetails> {
        let details = self.load_details(sale_id).await?;

        let allowed = match actor.role {
            Role::Customer => details.sale.customer_id.as_deref() == Some(actor.id.as_str()),
            _ => actor.has_store_access(&details.sale.store_id),
        };
        if !allowed {
            return Err(EngineError::forbidden("no access to this sale"));
        }

        Ok(details)
    }

    /// Lists sales, newest first. Admins may scope to any store; other
    /// staff are always scoped to their own.
    pub async fn list_sales(
        &self,
        store_filter: Option<&str>,
        limit: u32,
        actor: &Actor,
    ) -> EngineResult<Vec<Sale>> {
        let scope = match actor.role {
            Role::Admin => store_filter,
            Role::Manager | Role::Employee => match actor.store_id.as_deref() {
                Some(own) => Some(own),
                None => return Err(EngineError::forbidden("no store assigned")),
            },
            Role::Customer => {
                return Err(EngineError::forbidden("customers list their own sales"))
            }
        };

        Ok(self.db.sales().list(scope, limit).await?)
    }

    /// Lists one customer's sales. Customers may only query themselves.
    pub async fn list_by_customer(
        &self,
        customer_id: &str,
        actor: &Actor,
    ) -> EngineResult<Vec<Sale>> {
        if actor.role == Role::Customer && actor.id != customer_id {
            return Err(EngineError::forbidden("customers list their own sales"));
        }
        Ok(self.db.sales().list_by_customer(customer_id).await?)
    }

    /// Lists sales created within `[start, end]`, with the same store
    /// scoping as [`Self::list_sales`].
    pub async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        store_filter: Option<&str>,
        actor: &Actor,
    ) -> EngineResult<Vec<Sale>> {
        if end < start {
            return Err(EngineError::Validation(
                "end date must not be before start date".to_string(),
            ));
        }
        let scope = match actor.role {
            Role::Admin => store_filter,
            Role::Manager | Role::Employee => match actor.store_id.as_deref() {
                Some(own) => Some(own),
                None => return Err(EngineError::forbidden("no store assigned")),
            },
            Role::Customer => {
                return Err(EngineError::forbidden("customers list their own sales"))
            }
        };

        Ok(self
            .db
            .sales()
            .list_by_date_range(start, end, scope)
            .await?)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Applies a patch to a sale: status (via the transition table),
    /// payment reference, notes.
    pub async fn update_sale(
        &self,
        sale_id: &str,
        patch: UpdateSaleRequest,
        actor: &Actor,
    ) -> EngineResult<Sale> {
        if actor.role == Role::Customer {
            return Err(EngineError::forbidden("customers cannot update sales"));
        }

        let sales = self.db.sales();

        // Read, validate, and write inside one transaction so a concurrent
        // cancellation cannot commit between the read and the write and be
        // overwritten by a patch validated against the stale status.
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let sale = sales
            .get_by_id(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if !actor.has_store_access(&sale.store_id) {
            return Err(EngineError::forbidden("no access to this sale"));
        }

        let mut updated = sale.clone();
        let mut changed_to: Option<SaleStatus> = None;

        if let Some(token) = &patch.status {
            let new_status: SaleStatus = token.parse().map_err(EngineError::from)?;
            if new_status != sale.status {
                if !sale.status.can_transition_to(new_status) {
                    return Err(CoreError::IllegalTransition {
                        sale_id: sale.id.clone(),
                        from: sale.status.to_string(),
                        to: new_status.to_string(),
                    }
                    .into());
                }
                updated.status = new_status;
                changed_to = Some(new_status);
                // Completing an online order is the moment of delivery.
                if new_status == SaleStatus::Completed && sale.is_online_order {
                    updated.delivered_at = Some(Utc::now());
                }
            }
        }
        if patch.payment_reference.is_some() {
            updated.payment_reference = patch.payment_reference;
        }
        if patch.notes.is_some() {
            updated.notes = patch.notes;
        }
        updated.updated_at = Utc::now();

        sales.apply_update(&mut *tx, &updated).await?;
        tx.commit().await.map_err(DbError::from)?;
        info!(sale_number = %updated.sale_number, status = %updated.status, "Sale updated");

        if let (Some(new_status), Some(customer_id)) = (changed_to, updated.customer_id.clone()) {
            self.fan_out_status(&updated, new_status, &customer_id).await;
        }

        Ok(updated)
    }

    /// Cancels a sale with stock restitution. Admin-only; the sale row is
    /// kept, only its status changes.
    pub async fn cancel_sale(&self, sale_id: &str, actor: &Actor) -> EngineResult<Sale> {
        if actor.role != Role::Admin {
            return Err(EngineError::forbidden("only admins cancel sales"));
        }

        let cancelled = match timeout(TX_BUDGET, self.execute_cancel(sale_id)).await {
            Err(_) => return Err(EngineError::Timeout),
            Ok(result) => result?,
        };
        info!(sale_number = %cancelled.sale_number, "Sale cancelled, stock restored");

        if let Some(customer_id) = cancelled.customer_id.clone() {
            self.fan_out_status(&cancelled, SaleStatus::Cancelled, &customer_id)
                .await;
        }

        Ok(cancelled)
    }

    /// The transactional body of cancel_sale: restitution exactly reverses
    /// the creation decrement by crediting the recorded fulfillment store's
    /// ledger row when one exists and the aggregate otherwise.
    async fn execute_cancel(&self, sale_id: &str) -> EngineResult<Sale> {
        let products = self.db.products();
        let inventory = self.db.inventory();
        let sales = self.db.sales();

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let sale = sales
            .get_by_id(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if !sale.status.can_transition_to(SaleStatus::Cancelled) {
            return Err(CoreError::IllegalTransition {
                sale_id: sale.id.clone(),
                from: sale.status.to_string(),
                to: SaleStatus::Cancelled.to_string(),
            }
            .into());
        }

        let items = sales.get_items(&mut *tx, sale_id).await?;
        for item in &items {
            let credited_ledger = inventory
                .increment(
                    &mut *tx,
                    &item.product_id,
                    &sale.fulfillment_store_id,
                    item.quantity,
                )
                .await?;
            if credited_ledger {
                products
                    .recompute_stock_from_ledger(&mut *tx, &item.product_id)
                    .await?;
            } else {
                products
                    .increment_stock_direct(&mut *tx, &item.product_id, item.quantity)
                    .await?;
            }
        }

        let mut cancelled = sale;
        cancelled.status = SaleStatus::Cancelled;
        cancelled.updated_at = Utc::now();
        sales.apply_update(&mut *tx, &cancelled).await?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(cancelled)
    }

    /// Customer-facing status notification; delivered gets its own event.
    async fn fan_out_status(&self, sale: &Sale, new_status: SaleStatus, customer_id: &str) {
        let result = if new_status == SaleStatus::Delivered {
            self.notifier
                .notify_order_delivered(OrderDeliveredEvent {
                    customer_id: customer_id.to_string(),
                    sale_id: sale.id.clone(),
                    sale_number: sale.sale_number.clone(),
                })
                .await
        } else {
            self.notifier
                .notify_order_status_changed(OrderStatusEvent {
                    customer_id: customer_id.to_string(),
                    sale_id: sale.id.clone(),
                    sale_number: sale.sale_number.clone(),
                    new_status,
                })
                .await
        };
        if let Err(err) = result {
            warn!(sale_number = %sale.sale_number, error = %err, "Status notification failed");
        }
    }

    // =========================================================================
    // Shared
    // =========================================================================

    /// Loads a sale with items and the names joined for display.
    async fn load_details(&self, sale_id: &str) -> EngineResult<SaleDetails> {
        let sales = self.db.sales();
        let users = self.db.users();
        let pool = self.db.pool();

        let sale = sales
            .get_by_id(pool, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        let items = sales.get_items(pool, sale_id).await?;

        let customer_name = match &sale.customer_id {
            Some(id) => users.get_by_id(pool, id).await?.map(|u| u.name),
            None => None,
        };
        let employee_name = users
            .get_by_id(pool, &sale.employee_id)
            .await?
            .map(|u| u.name);
        let store_name = users.get_store(pool, &sale.store_id).await?.map(|s| s.name);

        Ok(SaleDetails {
            sale,
            items,
            customer_name,
            employee_name,
            store_name,
        })
    }
}
