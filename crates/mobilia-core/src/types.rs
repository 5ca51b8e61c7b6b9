//! # Domain Types
//!
//! Core domain types for the Mobilia sale/inventory engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  StoreInventory │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  (product_id,   │       │
//! │  │  sku (business) │   │  sale_number    │   │   store_id)     │       │
//! │  │  price_cents    │   │  status         │   │  quantity       │       │
//! │  │  stock (aggr.)  │   │  total_cents    │   │  min_stock      │       │
//! │  │  flash fields   │   └────────┬────────┘   └─────────────────┘       │
//! │  └─────────────────┘            │                                      │
//! │                        ┌────────▼────────┐                             │
//! │                        │    SaleItem     │  price/cost snapshot,       │
//! │                        │  (owned rows)   │  frozen at sale time        │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (sku, sale_number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::SaleStatus;

// =============================================================================
// Role / Actor
// =============================================================================

/// The role a caller acts under.
///
/// Authentication itself is out of scope; the engine receives an [`Actor`]
/// as a capability value ("caller has role R") from the outer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Employee,
    /// Storefront customers. May read their own sales, never create or
    /// mutate them.
    Customer,
}

impl Role {
    /// Back-office roles that may operate the sale engine.
    #[inline]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Employee)
    }
}

/// The authenticated caller of an engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    /// The store this actor works at, when assigned. Admins typically have
    /// none; sale fulfillment prefers this over the request's store.
    pub store_id: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, store_id: Option<String>) -> Self {
        Actor {
            id: id.into(),
            role,
            store_id,
        }
    }

    /// Whether this actor may touch sales belonging to `store_id`.
    ///
    /// Admins see every store; other staff only their own.
    pub fn has_store_access(&self, store_id: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Manager | Role::Employee => {
                self.store_id.as_deref() == Some(store_id)
            }
            Role::Customer => false,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Canonical payment methods stored on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    BankTransfer,
}

impl PaymentMethod {
    /// Maps a caller-supplied lowercase token to the canonical enum value.
    ///
    /// Unrecognized input falls back to `Cash`. That fallback mirrors the
    /// storefront contract; tightening it to a validation error is tracked
    /// in DESIGN.md.
    pub fn from_token(token: &str) -> PaymentMethod {
        match token.trim().to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "credit" | "credit_card" | "card" => PaymentMethod::CreditCard,
            "debit" | "debit_card" => PaymentMethod::DebitCard,
            "pix" => PaymentMethod::Pix,
            "transfer" | "bank_transfer" => PaymentMethod::BankTransfer,
            _ => PaymentMethod::Cash,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// `stock` is the denormalized aggregate across stores. It is recomputed
/// transactionally from the store ledger on every write that touches a
/// ledger row, so the two can never diverge silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown in the storefront and in stock alerts.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Cost in cents, when known. Snapshotted onto sale items for profit.
    pub cost_cents: Option<i64>,

    /// Denormalized aggregate stock across all stores.
    pub stock: i64,

    /// Alert threshold: stock at or below this triggers a low-stock event.
    pub min_stock: i64,

    /// Regular-sale flag, mutually exclusive with `is_flash_sale`.
    pub is_on_sale: bool,

    /// Flash-sale flag. When true all four flash fields below are set.
    pub is_flash_sale: bool,

    /// Whole-percent discount of the flash sale (exclusive 0..100).
    pub flash_sale_discount_percent: Option<i64>,

    /// Discounted price in cents, derived once when the sale is scheduled.
    pub flash_sale_price_cents: Option<i64>,

    /// Start of the flash window (inclusive).
    pub flash_sale_starts_at: Option<DateTime<Utc>>,

    /// End of the flash window (inclusive at read time).
    pub flash_sale_ends_at: Option<DateTime<Utc>>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the cost as Money, when known.
    #[inline]
    pub fn cost(&self) -> Option<Money> {
        self.cost_cents.map(Money::from_cents)
    }

    /// Whether a flash sale is active on this product at `now`.
    ///
    /// Purely derived - never persisted as its own flag, so activation and
    /// expiry need no background job, only evaluation at read time.
    pub fn flash_sale_active_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_flash_sale {
            return false;
        }
        match (self.flash_sale_starts_at, self.flash_sale_ends_at) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }
}

// =============================================================================
// Store Inventory
// =============================================================================

/// Per-(product, store) stock ledger row. Unique per pair.
///
/// Created when a product is associated with a store (a seeding concern);
/// mutated exclusively by the sale engine (decrement on sale, increment on
/// cancellation restitution); never deleted during normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoreInventory {
    pub id: String,
    pub product_id: String,
    pub store_id: String,
    pub quantity: i64,
    pub min_stock: i64,
}

// =============================================================================
// Sale
// =============================================================================

/// A persisted sale.
///
/// Never physically deleted - removal is a status transition to Cancelled
/// with stock restitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Human-readable daily-sequential identifier, `YYYYMMDD####`. UNIQUE.
    pub sale_number: String,

    pub status: SaleStatus,

    pub total_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,

    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,

    /// Nullable - anonymous walk-in sales are permitted.
    pub customer_id: Option<String>,

    /// The authenticated actor who recorded the sale. Required.
    pub employee_id: String,

    pub store_id: String,

    /// The store whose stock this sale debited: the recording actor's own
    /// store when they had one, else `store_id`. Cancellation restitution
    /// credits exactly this store, so create + cancel conserves stock.
    pub fulfillment_store_id: String,

    /// Online orders get a delivered_at stamp when completed.
    pub is_online_order: bool,
    pub delivered_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold. Always > 0.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen, decoupled from the
    /// live product price).
    pub unit_price_cents: i64,
    /// Line total: `quantity × unit_price_cents`.
    pub total_cents: i64,
    /// Cost in cents at time of sale, when the product's cost was known.
    pub cost_price_cents: Option<i64>,
    /// Derived `(unit_price − cost) × quantity`, only when cost is known.
    pub profit_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// User / Store Lookups
// =============================================================================

/// A user record, read-only from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub store_id: Option<String>,
}

/// A store record, read-only from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Store {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
