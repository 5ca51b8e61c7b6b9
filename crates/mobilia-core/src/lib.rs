//! # mobilia-core: Pure Business Logic for Mobilia
//!
//! This crate is the **heart** of the Mobilia sale/inventory engine. It
//! contains all business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mobilia Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  HTTP / Back-office surface                     │   │
//! │  │        (external collaborator, not part of this workspace)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  mobilia-engine (services)                      │   │
//! │  │    SaleService, FlashSaleService, NotificationPort             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mobilia-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │sale_number │  │flash_sale │  │   │
//! │  │   │  status   │  │   cart    │  │            │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, StoreInventory, Actor)
//! - [`status`] - Sale status state machine with an explicit transition table
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Sale creation request shape and validation
//! - [`sale_number`] - Daily-sequential human-readable sale numbers
//! - [`flash_sale`] - Flash-sale window math and validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic - same input = same output ("now" is
//!    always a parameter, never read from the clock here)
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod flash_sale;
pub mod money;
pub mod sale_number;
pub mod status;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLine, CreateSaleRequest};
pub use error::{CoreError, ValidationError};
pub use flash_sale::FlashSaleWindow;
pub use money::Money;
pub use status::SaleStatus;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts and keeps the sale transaction (N inventory
/// updates) inside its time budget.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
