//! # Repositories
//!
//! One repository per aggregate:
//!
//! - [`product`] - catalog products, flash-sale fields, aggregate stock
//! - [`inventory`] - the per-(product, store) stock ledger
//! - [`sale`] - sales and their owned sale items
//! - [`user`] - read-mostly user and store lookups
//!
//! ## Executor Pattern
//! Read paths that never need to join a transaction run against the pool.
//! Every method that participates in the sale transaction takes an
//! `impl Executor<'_, Database = Sqlite>` instead, so the engine can pass
//! either the pool or `&mut *tx` and compose all writes atomically.

pub mod inventory;
pub mod product;
pub mod sale;
pub mod user;

use uuid::Uuid;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
