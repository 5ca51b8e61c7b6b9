//! # mobilia-db: Database Layer
//!
//! SQLite persistence for the Mobilia sale/inventory engine.
//!
//! ## Design
//! - [`pool`] owns connection-pool creation (WAL mode, foreign keys) and
//!   the [`Database`] handle that hands out repositories.
//! - [`migrations`] embeds the SQL schema from `migrations/sqlite/`.
//! - [`repository`] contains one repository per aggregate. Read methods run
//!   against the pool; transaction-participating methods take an
//!   `impl Executor` so the engine composes them inside one transaction.
//! - [`error`] maps sqlx failures (UNIQUE / FK violations, pool timeouts)
//!   into a typed [`DbError`].

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::generate_id;
pub use repository::inventory::InventoryRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
