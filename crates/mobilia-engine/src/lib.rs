//! # mobilia-engine: Transactional Services
//!
//! The service layer of the Mobilia sale/inventory engine. Everything that
//! must happen atomically happens here, composed from mobilia-core rules
//! and mobilia-db repositories.
//!
//! ## Services
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        mobilia-engine                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  create / get / list / update / cancel           │
//! │  │   SaleService    │  one SQLite transaction per mutation,            │
//! │  │                  │  15s budget, sale-number retry loop              │
//! │  └────────┬─────────┘                                                  │
//! │           │ post-commit                                                │
//! │  ┌────────▼─────────┐  new-sale, low-stock, out-of-stock,              │
//! │  │ NotificationPort │  order-status, order-delivered                   │
//! │  │  (async trait)   │  failures logged, never propagated               │
//! │  └──────────────────┘                                                  │
//! │                                                                         │
//! │  ┌──────────────────┐  schedule / remove, single-active invariant      │
//! │  │ FlashSaleService │  enforced inside the scheduling transaction      │
//! │  └──────────────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers see only [`EngineError`] kinds; storage detail never leaks.

pub mod error;
pub mod flash_sale_service;
pub mod notify;
pub mod sale_service;

pub use error::{EngineError, EngineResult};
pub use flash_sale_service::FlashSaleService;
pub use notify::{
    LowStockEvent, NewSaleEvent, NotificationPort, NotifyError, OrderDeliveredEvent,
    OrderStatusEvent, OutOfStockEvent, TracingNotifier,
};
pub use sale_service::{SaleDetails, SaleService, UpdateSaleRequest};
