//! Shared fixtures for the engine integration tests: an in-memory database,
//! seeded store/users/products, and a notifier double that records every
//! event for assertion.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use mobilia_core::{Actor, CartLine, CreateSaleRequest, Product, Role, SaleStatus, Store, User};
use mobilia_db::{generate_id, Database, DbConfig};
use mobilia_engine::{
    FlashSaleService, LowStockEvent, NewSaleEvent, NotificationPort, NotifyError,
    OrderDeliveredEvent, OrderStatusEvent, OutOfStockEvent, SaleService,
};

pub const STORE: &str = "store-1";
pub const EMPLOYEE: &str = "user-employee";
pub const MANAGER: &str = "user-manager";
pub const ADMIN: &str = "user-admin";
pub const CUSTOMER: &str = "user-customer";

// =============================================================================
// Recording Notifier
// =============================================================================

/// One recorded notification, flattened for easy matching.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    NewSale { sale_number: String },
    LowStock { product_name: String, stock: i64 },
    OutOfStock { product_name: String },
    StatusChanged { sale_id: String, new_status: SaleStatus },
    Delivered { sale_id: String },
}

/// Port double that records instead of delivering.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn record(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn notify_new_sale(&self, event: NewSaleEvent) -> Result<(), NotifyError> {
        self.record(Recorded::NewSale {
            sale_number: event.sale_number,
        });
        Ok(())
    }

    async fn notify_low_stock(&self, event: LowStockEvent) -> Result<(), NotifyError> {
        self.record(Recorded::LowStock {
            product_name: event.product_name,
            stock: event.stock,
        });
        Ok(())
    }

    async fn notify_out_of_stock(&self, event: OutOfStockEvent) -> Result<(), NotifyError> {
        self.record(Recorded::OutOfStock {
            product_name: event.product_name,
        });
        Ok(())
    }

    async fn notify_order_status_changed(
        &self,
        event: OrderStatusEvent,
    ) -> Result<(), NotifyError> {
        self.record(Recorded::StatusChanged {
            sale_id: event.sale_id,
            new_status: event.new_status,
        });
        Ok(())
    }

    async fn notify_order_delivered(&self, event: OrderDeliveredEvent) -> Result<(), NotifyError> {
        self.record(Recorded::Delivered {
            sale_id: event.sale_id,
        });
        Ok(())
    }
}

/// Port double whose every channel is down.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl NotificationPort for FailingNotifier {
    async fn notify_new_sale(&self, _event: NewSaleEvent) -> Result<(), NotifyError> {
        Err(NotifyError("channel down".to_string()))
    }

    async fn notify_low_stock(&self, _event: LowStockEvent) -> Result<(), NotifyError> {
        Err(NotifyError("channel down".to_string()))
    }

    async fn notify_out_of_stock(&self, _event: OutOfStockEvent) -> Result<(), NotifyError> {
        Err(NotifyError("channel down".to_string()))
    }

    async fn notify_order_status_changed(
        &self,
        _event: OrderStatusEvent,
    ) -> Result<(), NotifyError> {
        Err(NotifyError("channel down".to_string()))
    }

    async fn notify_order_delivered(
        &self,
        _event: OrderDeliveredEvent,
    ) -> Result<(), NotifyError> {
        Err(NotifyError("channel down".to_string()))
    }
}

// =============================================================================
// Test Context
// =============================================================================

pub struct TestContext {
    pub db: Database,
    pub sales: SaleService,
    pub flash: FlashSaleService,
    pub notifier: Arc<RecordingNotifier>,
}

/// Fresh in-memory database with one store, one user per role, and the
/// services wired to a recording notifier.
pub async fn setup() -> TestContext {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let sales = SaleService::new(db.clone(), notifier.clone());
    let flash = FlashSaleService::new(db.clone());

    let users = db.users();
    users
        .insert_store(&Store {
            id: STORE.to_string(),
            name: "Mobilia Centro".to_string(),
        })
        .await
        .unwrap();
    for (id, name, role) in [
        (ADMIN, "Ana Admin", Role::Admin),
        (MANAGER, "Marcos Manager", Role::Manager),
        (EMPLOYEE, "Elisa Employee", Role::Employee),
        (CUSTOMER, "Carla Customer", Role::Customer),
    ] {
        let store_id = match role {
            Role::Admin | Role::Customer => None,
            _ => Some(STORE.to_string()),
        };
        users
            .insert_user(&User {
                id: id.to_string(),
                name: name.to_string(),
                role,
                store_id,
            })
            .await
            .unwrap();
    }

    TestContext {
        db,
        sales,
        flash,
        notifier,
    }
}

/// Adds a second store plus an employee assigned to it, for cross-store
/// fulfillment scenarios. Returns the employee's actor.
pub async fn seed_second_store(db: &Database, store_id: &str, employee_id: &str) -> Actor {
    let users = db.users();
    users
        .insert_store(&Store {
            id: store_id.to_string(),
            name: "Mobilia Norte".to_string(),
        })
        .await
        .unwrap();
    users
        .insert_user(&User {
            id: employee_id.to_string(),
            name: "Nina Norte".to_string(),
            role: Role::Employee,
            store_id: Some(store_id.to_string()),
        })
        .await
        .unwrap();
    Actor::new(employee_id, Role::Employee, Some(store_id.to_string()))
}

/// Inserts a product with the given price/cost and aggregate stock.
pub async fn seed_product(
    db: &Database,
    sku: &str,
    name: &str,
    price_cents: i64,
    cost_cents: Option<i64>,
    stock: i64,
    min_stock: i64,
) -> Product {
    let now = Utc::now();
    let product = Product {
        id: generate_id(),
        sku: sku.to_string(),
        name: name.to_string(),
        description: None,
        price_cents,
        cost_cents,
        stock,
        min_stock,
        is_on_sale: false,
        is_flash_sale: false,
        flash_sale_discount_percent: None,
        flash_sale_price_cents: None,
        flash_sale_starts_at: None,
        flash_sale_ends_at: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}

/// Creates a ledger row for the default store.
pub async fn seed_inventory(db: &Database, product_id: &str, quantity: i64, min_stock: i64) {
    db.inventory()
        .insert(product_id, STORE, quantity, min_stock)
        .await
        .unwrap();
}

/// A cash sale request for the default store.
pub fn sale_request(items: Vec<CartLine>, total_cents: i64) -> CreateSaleRequest {
    CreateSaleRequest {
        customer_id: None,
        store_id: STORE.to_string(),
        payment_method: "cash".to_string(),
        payment_reference: None,
        total_cents,
        discount_cents: 0,
        tax_cents: 0,
        notes: None,
        is_online_order: false,
        items,
    }
}

pub fn admin() -> Actor {
    Actor::new(ADMIN, Role::Admin, None)
}

pub fn manager() -> Actor {
    Actor::new(MANAGER, Role::Manager, Some(STORE.to_string()))
}

pub fn employee() -> Actor {
    Actor::new(EMPLOYEE, Role::Employee, Some(STORE.to_string()))
}

pub fn customer() -> Actor {
    Actor::new(CUSTOMER, Role::Customer, None)
}

pub fn line(product_id: &str, quantity: i64, unit_price_cents: i64) -> CartLine {
    CartLine {
        product_id: product_id.to_string(),
        quantity,
        unit_price_cents,
    }
}
