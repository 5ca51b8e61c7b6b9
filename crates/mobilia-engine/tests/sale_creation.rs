//! Integration tests for the sale transaction engine: atomic creation,
//! stock movement, snapshots, sale numbers, and the post-commit fan-out.

mod common;

use std::sync::Arc;

use chrono::Utc;

use mobilia_core::{sale_number, Actor, Role};
use mobilia_engine::{EngineError, SaleService};

use common::*;

#[tokio::test]
async fn creates_sale_and_decrements_ledger_and_aggregate() {
    let ctx = setup().await;
    let table = seed_product(&ctx.db, "TBL-OAK", "Oak Dining Table", 10_000, Some(6_000), 10, 2)
        .await;
    seed_inventory(&ctx.db, &table.id, 10, 2).await;

    let req = sale_request(vec![line(&table.id, 3, 10_000)], 30_000);
    let details = ctx.sales.create_sale(req, &employee()).await.unwrap();

    assert_eq!(details.sale.total_cents, 30_000);
    assert_eq!(details.sale.status.as_str(), "pending");
    assert_eq!(details.sale.employee_id, EMPLOYEE);
    assert_eq!(details.store_name.as_deref(), Some("Mobilia Centro"));
    assert_eq!(details.employee_name.as_deref(), Some("Elisa Employee"));

    // One item with frozen name/price/cost and derived profit
    assert_eq!(details.items.len(), 1);
    let item = &details.items[0];
    assert_eq!(item.name_snapshot, "Oak Dining Table");
    assert_eq!(item.quantity, 3);
    assert_eq!(item.total_cents, 30_000);
    assert_eq!(item.cost_price_cents, Some(6_000));
    assert_eq!(item.profit_cents, Some(12_000));

    // Ledger row and aggregate both dropped by 3
    let row = ctx
        .db
        .inventory()
        .get(ctx.db.pool(), &table.id, STORE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.quantity, 7);
    let reloaded = ctx
        .db
        .products()
        .get_by_id(ctx.db.pool(), &table.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.stock, 7);

    assert_eq!(
        ctx.notifier.events(),
        vec![Recorded::NewSale {
            sale_number: details.sale.sale_number.clone()
        }]
    );
}

#[tokio::test]
async fn sale_numbers_are_daily_sequential() {
    let ctx = setup().await;
    let chair = seed_product(&ctx.db, "CHR-01", "Walnut Chair", 5_000, None, 20, 2).await;

    let first = ctx
        .sales
        .create_sale(sale_request(vec![line(&chair.id, 1, 5_000)], 5_000), &employee())
        .await
        .unwrap();
    let second = ctx
        .sales
        .create_sale(sale_request(vec![line(&chair.id, 1, 5_000)], 5_000), &employee())
        .await
        .unwrap();

    let prefix = sale_number::date_prefix(Utc::now().date_naive());
    assert_eq!(first.sale.sale_number, format!("{prefix}0001"));
    assert_eq!(second.sale.sale_number, format!("{prefix}0002"));
}

#[tokio::test]
async fn insufficient_stock_rolls_back_the_whole_cart() {
    let ctx = setup().await;
    let table = seed_product(&ctx.db, "TBL-01", "Pine Table", 8_000, None, 10, 2).await;
    let lamp = seed_product(&ctx.db, "LMP-01", "Brass Lamp", 3_000, None, 1, 0).await;
    seed_inventory(&ctx.db, &table.id, 10, 2).await;
    seed_inventory(&ctx.db, &lamp.id, 1, 0).await;

    // First line is satisfiable, second is not: nothing may be written.
    let req = sale_request(
        vec![line(&table.id, 2, 8_000), line(&lamp.id, 2, 3_000)],
        22_000,
    );
    let err = ctx.sales.create_sale(req, &employee()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Insufficient stock for Brass Lamp: available 1, requested 2"
    );

    // Full rollback: no sale, no stock movement
    assert!(ctx.sales.list_sales(None, 10, &admin()).await.unwrap().is_empty());
    let row = ctx
        .db
        .inventory()
        .get(ctx.db.pool(), &table.id, STORE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.quantity, 10);
    assert!(ctx.notifier.events().is_empty());
}

#[tokio::test]
async fn rejects_customers_unknown_customers_and_unknown_products() {
    let ctx = setup().await;
    let chair = seed_product(&ctx.db, "CHR-02", "Oak Chair", 4_000, None, 5, 1).await;

    let err = ctx
        .sales
        .create_sale(sale_request(vec![line(&chair.id, 1, 4_000)], 4_000), &customer())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let mut req = sale_request(vec![line(&chair.id, 1, 4_000)], 4_000);
    req.customer_id = Some("no-such-user".to_string());
    let err = ctx.sales.create_sale(req, &employee()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));

    let err = ctx
        .sales
        .create_sale(
            sale_request(vec![line("no-such-product", 1, 4_000)], 4_000),
            &employee(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn unknown_store_is_not_found_not_a_storage_error() {
    let ctx = setup().await;
    let chair = seed_product(&ctx.db, "CHR-04", "Ash Chair", 4_000, None, 5, 1).await;

    let mut req = sale_request(vec![line(&chair.id, 1, 4_000)], 4_000);
    req.store_id = "no-such-store".to_string();
    let err = ctx
        .sales
        .create_sale(req, &Actor::new(ADMIN, Role::Admin, None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn notification_failures_never_fail_the_sale() {
    let ctx = setup().await;
    // Same database, but every notification channel is down
    let deaf_sales = SaleService::new(ctx.db.clone(), Arc::new(FailingNotifier));
    let sofa = seed_product(&ctx.db, "SOF-09", "Velvet Sofa", 50_000, None, 2, 1).await;
    seed_inventory(&ctx.db, &sofa.id, 2, 1).await;

    // Sells out, so both the new-sale and the out-of-stock call fail
    let details = deaf_sales
        .create_sale(sale_request(vec![line(&sofa.id, 2, 50_000)], 100_000), &employee())
        .await
        .unwrap();

    // The commit stands: sale readable, stock decremented
    let kept = deaf_sales.get_sale(&details.sale.id, &admin()).await.unwrap();
    assert_eq!(kept.items[0].quantity, 2);
    let reloaded = ctx
        .db
        .products()
        .get_by_id(ctx.db.pool(), &sofa.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.stock, 0);
}

#[tokio::test]
async fn empty_cart_is_a_validation_error() {
    let ctx = setup().await;
    let err = ctx
        .sales
        .create_sale(sale_request(vec![], 0), &employee())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn aggregate_fallback_when_no_ledger_row_exists() {
    let ctx = setup().await;
    // Product without any store_inventory row: the aggregate is decremented
    // directly, still guarded against going below zero.
    let sofa = seed_product(&ctx.db, "SOF-01", "Linen Sofa", 50_000, None, 4, 1).await;

    ctx.sales
        .create_sale(sale_request(vec![line(&sofa.id, 4, 50_000)], 200_000), &employee())
        .await
        .unwrap();

    let reloaded = ctx
        .db
        .products()
        .get_by_id(ctx.db.pool(), &sofa.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.stock, 0);

    // Selling out emits the out-of-stock alert
    assert!(ctx.notifier.events().contains(&Recorded::OutOfStock {
        product_name: "Linen Sofa".to_string()
    }));

    let err = ctx
        .sales
        .create_sale(sale_request(vec![line(&sofa.id, 1, 50_000)], 50_000), &employee())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock { .. }));
}

#[tokio::test]
async fn low_stock_alert_fires_at_the_threshold() {
    let ctx = setup().await;
    let desk = seed_product(&ctx.db, "DSK-01", "Writing Desk", 12_000, None, 10, 3).await;
    seed_inventory(&ctx.db, &desk.id, 10, 3).await;

    // 10 → 3 = min_stock: low stock, not out of stock
    ctx.sales
        .create_sale(sale_request(vec![line(&desk.id, 7, 12_000)], 84_000), &employee())
        .await
        .unwrap();

    assert!(ctx.notifier.events().contains(&Recorded::LowStock {
        product_name: "Writing Desk".to_string(),
        stock: 3,
    }));
}

#[tokio::test]
async fn snapshots_survive_later_product_edits() {
    let ctx = setup().await;
    let mut table =
        seed_product(&ctx.db, "TBL-02", "Teak Table", 10_000, Some(6_000), 10, 2).await;
    seed_inventory(&ctx.db, &table.id, 10, 2).await;

    let details = ctx
        .sales
        .create_sale(sale_request(vec![line(&table.id, 2, 10_000)], 20_000), &employee())
        .await
        .unwrap();

    // Reprice and rename the product after the sale
    table.name = "Teak Table XL".to_string();
    table.price_cents = 15_000;
    table.cost_cents = Some(9_000);
    ctx.db.products().update_catalog_fields(&table).await.unwrap();

    let reloaded = ctx.sales.get_sale(&details.sale.id, &admin()).await.unwrap();
    let item = &reloaded.items[0];
    assert_eq!(item.name_snapshot, "Teak Table");
    assert_eq!(item.unit_price_cents, 10_000);
    assert_eq!(item.cost_price_cents, Some(6_000));
    // (100.00 − 60.00) × 2 = 80.00, unchanged by the repricing
    assert_eq!(item.profit_cents, Some(8_000));
}
