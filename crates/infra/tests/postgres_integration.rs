//! PostgreSQL store tests. Skipped unless `DATABASE_URL` points at a scratch database.
//!
//! Orders reference `retail_test_users`, created here before migrating.

use std::sync::Mutex;
use std::time::Duration;

use retail_catalog::{
    NewCategory, NewParameter, NewProduct, NewProductInfo, NewProductParameter, NewShop,
    ProductInfo, ProductInfoPatch,
};
use retail_core::{Constraint, ListOrder, UserId};
use retail_infra::{
    PostgresStore, RetailStore, SchemaConfig, StoreConfig, StoreError, Write, WriteBatch,
};
use retail_orders::{NewOrder, NewOrderItem, OrderItemPatch, OrderPatch, OrderStatus};

const USERS: &str = "retail_test_users";

static MIGRATED: Mutex<bool> = Mutex::new(false);

async fn store() -> Option<PostgresStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let store = PostgresStore::connect(&StoreConfig::new(url))
        .await
        .expect("connect");

    let mut migrated = MIGRATED.lock().unwrap_or_else(|e| e.into_inner());
    if !*migrated {
        sqlx::raw_sql(&format!(
            "CREATE TABLE IF NOT EXISTS {USERS} (id UUID PRIMARY KEY)"
        ))
        .execute(store.pool())
        .await
        .expect("create users table");
        store
            .migrate(&SchemaConfig::new(USERS, "id").unwrap())
            .await
            .expect("migrate");
        *migrated = true;
    }
    Some(store)
}

async fn user(store: &PostgresStore) -> UserId {
    let id = UserId::new();
    sqlx::query(&format!("INSERT INTO {USERS} (id) VALUES ($1)"))
        .bind(id.as_uuid())
        .execute(store.pool())
        .await
        .expect("insert user");
    id
}

/// ACME / Tools / Hammer with one listing.
async fn listing(store: &PostgresStore) -> ProductInfo {
    let shop = store.insert_shop(NewShop::new("ACME")).await.unwrap();
    let category = store
        .insert_category(NewCategory::new("Tools").with_shops([shop.id]))
        .await
        .unwrap();
    let product = store
        .insert_product(NewProduct::new("Hammer", category.id))
        .await
        .unwrap();
    store
        .insert_product_info(
            NewProductInfo::new(product.id, shop.id, 4216292, "Hammer 500g")
                .quantity(10)
                .price(500)
                .price_rrc(700),
        )
        .await
        .unwrap()
}

macro_rules! require_db {
    () => {
        match store().await {
            Some(store) => store,
            None => {
                eprintln!("DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn duplicate_listing_maps_to_named_constraint() {
    let store = require_db!();
    let info = listing(&store).await;
    let err = store
        .insert_product_info(NewProductInfo::new(
            info.product_id,
            info.shop_id,
            4216292,
            "Hammer 500g",
        ))
        .await
        .unwrap_err();
    assert_eq!(err.constraint(), Some(Constraint::UniqueProductInfo), "{err}");
}

#[tokio::test]
async fn resent_insert_reports_the_taken_id() {
    let store = require_db!();
    let shop = NewShop::new("Initech");
    let stored = store.insert_shop(shop.clone()).await.unwrap();
    let err = store.insert_shop(shop).await.unwrap_err();
    match err {
        StoreError::AlreadyExists { entity, id } => {
            assert_eq!(entity, "shop");
            assert_eq!(id, stored.id.to_string());
        }
        other => panic!("expected AlreadyExists, got {other}"),
    }
}

#[tokio::test]
async fn basket_scenario() {
    let store = require_db!();
    let info = listing(&store).await;
    let user = user(&store).await;
    let order = store.insert_order(NewOrder::basket(user)).await.unwrap();
    assert_eq!(order.status, OrderStatus::Basket);

    let item = store
        .insert_order_item(NewOrderItem::new(order.id, info.id))
        .await
        .unwrap();
    let err = store
        .insert_order_item(NewOrderItem::new(order.id, info.id))
        .await
        .unwrap_err();
    assert_eq!(err.constraint(), Some(Constraint::UniqueOrderItem), "{err}");

    store
        .update_order_item(item.id, OrderItemPatch::default().quantity(3))
        .await
        .unwrap();
    let items = store
        .list_order_items(order.id, ListOrder::default())
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);

    let canceled = store
        .update_order(order.id, OrderPatch::default().status(OrderStatus::Canceled))
        .await
        .unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
}

#[tokio::test]
async fn order_for_unknown_user_is_rejected() {
    let store = require_db!();
    let err = store
        .insert_order(NewOrder::basket(UserId::new()))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            StoreError::ReferentialIntegrity {
                constraint: Constraint::OrderUser,
                ..
            }
        ),
        "{err}"
    );
}

#[tokio::test]
async fn order_timestamps() {
    let store = require_db!();
    let user = user(&store).await;
    let order = store.insert_order(NewOrder::basket(user)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let touched = store
        .update_order(order.id, OrderPatch::default())
        .await
        .unwrap();
    assert_eq!(touched.created_at, order.created_at);
    assert!(touched.updated_at > order.updated_at);
}

#[tokio::test]
async fn category_delete_cascades() {
    let store = require_db!();
    let info = listing(&store).await;
    let user = user(&store).await;
    let weight = store.insert_parameter(NewParameter::new("weight")).await.unwrap();
    let value = store
        .insert_product_parameter(NewProductParameter::new(info.id, weight.id, "500 g"))
        .await
        .unwrap();
    let order = store.insert_order(NewOrder::basket(user)).await.unwrap();
    let item = store
        .insert_order_item(NewOrderItem::new(order.id, info.id))
        .await
        .unwrap();

    let product = store.get_product(info.product_id).await.unwrap();
    store.delete_category(product.category_id).await.unwrap();

    assert!(matches!(
        store.get_product_info(info.id).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(store.get_product_parameter(value.id).await.is_err());
    assert!(store.get_order_item(item.id).await.is_err());
    assert!(store.get_order(order.id).await.is_ok());
    assert!(store.get_shop(info.shop_id).await.is_ok());
}

#[tokio::test]
async fn failing_batch_rolls_back() {
    let store = require_db!();
    let info = listing(&store).await;
    let user = user(&store).await;
    let order = NewOrder::basket(user);
    let batch = WriteBatch::new()
        .with(order.clone())
        .with(Write::UpdateProductInfo(
            info.id,
            ProductInfoPatch::default().quantity(9),
        ))
        .with(NewOrderItem::new(order.id, info.id))
        .with(NewOrderItem::new(order.id, info.id));

    let err = store.apply(batch).await.unwrap_err();
    assert_eq!(err.constraint(), Some(Constraint::UniqueOrderItem), "{err}");
    assert!(store.get_order(order.id).await.is_err());
    assert_eq!(store.get_product_info(info.id).await.unwrap().quantity, 10);
}

#[tokio::test]
async fn negative_price_is_a_validation_error() {
    let store = require_db!();
    let info = listing(&store).await;
    let err = store
        .update_product_info(info.id, ProductInfoPatch::default().price(-1))
        .await
        .unwrap_err();
    assert!(err.is_validation(), "{err}");
}
