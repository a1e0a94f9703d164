//! Scenario tests for the retail schema, run against the in-memory store.
//!
//! Verifies:
//! - Named uniqueness and foreign-key constraints reject offending writes
//! - Deletes cascade through the catalog and order tables
//! - Write batches are all-or-nothing
//! - Order timestamps and list orderings behave as documented

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use retail_catalog::{
        Category, CategorySort, NewCategory, NewParameter, NewProduct, NewProductInfo,
        NewProductParameter, NewShop, Product, ProductInfo, ProductInfoFilter, ProductInfoPatch,
        ProductInfoSort, ProductParameterPatch, ProductParameterSort, ProductPatch, Shop,
        ShopPatch, ShopSort,
    };
    use retail_core::{
        CategoryId, Constraint, Direction, ListOrder, OrderId, ProductInfoId, ShopId, UserId,
    };
    use retail_orders::{
        NewOrder, NewOrderItem, OrderItemPatch, OrderPatch, OrderSort, OrderStatus,
    };

    use crate::store::{InMemoryStore, RetailStore, StoreError, Write, WriteBatch, Written};

    /// ACME sells Hammer (category Tools) as listing 4216292.
    struct Fixture {
        store: InMemoryStore,
        shop: Shop,
        category: Category,
        product: Product,
        listing: ProductInfo,
        user: UserId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let shop = store
            .insert_shop(NewShop::new("ACME").with_url("https://acme.example"))
            .await
            .unwrap();
        let category = store
            .insert_category(NewCategory::new("Tools").with_shops([shop.id]))
            .await
            .unwrap();
        let product = store
            .insert_product(NewProduct::new("Hammer", category.id))
            .await
            .unwrap();
        let listing = store
            .insert_product_info(
                NewProductInfo::new(product.id, shop.id, 4216292, "Hammer 500g")
                    .quantity(10)
                    .price(500)
                    .price_rrc(700),
            )
            .await
            .unwrap();
        let user = UserId::new();
        store.register_user(user).unwrap();
        Fixture {
            store,
            shop,
            category,
            product,
            listing,
            user,
        }
    }

    fn assert_constraint(result: Result<impl std::fmt::Debug, StoreError>, expected: Constraint) {
        let err = result.unwrap_err();
        assert_eq!(err.constraint(), Some(expected), "{err}");
    }

    #[tokio::test]
    async fn duplicate_listing_is_rejected() {
        let f = fixture().await;
        let duplicate = f
            .store
            .insert_product_info(NewProductInfo::new(
                f.product.id,
                f.shop.id,
                4216292,
                "Hammer 500g (again)",
            ))
            .await;
        assert!(matches!(
            duplicate,
            Err(StoreError::UniqueViolation {
                constraint: Constraint::UniqueProductInfo,
                ..
            })
        ));

        // A different external id is a separate listing.
        f.store
            .insert_product_info(NewProductInfo::new(f.product.id, f.shop.id, 4216293, "Hammer 800g"))
            .await
            .unwrap();
        let listings = f
            .store
            .list_product_infos(ProductInfoFilter::product(f.product.id), ListOrder::default())
            .await
            .unwrap();
        assert_eq!(listings.len(), 2);
    }

    #[tokio::test]
    async fn listing_update_into_existing_triple_is_rejected() {
        let f = fixture().await;
        let other = f
            .store
            .insert_product_info(NewProductInfo::new(f.product.id, f.shop.id, 1, "Hammer 800g"))
            .await
            .unwrap();
        assert_constraint(
            f.store
                .update_product_info(other.id, ProductInfoPatch::default().external_id(4216292))
                .await,
            Constraint::UniqueProductInfo,
        );
        assert_eq!(f.store.get_product_info(other.id).await.unwrap(), other);
    }

    #[tokio::test]
    async fn duplicate_listing_parameter_is_rejected() {
        let f = fixture().await;
        let weight = f.store.insert_parameter(NewParameter::new("weight")).await.unwrap();
        let value = f
            .store
            .insert_product_parameter(NewProductParameter::new(f.listing.id, weight.id, "500 g"))
            .await
            .unwrap();
        assert_constraint(
            f.store
                .insert_product_parameter(NewProductParameter::new(f.listing.id, weight.id, "0.5 kg"))
                .await,
            Constraint::UniqueProductParameter,
        );

        // Changing the value in place is the supported path.
        let updated = f
            .store
            .update_product_parameter(value.id, ProductParameterPatch::default().value("0.5 kg"))
            .await
            .unwrap();
        assert_eq!(updated.value, "0.5 kg");
    }

    #[tokio::test]
    async fn basket_item_quantity_is_updated_in_place() {
        let f = fixture().await;
        let order = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        assert_eq!(order.status, OrderStatus::Basket);

        let item = f
            .store
            .insert_order_item(NewOrderItem::new(order.id, f.listing.id))
            .await
            .unwrap();
        assert_eq!(item.quantity, 1);

        assert_constraint(
            f.store
                .insert_order_item(NewOrderItem::new(order.id, f.listing.id).quantity(2))
                .await,
            Constraint::UniqueOrderItem,
        );

        let item = f
            .store
            .update_order_item(item.id, OrderItemPatch::default().quantity(3))
            .await
            .unwrap();
        assert_eq!(item.quantity, 3);

        let items = f.store.list_order_items(order.id, ListOrder::default()).await.unwrap();
        assert_eq!(items, vec![item]);
    }

    #[tokio::test]
    async fn zero_quantity_item_is_rejected() {
        let f = fixture().await;
        let order = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        let err = f
            .store
            .insert_order_item(NewOrderItem::new(order.id, f.listing.id).quantity(0))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn orders_can_be_canceled_from_any_open_status() {
        let f = fixture().await;
        for status in OrderStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            let order = f
                .store
                .insert_order(NewOrder::basket(f.user).status(status))
                .await
                .unwrap();
            let canceled = f
                .store
                .update_order(order.id, OrderPatch::default().status(OrderStatus::Canceled))
                .await
                .unwrap();
            assert_eq!(canceled.status, OrderStatus::Canceled);
        }
    }

    #[tokio::test]
    async fn raw_status_updates_persist_only_listed_names() {
        async fn set_status(f: &Fixture, id: OrderId, raw: &str) -> Result<OrderStatus, StoreError> {
            let patch = OrderPatch::parse_status(raw)?;
            Ok(f.store.update_order(id, patch).await?.status)
        }

        let f = fixture().await;
        let order = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        assert_eq!(set_status(&f, order.id, "new").await.unwrap(), OrderStatus::New);

        for raw in ["shipped", "NEW", ""] {
            let err = set_status(&f, order.id, raw).await.unwrap_err();
            assert!(err.is_validation(), "{raw:?}: {err:?}");
        }
        let stored = f.store.get_order(order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::New);
        assert!(OrderStatus::ALL.contains(&stored.status));
    }

    #[tokio::test]
    async fn parameters_and_listings_navigate_back_to_their_rows() {
        let f = fixture().await;
        let light = f
            .store
            .insert_product_info(NewProductInfo::new(f.product.id, f.shop.id, 2, "Hammer 300g"))
            .await
            .unwrap();
        let weight = f.store.insert_parameter(NewParameter::new("weight")).await.unwrap();
        let color = f.store.insert_parameter(NewParameter::new("color")).await.unwrap();
        for (listing, value) in [(f.listing.id, "500 g"), (light.id, "300 g")] {
            f.store
                .insert_product_parameter(NewProductParameter::new(listing, weight.id, value))
                .await
                .unwrap();
        }
        f.store
            .insert_product_parameter(NewProductParameter::new(f.listing.id, color.id, "red"))
            .await
            .unwrap();

        let values = f
            .store
            .list_parameter_values(
                weight.id,
                ListOrder::new(ProductParameterSort::Value, Direction::Ascending),
            )
            .await
            .unwrap();
        assert_eq!(
            values.iter().map(|v| v.value.as_str()).collect::<Vec<_>>(),
            vec!["300 g", "500 g"]
        );

        let first = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        let second = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        for order in [first.id, second.id] {
            f.store
                .insert_order_item(NewOrderItem::new(order, f.listing.id))
                .await
                .unwrap();
        }
        f.store
            .insert_order_item(NewOrderItem::new(first.id, light.id))
            .await
            .unwrap();

        let in_orders = f
            .store
            .list_product_info_order_items(f.listing.id, ListOrder::default())
            .await
            .unwrap();
        let mut orders: Vec<OrderId> = in_orders.iter().map(|item| item.order_id).collect();
        orders.sort();
        let mut expected = vec![first.id, second.id];
        expected.sort();
        assert_eq!(orders, expected);
        assert!(
            f.store
                .list_product_info_order_items(ProductInfoId::new(), ListOrder::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn deleting_a_category_cascades_to_listing_dependents() {
        let f = fixture().await;
        let weight = f.store.insert_parameter(NewParameter::new("weight")).await.unwrap();
        let value = f
            .store
            .insert_product_parameter(NewProductParameter::new(f.listing.id, weight.id, "500 g"))
            .await
            .unwrap();
        let order = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        let item = f
            .store
            .insert_order_item(NewOrderItem::new(order.id, f.listing.id))
            .await
            .unwrap();

        f.store.delete_category(f.category.id).await.unwrap();

        assert!(matches!(
            f.store.get_product(f.product.id).await,
            Err(StoreError::NotFound { entity: "product", .. })
        ));
        assert!(f.store.get_product_info(f.listing.id).await.is_err());
        assert!(f.store.get_product_parameter(value.id).await.is_err());
        assert!(f.store.get_order_item(item.id).await.is_err());

        // Rows outside the cascade survive.
        assert_eq!(f.store.get_parameter(weight.id).await.unwrap(), weight);
        assert_eq!(f.store.get_order(order.id).await.unwrap().id, order.id);
        assert_eq!(f.store.get_shop(f.shop.id).await.unwrap(), f.shop);
        assert!(
            f.store
                .shop_categories(f.shop.id, ListOrder::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn deleting_a_shop_cascades_its_listings() {
        let f = fixture().await;
        let other_shop = f.store.insert_shop(NewShop::new("Globex")).await.unwrap();
        let other_listing = f
            .store
            .insert_product_info(NewProductInfo::new(f.product.id, other_shop.id, 1, "Hammer"))
            .await
            .unwrap();
        let order = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        f.store
            .insert_order_item(NewOrderItem::new(order.id, f.listing.id))
            .await
            .unwrap();

        f.store.delete_shop(f.shop.id).await.unwrap();

        assert!(f.store.get_product_info(f.listing.id).await.is_err());
        assert!(
            f.store
                .list_order_items(order.id, ListOrder::default())
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            f.store.get_product_info(other_listing.id).await.unwrap(),
            other_listing
        );
        assert_eq!(f.store.get_product(f.product.id).await.unwrap(), f.product);
        assert!(
            f.store
                .category_shops(f.category.id, ListOrder::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn negative_amounts_are_rejected_at_write_time() {
        let f = fixture().await;
        for patch in [
            ProductInfoPatch::default().quantity(-1),
            ProductInfoPatch::default().price(-500),
            ProductInfoPatch::default().price_rrc(-1),
        ] {
            let err = f
                .store
                .update_product_info(f.listing.id, patch)
                .await
                .unwrap_err();
            assert!(err.is_validation(), "{err}");
        }
        assert_eq!(
            f.store.get_product_info(f.listing.id).await.unwrap(),
            f.listing
        );

        let err = f
            .store
            .insert_product_info(
                NewProductInfo::new(f.product.id, f.shop.id, 7, "Hammer 300g").price(-1),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: price must be non-negative (got -1)"
        );
    }

    #[tokio::test]
    async fn failing_batch_leaves_tables_unchanged() {
        let f = fixture().await;
        let order = NewOrder::basket(f.user);
        let batch = WriteBatch::new()
            .with(order.clone())
            .with(NewOrderItem::new(order.id, f.listing.id))
            .with(Write::UpdateProductInfo(
                f.listing.id,
                ProductInfoPatch::default().quantity(9),
            ))
            .with(NewOrderItem::new(order.id, f.listing.id));

        assert_constraint(f.store.apply(batch).await, Constraint::UniqueOrderItem);

        assert!(matches!(
            f.store.get_order(order.id).await,
            Err(StoreError::NotFound { entity: "order", .. })
        ));
        assert_eq!(
            f.store.get_product_info(f.listing.id).await.unwrap().quantity,
            10
        );
        assert!(
            f.store
                .list_orders(Some(f.user), ListOrder::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn batch_places_item_and_adjusts_stock_together() {
        let f = fixture().await;
        let order = NewOrder::basket(f.user);
        let item = NewOrderItem::new(order.id, f.listing.id).quantity(2);
        let mut batch = WriteBatch::new();
        batch
            .push(order.clone())
            .push(item.clone())
            .push(Write::UpdateProductInfo(
                f.listing.id,
                ProductInfoPatch::default().quantity(8),
            ))
            .push(Write::UpdateOrder(
                order.id,
                OrderPatch::default().status(OrderStatus::New),
            ));

        let written = f.store.apply(batch).await.unwrap();
        assert_eq!(written.len(), 4);
        assert!(matches!(&written[1], Written::OrderItem(i) if i.quantity == 2));
        assert!(matches!(&written[2], Written::ProductInfo(p) if p.quantity == 8));

        let stored = f.store.get_order(order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::New);
        assert_eq!(f.store.get_order_item(item.id).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let store = InMemoryStore::new();
        assert!(store.apply(WriteBatch::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_update_refreshes_updated_at_only() {
        let f = fixture().await;
        let order = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        assert_eq!(order.created_at, order.updated_at);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let touched = f
            .store
            .update_order(order.id, OrderPatch::default())
            .await
            .unwrap();
        assert_eq!(touched.created_at, order.created_at);
        assert!(touched.updated_at > order.updated_at);
        assert_eq!(touched.status, OrderStatus::Basket);
    }

    #[tokio::test]
    async fn default_listings_follow_documented_orderings() {
        let f = fixture().await;
        f.store.insert_shop(NewShop::new("Globex")).await.unwrap();
        f.store.insert_shop(NewShop::new("Initech")).await.unwrap();

        let names = |shops: Vec<Shop>| shops.into_iter().map(|s| s.name).collect::<Vec<_>>();
        assert_eq!(
            names(f.store.list_shops(ListOrder::default()).await.unwrap()),
            vec!["Initech", "Globex", "ACME"]
        );
        assert_eq!(
            names(
                f.store
                    .list_shops(ListOrder::ascending(ShopSort::Name))
                    .await
                    .unwrap()
            ),
            vec!["ACME", "Globex", "Initech"]
        );

        let cheap = f
            .store
            .insert_product_info(NewProductInfo::new(f.product.id, f.shop.id, 2, "Hammer 300g").price(300))
            .await
            .unwrap();
        let listings = f
            .store
            .list_product_infos(ProductInfoFilter::shop(f.shop.id), ListOrder::default())
            .await
            .unwrap();
        let mut by_id = vec![f.listing.id, cheap.id];
        by_id.sort();
        assert_eq!(listings.iter().map(|l| l.id).collect::<Vec<_>>(), by_id);
        let by_price = f
            .store
            .list_product_infos(
                ProductInfoFilter::default(),
                ListOrder::new(ProductInfoSort::Price, Direction::Ascending),
            )
            .await
            .unwrap();
        assert_eq!(by_price[0].id, cheap.id);

        let first = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        let second = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        let orders = f
            .store
            .list_orders(Some(f.user), ListOrder::default())
            .await
            .unwrap();
        assert_eq!(
            orders.iter().map(|o| o.id).collect::<Vec<OrderId>>(),
            vec![second.id, first.id]
        );
        let oldest_first = f
            .store
            .list_orders(None, ListOrder::ascending(OrderSort::CreatedAt))
            .await
            .unwrap();
        assert_eq!(oldest_first[0].id, first.id);
    }

    #[tokio::test]
    async fn name_limits_are_inclusive() {
        let store = InMemoryStore::new();
        let shop = store.insert_shop(NewShop::new("s".repeat(50))).await.unwrap();
        assert!(
            store
                .insert_shop(NewShop::new("s".repeat(51)))
                .await
                .unwrap_err()
                .is_validation()
        );
        assert!(
            store
                .update_shop(shop.id, ShopPatch::default().name("s".repeat(51)))
                .await
                .unwrap_err()
                .is_validation()
        );
        assert_eq!(store.get_shop(shop.id).await.unwrap(), shop);

        store.insert_category(NewCategory::new("c".repeat(80))).await.unwrap();
        assert!(
            store
                .insert_category(NewCategory::new("c".repeat(81)))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn removing_a_user_cascades_their_orders() {
        let f = fixture().await;
        let order = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        let item = f
            .store
            .insert_order_item(NewOrderItem::new(order.id, f.listing.id))
            .await
            .unwrap();
        let bystander = UserId::new();
        f.store.register_user(bystander).unwrap();
        let kept = f.store.insert_order(NewOrder::basket(bystander)).await.unwrap();

        assert!(f.store.remove_user(f.user).unwrap());

        assert!(f.store.get_order(order.id).await.is_err());
        assert!(f.store.get_order_item(item.id).await.is_err());
        assert_eq!(f.store.get_order(kept.id).await.unwrap(), kept);
        assert_constraint(
            f.store.insert_order(NewOrder::basket(f.user)).await,
            Constraint::OrderUser,
        );
    }

    #[tokio::test]
    async fn dangling_references_are_rejected() {
        let f = fixture().await;
        assert_constraint(
            f.store
                .insert_product(NewProduct::new("Saw", CategoryId::new()))
                .await,
            Constraint::ProductCategory,
        );
        assert_constraint(
            f.store
                .update_product(f.product.id, ProductPatch::default().category(CategoryId::new()))
                .await,
            Constraint::ProductCategory,
        );
        assert_constraint(
            f.store
                .insert_product_info(NewProductInfo::new(f.product.id, ShopId::new(), 1, "Hammer"))
                .await,
            Constraint::ProductInfoShop,
        );
        assert_constraint(
            f.store
                .insert_category(NewCategory::new("Garden").with_shops([ShopId::new()]))
                .await,
            Constraint::ShopCategoryShop,
        );
        assert_constraint(
            f.store.link_category_shop(CategoryId::new(), f.shop.id).await,
            Constraint::ShopCategoryCategory,
        );
        let order = f.store.insert_order(NewOrder::basket(f.user)).await.unwrap();
        assert_constraint(
            f.store
                .insert_order_item(NewOrderItem::new(order.id, ProductInfoId::new()))
                .await,
            Constraint::OrderItemProductInfo,
        );
        assert!(
            f.store
                .list_categories(ListOrder::default())
                .await
                .unwrap()
                .iter()
                .all(|c| c.name != "Garden")
        );
    }

    #[tokio::test]
    async fn category_links_are_idempotent() {
        let f = fixture().await;
        let globex = f.store.insert_shop(NewShop::new("Globex")).await.unwrap();
        assert!(!f.store.link_category_shop(f.category.id, f.shop.id).await.unwrap());
        assert!(f.store.link_category_shop(f.category.id, globex.id).await.unwrap());

        let shops = f
            .store
            .category_shops(f.category.id, ListOrder::descending(ShopSort::Name))
            .await
            .unwrap();
        assert_eq!(shops, vec![globex.clone(), f.shop.clone()]);

        assert!(f.store.unlink_category_shop(f.category.id, globex.id).await.unwrap());
        assert!(!f.store.unlink_category_shop(f.category.id, globex.id).await.unwrap());
        assert_eq!(
            f.store
                .shop_categories(f.shop.id, ListOrder::ascending(CategorySort::Name))
                .await
                .unwrap(),
            vec![f.category.clone()]
        );
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = InMemoryStore::new();
        let missing = ShopId::new();
        for result in [
            store.get_shop(missing).await.map(|_| ()),
            store.update_shop(missing, ShopPatch::default()).await.map(|_| ()),
            store.delete_shop(missing).await,
        ] {
            assert!(matches!(result, Err(StoreError::NotFound { entity: "shop", .. })));
        }
        assert!(matches!(
            store.update_order(OrderId::new(), OrderPatch::default()).await,
            Err(StoreError::NotFound { entity: "order", .. })
        ));
    }
}
