//! SQL for every store operation, written against a single connection so the
//! same functions serve standalone calls and write batches.
//!
//! Uniqueness and foreign keys are left to the database constraints; rows being
//! patched are read `FOR UPDATE` first.

use sqlx::postgres::PgRow;
use sqlx::PgConnection;
use uuid::Uuid;

use retail_catalog::{
    Category, CategoryPatch, CategorySort, NewCategory, NewParameter, NewProduct, NewProductInfo,
    NewProductParameter, NewShop, Parameter, ParameterPatch, ParameterSort, Product,
    ProductInfo, ProductInfoFilter, ProductInfoPatch, ProductInfoSort, ProductParameter,
    ProductParameterPatch, ProductParameterSort, ProductPatch, ProductSort, Shop, ShopPatch,
    ShopSort,
};
use retail_core::{
    CategoryId, Entity, ListOrder, OrderId, OrderItemId, ParameterId, ProductId, ProductInfoId,
    ProductParameterId, ShopId, UserId,
};
use retail_orders::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderItemPatch, OrderItemSort, OrderPatch,
    OrderSort, OrderStatus,
};

use super::map_sqlx_error;
use super::rows::{
    self, CATEGORY_COLUMNS, ORDER_COLUMNS, ORDER_ITEM_COLUMNS, PARAMETER_COLUMNS,
    PRODUCT_COLUMNS, PRODUCT_INFO_COLUMNS, PRODUCT_PARAMETER_COLUMNS, SHOP_COLUMNS,
};
use crate::store::batch::{Write, Written};
use crate::store::r#trait::{StoreError, StoreResult};

type Decode<R> = fn(&PgRow) -> Result<R, sqlx::Error>;

fn select_by_id(columns: &str, table: &str, for_update: bool) -> String {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    format!("SELECT {columns} FROM {table} WHERE id = $1{lock}")
}

async fn fetch_by_id<R: Entity>(
    conn: &mut PgConnection,
    sql: &str,
    id: Uuid,
    decode: Decode<R>,
    operation: &str,
) -> StoreResult<R> {
    let row = sqlx::query(sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?
        .ok_or_else(|| StoreError::not_found(R::KIND, id))?;
    decode(&row).map_err(|e| map_sqlx_error(operation, e))
}

fn decode_all<R>(fetched: Vec<PgRow>, decode: Decode<R>, operation: &str) -> StoreResult<Vec<R>> {
    fetched
        .iter()
        .map(|row| decode(row).map_err(|e| map_sqlx_error(operation, e)))
        .collect()
}

async fn delete_by_id(
    conn: &mut PgConnection,
    table: &str,
    entity: &'static str,
    id: Uuid,
) -> StoreResult<()> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete", e))?;
    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(entity, id));
    }
    Ok(())
}

/// Stored integers are validated to fit INTEGER before they reach here.
fn int(field: &str, value: u32) -> StoreResult<i32> {
    i32::try_from(value)
        .map_err(|_| StoreError::Validation(format!("{field} exceeds {} (got {value})", i32::MAX)))
}

pub(super) async fn apply_write(conn: &mut PgConnection, write: Write) -> StoreResult<Written> {
    Ok(match write {
        Write::InsertShop(new) => Written::Shop(insert_shop(conn, new).await?),
        Write::UpdateShop(id, patch) => Written::Shop(update_shop(conn, id, patch).await?),
        Write::DeleteShop(id) => {
            delete_shop(conn, id).await?;
            Written::Deleted
        }
        Write::InsertCategory(new) => Written::Category(insert_category(conn, new).await?),
        Write::UpdateCategory(id, patch) => {
            Written::Category(update_category(conn, id, patch).await?)
        }
        Write::DeleteCategory(id) => {
            delete_category(conn, id).await?;
            Written::Deleted
        }
        Write::LinkCategoryShop(category_id, shop_id) => {
            Written::Association(link_category_shop(conn, category_id, shop_id).await?)
        }
        Write::UnlinkCategoryShop(category_id, shop_id) => {
            Written::Association(unlink_category_shop(conn, category_id, shop_id).await?)
        }
        Write::InsertProduct(new) => Written::Product(insert_product(conn, new).await?),
        Write::UpdateProduct(id, patch) => {
            Written::Product(update_product(conn, id, patch).await?)
        }
        Write::DeleteProduct(id) => {
            delete_product(conn, id).await?;
            Written::Deleted
        }
        Write::InsertProductInfo(new) => {
            Written::ProductInfo(insert_product_info(conn, new).await?)
        }
        Write::UpdateProductInfo(id, patch) => {
            Written::ProductInfo(update_product_info(conn, id, patch).await?)
        }
        Write::DeleteProductInfo(id) => {
            delete_product_info(conn, id).await?;
            Written::Deleted
        }
        Write::InsertParameter(new) => Written::Parameter(insert_parameter(conn, new).await?),
        Write::UpdateParameter(id, patch) => {
            Written::Parameter(update_parameter(conn, id, patch).await?)
        }
        Write::DeleteParameter(id) => {
            delete_parameter(conn, id).await?;
            Written::Deleted
        }
        Write::InsertProductParameter(new) => {
            Written::ProductParameter(insert_product_parameter(conn, new).await?)
        }
        Write::UpdateProductParameter(id, patch) => {
            Written::ProductParameter(update_product_parameter(conn, id, patch).await?)
        }
        Write::DeleteProductParameter(id) => {
            delete_product_parameter(conn, id).await?;
            Written::Deleted
        }
        Write::InsertOrder(new) => Written::Order(insert_order(conn, new).await?),
        Write::UpdateOrder(id, patch) => Written::Order(update_order(conn, id, patch).await?),
        Write::DeleteOrder(id) => {
            delete_order(conn, id).await?;
            Written::Deleted
        }
        Write::InsertOrderItem(new) => Written::OrderItem(insert_order_item(conn, new).await?),
        Write::UpdateOrderItem(id, patch) => {
            Written::OrderItem(update_order_item(conn, id, patch).await?)
        }
        Write::DeleteOrderItem(id) => {
            delete_order_item(conn, id).await?;
            Written::Deleted
        }
    })
}

// Shops

pub(super) async fn insert_shop(conn: &mut PgConnection, new: NewShop) -> StoreResult<Shop> {
    let shop = new.into_record()?;
    sqlx::query("INSERT INTO shops (id, name, url) VALUES ($1, $2, $3)")
        .bind(shop.id.as_uuid())
        .bind(&shop.name)
        .bind(&shop.url)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("insert_shop", e))?;
    Ok(shop)
}

pub(super) async fn get_shop(conn: &mut PgConnection, id: ShopId) -> StoreResult<Shop> {
    let sql = select_by_id(SHOP_COLUMNS, "shops", false);
    fetch_by_id(conn, &sql, *id.as_uuid(), rows::shop, "get_shop").await
}

pub(super) async fn update_shop(
    conn: &mut PgConnection,
    id: ShopId,
    patch: ShopPatch,
) -> StoreResult<Shop> {
    let sql = select_by_id(SHOP_COLUMNS, "shops", true);
    let mut shop = fetch_by_id(conn, &sql, *id.as_uuid(), rows::shop, "update_shop").await?;
    patch.apply(&mut shop)?;
    sqlx::query("UPDATE shops SET name = $2, url = $3 WHERE id = $1")
        .bind(shop.id.as_uuid())
        .bind(&shop.name)
        .bind(&shop.url)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("update_shop", e))?;
    Ok(shop)
}

pub(super) async fn delete_shop(conn: &mut PgConnection, id: ShopId) -> StoreResult<()> {
    delete_by_id(conn, "shops", Shop::KIND, *id.as_uuid()).await
}

pub(super) async fn list_shops(
    conn: &mut PgConnection,
    order: ListOrder<ShopSort>,
) -> StoreResult<Vec<Shop>> {
    let fetched = sqlx::query(&format!(
        "SELECT {SHOP_COLUMNS} FROM shops ORDER BY {}",
        order.to_sql()
    ))
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_shops", e))?;
    decode_all(fetched, rows::shop, "list_shops")
}

// Categories and their shop links

pub(super) async fn insert_category(
    conn: &mut PgConnection,
    new: NewCategory,
) -> StoreResult<Category> {
    let (category, links) = new.into_record()?;
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
    for link in links {
        sqlx::query("INSERT INTO shop_categories (shop_id, category_id) VALUES ($1, $2)")
            .bind(link.shop_id.as_uuid())
            .bind(link.category_id.as_uuid())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("insert_category", e))?;
    }
    Ok(category)
}

pub(super) async fn get_category(conn: &mut PgConnection, id: CategoryId) -> StoreResult<Category> {
    let sql = select_by_id(CATEGORY_COLUMNS, "categories", false);
    fetch_by_id(conn, &sql, *id.as_uuid(), rows::category, "get_category").await
}

pub(super) async fn update_category(
    conn: &mut PgConnection,
    id: CategoryId,
    patch: CategoryPatch,
) -> StoreResult<Category> {
    let sql = select_by_id(CATEGORY_COLUMNS, "categories", true);
    let mut category =
        fetch_by_id(conn, &sql, *id.as_uuid(), rows::category, "update_category").await?;
    patch.apply(&mut category)?;
    sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("update_category", e))?;
    Ok(category)
}

pub(super) async fn delete_category(conn: &mut PgConnection, id: CategoryId) -> StoreResult<()> {
    delete_by_id(conn, "categories", Category::KIND, *id.as_uuid()).await
}

pub(super) async fn list_categories(
    conn: &mut PgConnection,
    order: ListOrder<CategorySort>,
) -> StoreResult<Vec<Category>> {
    let fetched = sqlx::query(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY {}",
        order.to_sql()
    ))
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_categories", e))?;
    decode_all(fetched, rows::category, "list_categories")
}

pub(super) async fn link_category_shop(
    conn: &mut PgConnection,
    category_id: CategoryId,
    shop_id: ShopId,
) -> StoreResult<bool> {
    let result = sqlx::query(
        "INSERT INTO shop_categories (shop_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(shop_id.as_uuid())
    .bind(category_id.as_uuid())
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("link_category_shop", e))?;
    Ok(result.rows_affected() == 1)
}

pub(super) async fn unlink_category_shop(
    conn: &mut PgConnection,
    category_id: CategoryId,
    shop_id: ShopId,
) -> StoreResult<bool> {
    let result =
        sqlx::query("DELETE FROM shop_categories WHERE shop_id = $1 AND category_id = $2")
            .bind(shop_id.as_uuid())
            .bind(category_id.as_uuid())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("unlink_category_shop", e))?;
    Ok(result.rows_affected() == 1)
}

pub(super) async fn category_shops(
    conn: &mut PgConnection,
    category_id: CategoryId,
    order: ListOrder<ShopSort>,
) -> StoreResult<Vec<Shop>> {
    let fetched = sqlx::query(&format!(
        "SELECT s.id, s.name, s.url
         FROM shops s
         JOIN shop_categories sc ON sc.shop_id = s.id
         WHERE sc.category_id = $1
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(category_id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("category_shops", e))?;
    decode_all(fetched, rows::shop, "category_shops")
}

pub(super) async fn shop_categories(
    conn: &mut PgConnection,
    shop_id: ShopId,
    order: ListOrder<CategorySort>,
) -> StoreResult<Vec<Category>> {
    let fetched = sqlx::query(&format!(
        "SELECT c.id, c.name
         FROM categories c
         JOIN shop_categories sc ON sc.category_id = c.id
         WHERE sc.shop_id = $1
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(shop_id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("shop_categories", e))?;
    decode_all(fetched, rows::category, "shop_categories")
}

// Products

pub(super) async fn insert_product(conn: &mut PgConnection, new: NewProduct) -> StoreResult<Product> {
    let product = new.into_record()?;
    sqlx::query("INSERT INTO products (id, name, category_id) VALUES ($1, $2, $3)")
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.category_id.as_uuid())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
    Ok(product)
}

pub(super) async fn get_product(conn: &mut PgConnection, id: ProductId) -> StoreResult<Product> {
    let sql = select_by_id(PRODUCT_COLUMNS, "products", false);
    fetch_by_id(conn, &sql, *id.as_uuid(), rows::product, "get_product").await
}

pub(super) async fn update_product(
    conn: &mut PgConnection,
    id: ProductId,
    patch: ProductPatch,
) -> StoreResult<Product> {
    let sql = select_by_id(PRODUCT_COLUMNS, "products", true);
    let mut product =
        fetch_by_id(conn, &sql, *id.as_uuid(), rows::product, "update_product").await?;
    patch.apply(&mut product)?;
    sqlx::query("UPDATE products SET name = $2, category_id = $3 WHERE id = $1")
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.category_id.as_uuid())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
    Ok(product)
}

pub(super) async fn delete_product(conn: &mut PgConnection, id: ProductId) -> StoreResult<()> {
    delete_by_id(conn, "products", Product::KIND, *id.as_uuid()).await
}

pub(super) async fn list_products(
    conn: &mut PgConnection,
    category_id: Option<CategoryId>,
    order: ListOrder<ProductSort>,
) -> StoreResult<Vec<Product>> {
    let fetched = sqlx::query(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products
         WHERE ($1::uuid IS NULL OR category_id = $1)
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(category_id.map(Uuid::from))
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_products", e))?;
    decode_all(fetched, rows::product, "list_products")
}

// Listings

pub(super) async fn insert_product_info(
    conn: &mut PgConnection,
    new: NewProductInfo,
) -> StoreResult<ProductInfo> {
    let info = new.into_record()?;
    sqlx::query(
        "INSERT INTO product_infos
            (id, product_id, shop_id, external_id, name, quantity, price, price_rrc)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(info.id.as_uuid())
    .bind(info.product_id.as_uuid())
    .bind(info.shop_id.as_uuid())
    .bind(int("external_id", info.external_id)?)
    .bind(&info.name)
    .bind(int("quantity", info.quantity)?)
    .bind(int("price", info.price)?)
    .bind(int("price_rrc", info.price_rrc)?)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_product_info", e))?;
    Ok(info)
}

pub(super) async fn get_product_info(
    conn: &mut PgConnection,
    id: ProductInfoId,
) -> StoreResult<ProductInfo> {
    let sql = select_by_id(PRODUCT_INFO_COLUMNS, "product_infos", false);
    fetch_by_id(conn, &sql, *id.as_uuid(), rows::product_info, "get_product_info").await
}

pub(super) async fn update_product_info(
    conn: &mut PgConnection,
    id: ProductInfoId,
    patch: ProductInfoPatch,
) -> StoreResult<ProductInfo> {
    let sql = select_by_id(PRODUCT_INFO_COLUMNS, "product_infos", true);
    let mut info = fetch_by_id(
        conn,
        &sql,
        *id.as_uuid(),
        rows::product_info,
        "update_product_info",
    )
    .await?;
    patch.apply(&mut info)?;
    sqlx::query(
        "UPDATE product_infos
         SET product_id = $2, shop_id = $3, external_id = $4, name = $5,
             quantity = $6, price = $7, price_rrc = $8
         WHERE id = $1",
    )
    .bind(info.id.as_uuid())
    .bind(info.product_id.as_uuid())
    .bind(info.shop_id.as_uuid())
    .bind(int("external_id", info.external_id)?)
    .bind(&info.name)
    .bind(int("quantity", info.quantity)?)
    .bind(int("price", info.price)?)
    .bind(int("price_rrc", info.price_rrc)?)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("update_product_info", e))?;
    Ok(info)
}

pub(super) async fn delete_product_info(
    conn: &mut PgConnection,
    id: ProductInfoId,
) -> StoreResult<()> {
    delete_by_id(conn, "product_infos", ProductInfo::KIND, *id.as_uuid()).await
}

pub(super) async fn list_product_infos(
    conn: &mut PgConnection,
    filter: ProductInfoFilter,
    order: ListOrder<ProductInfoSort>,
) -> StoreResult<Vec<ProductInfo>> {
    let fetched = sqlx::query(&format!(
        "SELECT {PRODUCT_INFO_COLUMNS} FROM product_infos
         WHERE ($1::uuid IS NULL OR product_id = $1)
           AND ($2::uuid IS NULL OR shop_id = $2)
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(filter.product_id.map(Uuid::from))
    .bind(filter.shop_id.map(Uuid::from))
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_product_infos", e))?;
    decode_all(fetched, rows::product_info, "list_product_infos")
}

// Parameters

pub(super) async fn insert_parameter(
    conn: &mut PgConnection,
    new: NewParameter,
) -> StoreResult<Parameter> {
    let parameter = new.into_record()?;
    sqlx::query("INSERT INTO parameters (id, name) VALUES ($1, $2)")
        .bind(parameter.id.as_uuid())
        .bind(&parameter.name)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("insert_parameter", e))?;
    Ok(parameter)
}

pub(super) async fn get_parameter(conn: &mut PgConnection, id: ParameterId) -> StoreResult<Parameter> {
    let sql = select_by_id(PARAMETER_COLUMNS, "parameters", false);
    fetch_by_id(conn, &sql, *id.as_uuid(), rows::parameter, "get_parameter").await
}

pub(super) async fn update_parameter(
    conn: &mut PgConnection,
    id: ParameterId,
    patch: ParameterPatch,
) -> StoreResult<Parameter> {
    let sql = select_by_id(PARAMETER_COLUMNS, "parameters", true);
    let mut parameter =
        fetch_by_id(conn, &sql, *id.as_uuid(), rows::parameter, "update_parameter").await?;
    patch.apply(&mut parameter)?;
    sqlx::query("UPDATE parameters SET name = $2 WHERE id = $1")
        .bind(parameter.id.as_uuid())
        .bind(&parameter.name)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("update_parameter", e))?;
    Ok(parameter)
}

pub(super) async fn delete_parameter(conn: &mut PgConnection, id: ParameterId) -> StoreResult<()> {
    delete_by_id(conn, "parameters", Parameter::KIND, *id.as_uuid()).await
}

pub(super) async fn list_parameters(
    conn: &mut PgConnection,
    order: ListOrder<ParameterSort>,
) -> StoreResult<Vec<Parameter>> {
    let fetched = sqlx::query(&format!(
        "SELECT {PARAMETER_COLUMNS} FROM parameters ORDER BY {}",
        order.to_sql()
    ))
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_parameters", e))?;
    decode_all(fetched, rows::parameter, "list_parameters")
}

pub(super) async fn insert_product_parameter(
    conn: &mut PgConnection,
    new: NewProductParameter,
) -> StoreResult<ProductParameter> {
    let param = new.into_record()?;
    sqlx::query(
        "INSERT INTO product_parameters (id, product_info_id, parameter_id, value)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(param.id.as_uuid())
    .bind(param.product_info_id.as_uuid())
    .bind(param.parameter_id.as_uuid())
    .bind(&param.value)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_product_parameter", e))?;
    Ok(param)
}

pub(super) async fn get_product_parameter(
    conn: &mut PgConnection,
    id: ProductParameterId,
) -> StoreResult<ProductParameter> {
    let sql = select_by_id(PRODUCT_PARAMETER_COLUMNS, "product_parameters", false);
    fetch_by_id(
        conn,
        &sql,
        *id.as_uuid(),
        rows::product_parameter,
        "get_product_parameter",
    )
    .await
}

pub(super) async fn update_product_parameter(
    conn: &mut PgConnection,
    id: ProductParameterId,
    patch: ProductParameterPatch,
) -> StoreResult<ProductParameter> {
    let sql = select_by_id(PRODUCT_PARAMETER_COLUMNS, "product_parameters", true);
    let mut param = fetch_by_id(
        conn,
        &sql,
        *id.as_uuid(),
        rows::product_parameter,
        "update_product_parameter",
    )
    .await?;
    patch.apply(&mut param)?;
    sqlx::query("UPDATE product_parameters SET value = $2 WHERE id = $1")
        .bind(param.id.as_uuid())
        .bind(&param.value)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("update_product_parameter", e))?;
    Ok(param)
}

pub(super) async fn delete_product_parameter(
    conn: &mut PgConnection,
    id: ProductParameterId,
) -> StoreResult<()> {
    delete_by_id(
        conn,
        "product_parameters",
        ProductParameter::KIND,
        *id.as_uuid(),
    )
    .await
}

pub(super) async fn list_product_parameters(
    conn: &mut PgConnection,
    product_info_id: ProductInfoId,
    order: ListOrder<ProductParameterSort>,
) -> StoreResult<Vec<ProductParameter>> {
    let fetched = sqlx::query(&format!(
        "SELECT {PRODUCT_PARAMETER_COLUMNS} FROM product_parameters
         WHERE product_info_id = $1
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(product_info_id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_product_parameters", e))?;
    decode_all(fetched, rows::product_parameter, "list_product_parameters")
}

pub(super) async fn list_parameter_values(
    conn: &mut PgConnection,
    parameter_id: ParameterId,
    order: ListOrder<ProductParameterSort>,
) -> StoreResult<Vec<ProductParameter>> {
    let fetched = sqlx::query(&format!(
        "SELECT {PRODUCT_PARAMETER_COLUMNS} FROM product_parameters
         WHERE parameter_id = $1
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(parameter_id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_parameter_values", e))?;
    decode_all(fetched, rows::product_parameter, "list_parameter_values")
}

// Orders

pub(super) async fn insert_order(conn: &mut PgConnection, new: NewOrder) -> StoreResult<Order> {
    let row = sqlx::query(&format!(
        "INSERT INTO orders (id, user_id, status) VALUES ($1, $2, $3) RETURNING {ORDER_COLUMNS}"
    ))
    .bind(new.id.as_uuid())
    .bind(new.user_id.as_uuid())
    .bind(new.status.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_order", e))?;
    rows::order(&row).map_err(|e| map_sqlx_error("insert_order", e))
}

pub(super) async fn get_order(conn: &mut PgConnection, id: OrderId) -> StoreResult<Order> {
    let sql = select_by_id(ORDER_COLUMNS, "orders", false);
    fetch_by_id(conn, &sql, *id.as_uuid(), rows::order, "get_order").await
}

/// `created_at` is pinned and `updated_at` refreshed by the `orders_touch` trigger
/// as well; setting it here keeps the statement correct on its own.
pub(super) async fn update_order(
    conn: &mut PgConnection,
    id: OrderId,
    patch: OrderPatch,
) -> StoreResult<Order> {
    let row = sqlx::query(&format!(
        "UPDATE orders
         SET status = COALESCE($2, status), updated_at = now()
         WHERE id = $1
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id.as_uuid())
    .bind(patch.status.map(OrderStatus::as_str))
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("update_order", e))?
    .ok_or_else(|| StoreError::not_found(Order::KIND, id))?;
    rows::order(&row).map_err(|e| map_sqlx_error("update_order", e))
}

pub(super) async fn delete_order(conn: &mut PgConnection, id: OrderId) -> StoreResult<()> {
    delete_by_id(conn, "orders", Order::KIND, *id.as_uuid()).await
}

pub(super) async fn list_orders(
    conn: &mut PgConnection,
    user_id: Option<UserId>,
    order: ListOrder<OrderSort>,
) -> StoreResult<Vec<Order>> {
    let fetched = sqlx::query(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders
         WHERE ($1::uuid IS NULL OR user_id = $1)
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(user_id.map(Uuid::from))
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_orders", e))?;
    decode_all(fetched, rows::order, "list_orders")
}

pub(super) async fn insert_order_item(
    conn: &mut PgConnection,
    new: NewOrderItem,
) -> StoreResult<OrderItem> {
    let item = new.into_record()?;
    sqlx::query(
        "INSERT INTO order_items (id, order_id, product_info_id, quantity) VALUES ($1, $2, $3, $4)",
    )
    .bind(item.id.as_uuid())
    .bind(item.order_id.as_uuid())
    .bind(item.product_info_id.as_uuid())
    .bind(int("quantity", item.quantity)?)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_order_item", e))?;
    Ok(item)
}

pub(super) async fn get_order_item(conn: &mut PgConnection, id: OrderItemId) -> StoreResult<OrderItem> {
    let sql = select_by_id(ORDER_ITEM_COLUMNS, "order_items", false);
    fetch_by_id(conn, &sql, *id.as_uuid(), rows::order_item, "get_order_item").await
}

pub(super) async fn update_order_item(
    conn: &mut PgConnection,
    id: OrderItemId,
    patch: OrderItemPatch,
) -> StoreResult<OrderItem> {
    let sql = select_by_id(ORDER_ITEM_COLUMNS, "order_items", true);
    let mut item =
        fetch_by_id(conn, &sql, *id.as_uuid(), rows::order_item, "update_order_item").await?;
    patch.apply(&mut item)?;
    sqlx::query("UPDATE order_items SET quantity = $2 WHERE id = $1")
        .bind(item.id.as_uuid())
        .bind(int("quantity", item.quantity)?)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("update_order_item", e))?;
    Ok(item)
}

pub(super) async fn delete_order_item(conn: &mut PgConnection, id: OrderItemId) -> StoreResult<()> {
    delete_by_id(conn, "order_items", OrderItem::KIND, *id.as_uuid()).await
}

pub(super) async fn list_order_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    order: ListOrder<OrderItemSort>,
) -> StoreResult<Vec<OrderItem>> {
    let fetched = sqlx::query(&format!(
        "SELECT {ORDER_ITEM_COLUMNS} FROM order_items
         WHERE order_id = $1
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(order_id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_order_items", e))?;
    decode_all(fetched, rows::order_item, "list_order_items")
}

pub(super) async fn list_product_info_order_items(
    conn: &mut PgConnection,
    product_info_id: ProductInfoId,
    order: ListOrder<OrderItemSort>,
) -> StoreResult<Vec<OrderItem>> {
    let fetched = sqlx::query(&format!(
        "SELECT {ORDER_ITEM_COLUMNS} FROM order_items
         WHERE product_info_id = $1
         ORDER BY {}",
        order.to_sql()
    ))
    .bind(product_info_id.as_uuid())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("list_product_info_order_items", e))?;
    decode_all(fetched, rows::order_item, "list_product_info_order_items")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_locks_only_when_patching() {
        assert_eq!(
            select_by_id(SHOP_COLUMNS, "shops", false),
            "SELECT id, name, url FROM shops WHERE id = $1"
        );
        assert!(select_by_id(ORDER_COLUMNS, "orders", true).ends_with("WHERE id = $1 FOR UPDATE"));
    }

    #[test]
    fn integers_outside_integer_range_are_rejected() {
        assert_eq!(int("price", 12).unwrap(), 12);
        assert!(matches!(int("price", u32::MAX), Err(StoreError::Validation(_))));
    }
}
