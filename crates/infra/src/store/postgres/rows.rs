//! Row decoding. Column lists here and the `SELECT`s in `queries` must agree.

use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use retail_catalog::{Category, Parameter, Product, ProductInfo, ProductParameter, Shop};
use retail_core::{
    CategoryId, OrderId, OrderItemId, ParameterId, ProductId, ProductInfoId, ProductParameterId,
    ShopId, UserId,
};
use retail_orders::{Order, OrderItem, OrderStatus};

pub(super) const SHOP_COLUMNS: &str = "id, name, url";
pub(super) const CATEGORY_COLUMNS: &str = "id, name";
pub(super) const PRODUCT_COLUMNS: &str = "id, name, category_id";
pub(super) const PRODUCT_INFO_COLUMNS: &str =
    "id, product_id, shop_id, external_id, name, quantity, price, price_rrc";
pub(super) const PARAMETER_COLUMNS: &str = "id, name";
pub(super) const PRODUCT_PARAMETER_COLUMNS: &str = "id, product_info_id, parameter_id, value";
pub(super) const ORDER_COLUMNS: &str = "id, user_id, status, created_at, updated_at";
pub(super) const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_info_id, quantity";

fn uuid(row: &PgRow, column: &str) -> Result<Uuid, sqlx::Error> {
    row.try_get(column)
}

/// INTEGER columns guarded by `>= 0` checks.
fn unsigned(row: &PgRow, column: &str) -> Result<u32, sqlx::Error> {
    let value: i32 = row.try_get(column)?;
    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub(super) fn shop(row: &PgRow) -> Result<Shop, sqlx::Error> {
    Ok(Shop {
        id: ShopId::from_uuid(uuid(row, "id")?),
        name: row.try_get("name")?,
        url: row.try_get("url")?,
    })
}

pub(super) fn category(row: &PgRow) -> Result<Category, sqlx::Error> {
    Ok(Category {
        id: CategoryId::from_uuid(uuid(row, "id")?),
        name: row.try_get("name")?,
    })
}

pub(super) fn product(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::from_uuid(uuid(row, "id")?),
        name: row.try_get("name")?,
        category_id: CategoryId::from_uuid(uuid(row, "category_id")?),
    })
}

pub(super) fn product_info(row: &PgRow) -> Result<ProductInfo, sqlx::Error> {
    Ok(ProductInfo {
        id: ProductInfoId::from_uuid(uuid(row, "id")?),
        product_id: ProductId::from_uuid(uuid(row, "product_id")?),
        shop_id: ShopId::from_uuid(uuid(row, "shop_id")?),
        external_id: unsigned(row, "external_id")?,
        name: row.try_get("name")?,
        quantity: unsigned(row, "quantity")?,
        price: unsigned(row, "price")?,
        price_rrc: unsigned(row, "price_rrc")?,
    })
}

pub(super) fn parameter(row: &PgRow) -> Result<Parameter, sqlx::Error> {
    Ok(Parameter {
        id: ParameterId::from_uuid(uuid(row, "id")?),
        name: row.try_get("name")?,
    })
}

pub(super) fn product_parameter(row: &PgRow) -> Result<ProductParameter, sqlx::Error> {
    Ok(ProductParameter {
        id: ProductParameterId::from_uuid(uuid(row, "id")?),
        product_info_id: ProductInfoId::from_uuid(uuid(row, "product_info_id")?),
        parameter_id: ParameterId::from_uuid(uuid(row, "parameter_id")?),
        value: row.try_get("value")?,
    })
}

pub(super) fn order(row: &PgRow) -> Result<Order, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status: OrderStatus = status.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: Box::new(e),
    })?;
    Ok(Order {
        id: OrderId::from_uuid(uuid(row, "id")?),
        user_id: UserId::from_uuid(uuid(row, "user_id")?),
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(super) fn order_item(row: &PgRow) -> Result<OrderItem, sqlx::Error> {
    Ok(OrderItem {
        id: OrderItemId::from_uuid(uuid(row, "id")?),
        order_id: OrderId::from_uuid(uuid(row, "order_id")?),
        product_info_id: ProductInfoId::from_uuid(uuid(row, "product_info_id")?),
        quantity: unsigned(row, "quantity")?,
    })
}
