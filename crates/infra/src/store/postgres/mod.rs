//! PostgreSQL-backed retail store.
//!
//! Every write runs in a transaction; uniqueness, foreign keys and CHECKs are
//! enforced by the constraints installed by [`crate::migrations`].
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to [`StoreError`] as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` for a named constraint, `AlreadyExists` for a primary key |
//! | Database (foreign key violation) | `23503` | `ReferentialIntegrity` |
//! | Database (check / not null / too long / out of range / bad text) | `23514`, `23502`, `22001`, `22003`, `22P02` | `Validation` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed, PoolTimedOut, Io, ... | N/A | `Backend` |
//!
//! ## Thread Safety
//!
//! `PostgresStore` is `Send + Sync` and cheap to clone; all operations go through
//! the SQLx connection pool.

mod queries;
mod rows;

use async_trait::async_trait;
use sqlx::postgres::{PgDatabaseError, PgPool, PgPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tracing::{info, instrument};

use retail_catalog::{
    Category, CategoryPatch, CategorySort, NewCategory, NewParameter, NewProduct, NewProductInfo,
    NewProductParameter, NewShop, Parameter, ParameterPatch, ParameterSort, Product,
    ProductInfo, ProductInfoFilter, ProductInfoPatch, ProductInfoSort, ProductParameter,
    ProductParameterPatch, ProductParameterSort, ProductPatch, ProductSort, Shop, ShopPatch,
    ShopSort,
};
use retail_core::{
    CategoryId, Constraint, ConstraintKind, ListOrder, OrderId, OrderItemId, ParameterId,
    ProductId, ProductInfoId, ProductParameterId, ShopId, UserId,
};
use retail_orders::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderItemPatch, OrderItemSort, OrderPatch,
    OrderSort,
};

use super::batch::{WriteBatch, Written};
use super::r#trait::{RetailStore, StoreError, StoreResult};
use crate::config::{SchemaConfig, StoreConfig};

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool sized and timed according to `config`.
    #[instrument(skip(config), fields(max_connections = config.max_connections), err)]
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        info!("connected to postgres");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations. Returns the versions applied.
    pub async fn migrate(&self, schema: &SchemaConfig) -> StoreResult<Vec<&'static str>> {
        crate::migrations::migrate(&self.pool, schema).await
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> StoreResult<()> {
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn acquire(&self) -> StoreResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire_connection", e))
    }
}

/// Run `$op` against a fresh transaction and commit it. An error drops the
/// transaction, which rolls it back.
macro_rules! transactional {
    ($store:expr, |$conn:ident| $op:expr) => {{
        let mut tx = $store.begin().await?;
        let out = {
            let $conn: &mut sqlx::PgConnection = &mut tx;
            $op.await?
        };
        PostgresStore::commit(tx).await?;
        Ok(out)
    }};
}

/// Run `$op` against a pooled connection outside any explicit transaction.
macro_rules! read {
    ($store:expr, |$conn:ident| $op:expr) => {{
        let mut pooled = $store.acquire().await?;
        let $conn: &mut sqlx::PgConnection = &mut pooled;
        $op.await
    }};
}

#[async_trait]
impl RetailStore for PostgresStore {
    #[instrument(skip(self, new), fields(shop_id = %new.id), err)]
    async fn insert_shop(&self, new: NewShop) -> StoreResult<Shop> {
        transactional!(self, |conn| queries::insert_shop(conn, new))
    }

    #[instrument(skip(self), fields(shop_id = %id), err)]
    async fn get_shop(&self, id: ShopId) -> StoreResult<Shop> {
        read!(self, |conn| queries::get_shop(conn, id))
    }

    #[instrument(skip(self, patch), fields(shop_id = %id), err)]
    async fn update_shop(&self, id: ShopId, patch: ShopPatch) -> StoreResult<Shop> {
        transactional!(self, |conn| queries::update_shop(conn, id, patch))
    }

    #[instrument(skip(self), fields(shop_id = %id), err)]
    async fn delete_shop(&self, id: ShopId) -> StoreResult<()> {
        transactional!(self, |conn| queries::delete_shop(conn, id))
    }

    #[instrument(skip(self), err)]
    async fn list_shops(&self, order: ListOrder<ShopSort>) -> StoreResult<Vec<Shop>> {
        read!(self, |conn| queries::list_shops(conn, order))
    }

    #[instrument(skip(self, new), fields(category_id = %new.id, shops = new.shop_ids.len()), err)]
    async fn insert_category(&self, new: NewCategory) -> StoreResult<Category> {
        transactional!(self, |conn| queries::insert_category(conn, new))
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn get_category(&self, id: CategoryId) -> StoreResult<Category> {
        read!(self, |conn| queries::get_category(conn, id))
    }

    #[instrument(skip(self, patch), fields(category_id = %id), err)]
    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> StoreResult<Category> {
        transactional!(self, |conn| queries::update_category(conn, id, patch))
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        transactional!(self, |conn| queries::delete_category(conn, id))
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self, order: ListOrder<CategorySort>) -> StoreResult<Vec<Category>> {
        read!(self, |conn| queries::list_categories(conn, order))
    }

    #[instrument(skip(self), fields(category_id = %category_id, shop_id = %shop_id), err)]
    async fn link_category_shop(
        &self,
        category_id: CategoryId,
        shop_id: ShopId,
    ) -> StoreResult<bool> {
        transactional!(self, |conn| queries::link_category_shop(
            conn,
            category_id,
            shop_id
        ))
    }

    #[instrument(skip(self), fields(category_id = %category_id, shop_id = %shop_id), err)]
    async fn unlink_category_shop(
        &self,
        category_id: CategoryId,
        shop_id: ShopId,
    ) -> StoreResult<bool> {
        transactional!(self, |conn| queries::unlink_category_shop(
            conn,
            category_id,
            shop_id
        ))
    }

    #[instrument(skip(self), fields(category_id = %category_id), err)]
    async fn category_shops(
        &self,
        category_id: CategoryId,
        order: ListOrder<ShopSort>,
    ) -> StoreResult<Vec<Shop>> {
        read!(self, |conn| queries::category_shops(conn, category_id, order))
    }

    #[instrument(skip(self), fields(shop_id = %shop_id), err)]
    async fn shop_categories(
        &self,
        shop_id: ShopId,
        order: ListOrder<CategorySort>,
    ) -> StoreResult<Vec<Category>> {
        read!(self, |conn| queries::shop_categories(conn, shop_id, order))
    }

    #[instrument(skip(self, new), fields(product_id = %new.id, category_id = %new.category_id), err)]
    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product> {
        transactional!(self, |conn| queries::insert_product(conn, new))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        read!(self, |conn| queries::get_product(conn, id))
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        transactional!(self, |conn| queries::update_product(conn, id, patch))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        transactional!(self, |conn| queries::delete_product(conn, id))
    }

    #[instrument(skip(self), err)]
    async fn list_products(
        &self,
        category_id: Option<CategoryId>,
        order: ListOrder<ProductSort>,
    ) -> StoreResult<Vec<Product>> {
        read!(self, |conn| queries::list_products(conn, category_id, order))
    }

    #[instrument(
        skip(self, new),
        fields(
            product_info_id = %new.id,
            product_id = %new.product_id,
            shop_id = %new.shop_id
        ),
        err
    )]
    async fn insert_product_info(&self, new: NewProductInfo) -> StoreResult<ProductInfo> {
        transactional!(self, |conn| queries::insert_product_info(conn, new))
    }

    #[instrument(skip(self), fields(product_info_id = %id), err)]
    async fn get_product_info(&self, id: ProductInfoId) -> StoreResult<ProductInfo> {
        read!(self, |conn| queries::get_product_info(conn, id))
    }

    #[instrument(skip(self, patch), fields(product_info_id = %id), err)]
    async fn update_product_info(
        &self,
        id: ProductInfoId,
        patch: ProductInfoPatch,
    ) -> StoreResult<ProductInfo> {
        transactional!(self, |conn| queries::update_product_info(conn, id, patch))
    }

    #[instrument(skip(self), fields(product_info_id = %id), err)]
    async fn delete_product_info(&self, id: ProductInfoId) -> StoreResult<()> {
        transactional!(self, |conn| queries::delete_product_info(conn, id))
    }

    #[instrument(skip(self), err)]
    async fn list_product_infos(
        &self,
        filter: ProductInfoFilter,
        order: ListOrder<ProductInfoSort>,
    ) -> StoreResult<Vec<ProductInfo>> {
        read!(self, |conn| queries::list_product_infos(conn, filter, order))
    }

    #[instrument(skip(self, new), fields(parameter_id = %new.id), err)]
    async fn insert_parameter(&self, new: NewParameter) -> StoreResult<Parameter> {
        transactional!(self, |conn| queries::insert_parameter(conn, new))
    }

    #[instrument(skip(self), fields(parameter_id = %id), err)]
    async fn get_parameter(&self, id: ParameterId) -> StoreResult<Parameter> {
        read!(self, |conn| queries::get_parameter(conn, id))
    }

    #[instrument(skip(self, patch), fields(parameter_id = %id), err)]
    async fn update_parameter(
        &self,
        id: ParameterId,
        patch: ParameterPatch,
    ) -> StoreResult<Parameter> {
        transactional!(self, |conn| queries::update_parameter(conn, id, patch))
    }

    #[instrument(skip(self), fields(parameter_id = %id), err)]
    async fn delete_parameter(&self, id: ParameterId) -> StoreResult<()> {
        transactional!(self, |conn| queries::delete_parameter(conn, id))
    }

    #[instrument(skip(self), err)]
    async fn list_parameters(
        &self,
        order: ListOrder<ParameterSort>,
    ) -> StoreResult<Vec<Parameter>> {
        read!(self, |conn| queries::list_parameters(conn, order))
    }

    #[instrument(
        skip(self, new),
        fields(
            product_parameter_id = %new.id,
            product_info_id = %new.product_info_id,
            parameter_id = %new.parameter_id
        ),
        err
    )]
    async fn insert_product_parameter(
        &self,
        new: NewProductParameter,
    ) -> StoreResult<ProductParameter> {
        transactional!(self, |conn| queries::insert_product_parameter(conn, new))
    }

    #[instrument(skip(self), fields(product_parameter_id = %id), err)]
    async fn get_product_parameter(
        &self,
        id: ProductParameterId,
    ) -> StoreResult<ProductParameter> {
        read!(self, |conn| queries::get_product_parameter(conn, id))
    }

    #[instrument(skip(self, patch), fields(product_parameter_id = %id), err)]
    async fn update_product_parameter(
        &self,
        id: ProductParameterId,
        patch: ProductParameterPatch,
    ) -> StoreResult<ProductParameter> {
        transactional!(self, |conn| queries::update_product_parameter(conn, id, patch))
    }

    #[instrument(skip(self), fields(product_parameter_id = %id), err)]
    async fn delete_product_parameter(&self, id: ProductParameterId) -> StoreResult<()> {
        transactional!(self, |conn| queries::delete_product_parameter(conn, id))
    }

    #[instrument(skip(self), fields(product_info_id = %product_info_id), err)]
    async fn list_product_parameters(
        &self,
        product_info_id: ProductInfoId,
        order: ListOrder<ProductParameterSort>,
    ) -> StoreResult<Vec<ProductParameter>> {
        read!(self, |conn| queries::list_product_parameters(
            conn,
            product_info_id,
            order
        ))
    }

    #[instrument(skip(self), fields(parameter_id = %parameter_id), err)]
    async fn list_parameter_values(
        &self,
        parameter_id: ParameterId,
        order: ListOrder<ProductParameterSort>,
    ) -> StoreResult<Vec<ProductParameter>> {
        read!(self, |conn| queries::list_parameter_values(conn, parameter_id, order))
    }

    #[instrument(skip(self, new), fields(order_id = %new.id, user_id = %new.user_id), err)]
    async fn insert_order(&self, new: NewOrder) -> StoreResult<Order> {
        transactional!(self, |conn| queries::insert_order(conn, new))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        read!(self, |conn| queries::get_order(conn, id))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> StoreResult<Order> {
        transactional!(self, |conn| queries::update_order(conn, id, patch))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        transactional!(self, |conn| queries::delete_order(conn, id))
    }

    #[instrument(skip(self), err)]
    async fn list_orders(
        &self,
        user_id: Option<UserId>,
        order: ListOrder<OrderSort>,
    ) -> StoreResult<Vec<Order>> {
        read!(self, |conn| queries::list_orders(conn, user_id, order))
    }

    #[instrument(
        skip(self, new),
        fields(
            order_item_id = %new.id,
            order_id = %new.order_id,
            product_info_id = %new.product_info_id
        ),
        err
    )]
    async fn insert_order_item(&self, new: NewOrderItem) -> StoreResult<OrderItem> {
        transactional!(self, |conn| queries::insert_order_item(conn, new))
    }

    #[instrument(skip(self), fields(order_item_id = %id), err)]
    async fn get_order_item(&self, id: OrderItemId) -> StoreResult<OrderItem> {
        read!(self, |conn| queries::get_order_item(conn, id))
    }

    #[instrument(skip(self), fields(order_item_id = %id), err)]
    async fn update_order_item(
        &self,
        id: OrderItemId,
        patch: OrderItemPatch,
    ) -> StoreResult<OrderItem> {
        transactional!(self, |conn| queries::update_order_item(conn, id, patch))
    }

    #[instrument(skip(self), fields(order_item_id = %id), err)]
    async fn delete_order_item(&self, id: OrderItemId) -> StoreResult<()> {
        transactional!(self, |conn| queries::delete_order_item(conn, id))
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn list_order_items(
        &self,
        order_id: OrderId,
        order: ListOrder<OrderItemSort>,
    ) -> StoreResult<Vec<OrderItem>> {
        read!(self, |conn| queries::list_order_items(conn, order_id, order))
    }

    #[instrument(skip(self), fields(product_info_id = %product_info_id), err)]
    async fn list_product_info_order_items(
        &self,
        product_info_id: ProductInfoId,
        order: ListOrder<OrderItemSort>,
    ) -> StoreResult<Vec<OrderItem>> {
        read!(self, |conn| queries::list_product_info_order_items(
            conn,
            product_info_id,
            order
        ))
    }

    #[instrument(skip(self, batch), fields(writes = batch.len()), err)]
    async fn apply(&self, batch: WriteBatch) -> StoreResult<Vec<Written>> {
        if batch.is_empty() {
            return Ok(vec![]);
        }
        let mut tx = self.begin().await?;
        let mut written = Vec::with_capacity(batch.len());
        for write in batch {
            written.push(queries::apply_write(&mut tx, write).await?);
        }
        Self::commit(tx).await?;
        Ok(written)
    }
}

/// Map a SQLx error to the store taxonomy.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let detail = format!("{operation}: {}", db_err.message());
            let code = db_err.code();
            let constraint = db_err.constraint().and_then(Constraint::from_name);
            match (code.as_deref(), constraint) {
                (Some("23505"), Some(c)) if c.kind() == ConstraintKind::Unique => {
                    StoreError::UniqueViolation {
                        constraint: c,
                        detail,
                    }
                }
                (Some("23505"), _) => StoreError::AlreadyExists {
                    entity: db_err.table().and_then(entity_for_table).unwrap_or("row"),
                    id: db_err
                        .try_downcast_ref::<PgDatabaseError>()
                        .and_then(|pg| pg.detail())
                        .and_then(duplicate_key)
                        .unwrap_or("unknown")
                        .to_string(),
                },
                (Some("23503"), Some(c)) => StoreError::ReferentialIntegrity {
                    constraint: c,
                    detail,
                },
                (Some("23514" | "23502" | "22001" | "22003" | "22P02"), _) => {
                    StoreError::Validation(detail)
                }
                _ => StoreError::Backend(detail),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("{operation}: connection pool timed out"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("{operation}: connection pool closed"))
        }
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

/// Key value from a unique-violation detail: `Key (id)=(<value>) already exists.`
fn duplicate_key(detail: &str) -> Option<&str> {
    let (_, rest) = detail.strip_prefix("Key (")?.split_once(")=(")?;
    let (value, _) = rest.rsplit_once(") already exists")?;
    Some(value)
}

fn entity_for_table(table: &str) -> Option<&'static str> {
    Some(match table {
        "shops" => "shop",
        "categories" => "category",
        "products" => "product",
        "product_infos" => "product_info",
        "parameters" => "parameter",
        "product_parameters" => "product_parameter",
        "orders" => "order",
        "order_items" => "order_item",
        _ => return None,
    })
}
