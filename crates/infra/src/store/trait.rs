use async_trait::async_trait;
use thiserror::Error;

use retail_catalog::{
    Category, CategoryPatch, CategorySort, NewCategory, NewParameter, NewProduct, NewProductInfo,
    NewProductParameter, NewShop, Parameter, ParameterPatch, ParameterSort, Product,
    ProductInfo, ProductInfoFilter, ProductInfoPatch, ProductInfoSort, ProductParameter,
    ProductParameterPatch, ProductParameterSort, ProductPatch, ProductSort, Shop, ShopPatch,
    ShopSort,
};
use retail_core::{
    CategoryId, Constraint, DomainError, ListOrder, OrderId, OrderItemId, ParameterId,
    ProductId, ProductInfoId, ProductParameterId, ShopId, UserId,
};
use retail_orders::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderItemPatch, OrderItemSort, OrderPatch,
    OrderSort,
};

use super::batch::{WriteBatch, Written};

/// Store operation error.
///
/// Every rejected write reports one of these and leaves all rows unchanged.
///
/// ## Error Categories
///
/// - **Validation**: field length/range/status violations, whether caught while
///   building the record or by a database CHECK
/// - **UniqueViolation** / **ReferentialIntegrity**: a named [`Constraint`] was violated
/// - **AlreadyExists**: the caller-chosen primary key is taken
/// - **NotFound**: the addressed row does not exist
/// - **Backend**: connection, transaction or decoding failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unique constraint {constraint} violated: {detail}")]
    UniqueViolation {
        constraint: Constraint,
        detail: String,
    },

    #[error("referential integrity constraint {constraint} violated: {detail}")]
    ReferentialIntegrity {
        constraint: Constraint,
        detail: String,
    },

    #[error("{entity} {id} already exists")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unique(constraint: Constraint, detail: impl Into<String>) -> Self {
        Self::UniqueViolation {
            constraint,
            detail: detail.into(),
        }
    }

    pub fn referential(constraint: Constraint, detail: impl Into<String>) -> Self {
        Self::ReferentialIntegrity {
            constraint,
            detail: detail.into(),
        }
    }

    /// The violated constraint, for unique and referential integrity errors.
    pub fn constraint(&self) -> Option<Constraint> {
        match self {
            StoreError::UniqueViolation { constraint, .. }
            | StoreError::ReferentialIntegrity { constraint, .. } => Some(*constraint),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                StoreError::Validation(msg)
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for the retail schema.
///
/// Every write is atomic. Inserts take caller-chosen ids (see the `New*`
/// payloads), so a [`WriteBatch`] can reference rows created earlier in the same
/// batch. Deletes cascade to dependent rows.
///
/// Listing operations never fail for an unknown parent id; they return an empty list.
#[async_trait]
pub trait RetailStore: Send + Sync {
    async fn insert_shop(&self, new: NewShop) -> StoreResult<Shop>;
    async fn get_shop(&self, id: ShopId) -> StoreResult<Shop>;
    async fn update_shop(&self, id: ShopId, patch: ShopPatch) -> StoreResult<Shop>;
    /// Delete a shop and, transitively, its listings and their dependents.
    async fn delete_shop(&self, id: ShopId) -> StoreResult<()>;
    async fn list_shops(&self, order: ListOrder<ShopSort>) -> StoreResult<Vec<Shop>>;

    /// Insert a category together with its initial shop links.
    async fn insert_category(&self, new: NewCategory) -> StoreResult<Category>;
    async fn get_category(&self, id: CategoryId) -> StoreResult<Category>;
    async fn update_category(&self, id: CategoryId, patch: CategoryPatch)
    -> StoreResult<Category>;
    /// Delete a category and, transitively, its products.
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()>;
    async fn list_categories(&self, order: ListOrder<CategorySort>) -> StoreResult<Vec<Category>>;

    /// Associate a category with a shop. Returns `false` if the link already existed.
    async fn link_category_shop(&self, category_id: CategoryId, shop_id: ShopId)
    -> StoreResult<bool>;
    /// Remove an association. Returns `false` if there was nothing to remove.
    async fn unlink_category_shop(
        &self,
        category_id: CategoryId,
        shop_id: ShopId,
    ) -> StoreResult<bool>;
    async fn category_shops(
        &self,
        category_id: CategoryId,
        order: ListOrder<ShopSort>,
    ) -> StoreResult<Vec<Shop>>;
    async fn shop_categories(
        &self,
        shop_id: ShopId,
        order: ListOrder<CategorySort>,
    ) -> StoreResult<Vec<Category>>;

    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product>;
    async fn get_product(&self, id: ProductId) -> StoreResult<Product>;
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product>;
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
    async fn list_products(
        &self,
        category_id: Option<CategoryId>,
        order: ListOrder<ProductSort>,
    ) -> StoreResult<Vec<Product>>;

    async fn insert_product_info(&self, new: NewProductInfo) -> StoreResult<ProductInfo>;
    async fn get_product_info(&self, id: ProductInfoId) -> StoreResult<ProductInfo>;
    async fn update_product_info(
        &self,
        id: ProductInfoId,
        patch: ProductInfoPatch,
    ) -> StoreResult<ProductInfo>;
    /// Delete a listing together with its parameters and order items.
    async fn delete_product_info(&self, id: ProductInfoId) -> StoreResult<()>;
    async fn list_product_infos(
        &self,
        filter: ProductInfoFilter,
        order: ListOrder<ProductInfoSort>,
    ) -> StoreResult<Vec<ProductInfo>>;

    async fn insert_parameter(&self, new: NewParameter) -> StoreResult<Parameter>;
    async fn get_parameter(&self, id: ParameterId) -> StoreResult<Parameter>;
    async fn update_parameter(
        &self,
        id: ParameterId,
        patch: ParameterPatch,
    ) -> StoreResult<Parameter>;
    async fn delete_parameter(&self, id: ParameterId) -> StoreResult<()>;
    async fn list_parameters(&self, order: ListOrder<ParameterSort>)
    -> StoreResult<Vec<Parameter>>;

    async fn insert_product_parameter(
        &self,
        new: NewProductParameter,
    ) -> StoreResult<ProductParameter>;
    async fn get_product_parameter(&self, id: ProductParameterId)
    -> StoreResult<ProductParameter>;
    async fn update_product_parameter(
        &self,
        id: ProductParameterId,
        patch: ProductParameterPatch,
    ) -> StoreResult<ProductParameter>;
    async fn delete_product_parameter(&self, id: ProductParameterId) -> StoreResult<()>;
    async fn list_product_parameters(
        &self,
        product_info_id: ProductInfoId,
        order: ListOrder<ProductParameterSort>,
    ) -> StoreResult<Vec<ProductParameter>>;
    /// Every listing's value for one parameter.
    async fn list_parameter_values(
        &self,
        parameter_id: ParameterId,
        order: ListOrder<ProductParameterSort>,
    ) -> StoreResult<Vec<ProductParameter>>;

    /// Insert an order. `created_at` and `updated_at` are assigned by the store.
    async fn insert_order(&self, new: NewOrder) -> StoreResult<Order>;
    async fn get_order(&self, id: OrderId) -> StoreResult<Order>;
    /// Update an order; `updated_at` is refreshed even for an empty patch.
    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> StoreResult<Order>;
    async fn delete_order(&self, id: OrderId) -> StoreResult<()>;
    async fn list_orders(
        &self,
        user_id: Option<UserId>,
        order: ListOrder<OrderSort>,
    ) -> StoreResult<Vec<Order>>;

    async fn insert_order_item(&self, new: NewOrderItem) -> StoreResult<OrderItem>;
    async fn get_order_item(&self, id: OrderItemId) -> StoreResult<OrderItem>;
    async fn update_order_item(
        &self,
        id: OrderItemId,
        patch: OrderItemPatch,
    ) -> StoreResult<OrderItem>;
    async fn delete_order_item(&self, id: OrderItemId) -> StoreResult<()>;
    async fn list_order_items(
        &self,
        order_id: OrderId,
        order: ListOrder<OrderItemSort>,
    ) -> StoreResult<Vec<OrderItem>>;
    /// Order items, across all orders, that reference one listing.
    async fn list_product_info_order_items(
        &self,
        product_info_id: ProductInfoId,
        order: ListOrder<OrderItemSort>,
    ) -> StoreResult<Vec<OrderItem>>;

    /// Apply every write of `batch` in order, atomically.
    ///
    /// Returns one [`Written`] per write. If any write fails nothing is applied and
    /// the first error is returned.
    async fn apply(&self, batch: WriteBatch) -> StoreResult<Vec<Written>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_become_validation_errors() {
        let err: StoreError = DomainError::validation("price must be non-negative (got -1)").into();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "validation failed: price must be non-negative (got -1)"
        );
    }

    #[test]
    fn constraint_is_exposed_for_relational_errors() {
        let err = StoreError::unique(Constraint::UniqueOrderItem, "duplicate");
        assert_eq!(err.constraint(), Some(Constraint::UniqueOrderItem));
        assert!(StoreError::not_found("shop", ShopId::new()).constraint().is_none());
    }
}
