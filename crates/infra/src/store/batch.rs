//! Write batches: ordered lists of writes committed atomically.
//!
//! A batch is the unit for grouped changes such as "add an order item and
//! decrement the listing's stock". Both stores apply the writes in order inside a
//! single transaction; if any write fails, none of them is visible.

use retail_catalog::{
    Category, CategoryPatch, NewCategory, NewParameter, NewProduct, NewProductInfo,
    NewProductParameter, NewShop, Parameter, ParameterPatch, Product, ProductInfo,
    ProductInfoPatch, ProductParameter, ProductParameterPatch, ProductPatch, Shop, ShopPatch,
};
use retail_core::{
    CategoryId, OrderId, OrderItemId, ParameterId, ProductId, ProductInfoId, ProductParameterId,
    ShopId,
};
use retail_orders::{NewOrder, NewOrderItem, Order, OrderItem, OrderItemPatch, OrderPatch};

/// One write of a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    InsertShop(NewShop),
    UpdateShop(ShopId, ShopPatch),
    DeleteShop(ShopId),

    InsertCategory(NewCategory),
    UpdateCategory(CategoryId, CategoryPatch),
    DeleteCategory(CategoryId),
    LinkCategoryShop(CategoryId, ShopId),
    UnlinkCategoryShop(CategoryId, ShopId),

    InsertProduct(NewProduct),
    UpdateProduct(ProductId, ProductPatch),
    DeleteProduct(ProductId),

    InsertProductInfo(NewProductInfo),
    UpdateProductInfo(ProductInfoId, ProductInfoPatch),
    DeleteProductInfo(ProductInfoId),

    InsertParameter(NewParameter),
    UpdateParameter(ParameterId, ParameterPatch),
    DeleteParameter(ParameterId),

    InsertProductParameter(NewProductParameter),
    UpdateProductParameter(ProductParameterId, ProductParameterPatch),
    DeleteProductParameter(ProductParameterId),

    InsertOrder(NewOrder),
    UpdateOrder(OrderId, OrderPatch),
    DeleteOrder(OrderId),

    InsertOrderItem(NewOrderItem),
    UpdateOrderItem(OrderItemId, OrderItemPatch),
    DeleteOrderItem(OrderItemId),
}

impl Write {
    /// Operation name used in logs and error details.
    pub fn operation(&self) -> &'static str {
        match self {
            Write::InsertShop(_) => "insert_shop",
            Write::UpdateShop(..) => "update_shop",
            Write::DeleteShop(_) => "delete_shop",
            Write::InsertCategory(_) => "insert_category",
            Write::UpdateCategory(..) => "update_category",
            Write::DeleteCategory(_) => "delete_category",
            Write::LinkCategoryShop(..) => "link_category_shop",
            Write::UnlinkCategoryShop(..) => "unlink_category_shop",
            Write::InsertProduct(_) => "insert_product",
            Write::UpdateProduct(..) => "update_product",
            Write::DeleteProduct(_) => "delete_product",
            Write::InsertProductInfo(_) => "insert_product_info",
            Write::UpdateProductInfo(..) => "update_product_info",
            Write::DeleteProductInfo(_) => "delete_product_info",
            Write::InsertParameter(_) => "insert_parameter",
            Write::UpdateParameter(..) => "update_parameter",
            Write::DeleteParameter(_) => "delete_parameter",
            Write::InsertProductParameter(_) => "insert_product_parameter",
            Write::UpdateProductParameter(..) => "update_product_parameter",
            Write::DeleteProductParameter(_) => "delete_product_parameter",
            Write::InsertOrder(_) => "insert_order",
            Write::UpdateOrder(..) => "update_order",
            Write::DeleteOrder(_) => "delete_order",
            Write::InsertOrderItem(_) => "insert_order_item",
            Write::UpdateOrderItem(..) => "update_order_item",
            Write::DeleteOrderItem(_) => "delete_order_item",
        }
    }
}

macro_rules! insert_from {
    ($($payload:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for Write {
                fn from(payload: $payload) -> Self {
                    Write::$variant(payload)
                }
            }
        )*
    };
}

insert_from! {
    NewShop => InsertShop,
    NewCategory => InsertCategory,
    NewProduct => InsertProduct,
    NewProductInfo => InsertProductInfo,
    NewParameter => InsertParameter,
    NewProductParameter => InsertProductParameter,
    NewOrder => InsertOrder,
    NewOrderItem => InsertOrderItem,
}

/// Result of one applied [`Write`]: the row as stored after the write.
#[derive(Debug, Clone, PartialEq)]
pub enum Written {
    Shop(Shop),
    Category(Category),
    Product(Product),
    ProductInfo(ProductInfo),
    Parameter(Parameter),
    ProductParameter(ProductParameter),
    Order(Order),
    OrderItem(OrderItem),
    /// Outcome of a link/unlink: whether the association set changed.
    Association(bool),
    Deleted,
}

/// An ordered list of writes applied atomically by [`RetailStore::apply`].
///
/// [`RetailStore::apply`]: super::RetailStore::apply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: impl Into<Write>) -> &mut Self {
        self.writes.push(write.into());
        self
    }

    pub fn with(mut self, write: impl Into<Write>) -> Self {
        self.writes.push(write.into());
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }
}

impl FromIterator<Write> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = Write>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for WriteBatch {
    type Item = Write;
    type IntoIter = std::vec::IntoIter<Write>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}
