//! Catalog records: shops, categories, products and shop listings.
//!
//! Every record type comes with an insert payload (`New*`), a partial update
//! (`*Patch`) and a sort key. Payloads validate themselves; stores only add the
//! relational checks (uniqueness, foreign keys).

pub mod category;
pub mod parameter;
pub mod product;
pub mod product_info;
pub mod shop;

pub use category::{
    CATEGORY_NAME_MAX, Category, CategoryPatch, CategorySort, NewCategory, ShopCategory,
};
pub use parameter::{
    NewParameter, NewProductParameter, PARAMETER_NAME_MAX, PARAMETER_VALUE_MAX, Parameter,
    ParameterPatch, ParameterSort, ProductParameter, ProductParameterPatch, ProductParameterSort,
};
pub use product::{NewProduct, PRODUCT_NAME_MAX, Product, ProductPatch, ProductSort};
pub use product_info::{
    NewProductInfo, PRODUCT_INFO_NAME_MAX, ProductInfo, ProductInfoFilter, ProductInfoPatch,
    ProductInfoSort,
};
pub use shop::{NewShop, SHOP_NAME_MAX, SHOP_URL_MAX, Shop, ShopPatch, ShopSort};
