//! Shop listings: the concrete, sellable unit of the catalog.
//!
//! A listing ties a [`Product`](crate::Product) to a [`Shop`](crate::Shop) with
//! the shop's own name, stock and prices. `external_id` is the listing's id in the
//! shop's price list; `(product, shop, external_id)` is unique.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use retail_core::validation::{non_negative, required_text};
use retail_core::{Direction, DomainResult, Entity, ProductId, ProductInfoId, ShopId, SortKey};

/// Maximum listing name length (characters).
pub const PRODUCT_INFO_NAME_MAX: usize = 100;

/// A shop's listing of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: ProductInfoId,
    pub product_id: ProductId,
    pub shop_id: ShopId,
    pub external_id: u32,
    pub name: String,
    pub quantity: u32,
    /// Price in the smallest currency unit.
    pub price: u32,
    /// Recommended retail price in the smallest currency unit.
    pub price_rrc: u32,
}

impl Entity for ProductInfo {
    type Id = ProductInfoId;
    const KIND: &'static str = "product_info";

    fn id(&self) -> &ProductInfoId {
        &self.id
    }
}

/// Insert payload for a listing.
///
/// Integer fields are signed so that a negative input is reported as a
/// validation failure rather than being unrepresentable upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductInfo {
    pub id: ProductInfoId,
    pub product_id: ProductId,
    pub shop_id: ShopId,
    pub external_id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: i64,
    pub price_rrc: i64,
}

impl NewProductInfo {
    pub fn new(
        product_id: ProductId,
        shop_id: ShopId,
        external_id: i64,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: ProductInfoId::new(),
            product_id,
            shop_id,
            external_id,
            name: name.into(),
            quantity: 0,
            price: 0,
            price_rrc: 0,
        }
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn price(mut self, price: i64) -> Self {
        self.price = price;
        self
    }

    pub fn price_rrc(mut self, price_rrc: i64) -> Self {
        self.price_rrc = price_rrc;
        self
    }

    pub fn into_record(self) -> DomainResult<ProductInfo> {
        validate_name(&self.name)?;
        Ok(ProductInfo {
            id: self.id,
            product_id: self.product_id,
            shop_id: self.shop_id,
            external_id: non_negative("external_id", self.external_id)?,
            name: self.name,
            quantity: non_negative("quantity", self.quantity)?,
            price: non_negative("price", self.price)?,
            price_rrc: non_negative("price_rrc", self.price_rrc)?,
        })
    }
}

/// Partial update of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfoPatch {
    pub product_id: Option<ProductId>,
    pub shop_id: Option<ShopId>,
    pub external_id: Option<i64>,
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<i64>,
    pub price_rrc: Option<i64>,
}

impl ProductInfoPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn price(mut self, price: i64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn price_rrc(mut self, price_rrc: i64) -> Self {
        self.price_rrc = Some(price_rrc);
        self
    }

    pub fn external_id(mut self, external_id: i64) -> Self {
        self.external_id = Some(external_id);
        self
    }

    /// Validate every supplied field, then apply them all. On error `info` is untouched.
    pub fn apply(self, info: &mut ProductInfo) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        let external_id = self
            .external_id
            .map(|v| non_negative("external_id", v))
            .transpose()?;
        let quantity = self.quantity.map(|v| non_negative("quantity", v)).transpose()?;
        let price = self.price.map(|v| non_negative("price", v)).transpose()?;
        let price_rrc = self
            .price_rrc
            .map(|v| non_negative("price_rrc", v))
            .transpose()?;

        if let Some(product_id) = self.product_id {
            info.product_id = product_id;
        }
        if let Some(shop_id) = self.shop_id {
            info.shop_id = shop_id;
        }
        if let Some(external_id) = external_id {
            info.external_id = external_id;
        }
        if let Some(name) = self.name {
            info.name = name;
        }
        if let Some(quantity) = quantity {
            info.quantity = quantity;
        }
        if let Some(price) = price {
            info.price = price;
        }
        if let Some(price_rrc) = price_rrc {
            info.price_rrc = price_rrc;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    required_text("product info name", name, PRODUCT_INFO_NAME_MAX)
}

/// Restricts a listing query to one product and/or one shop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfoFilter {
    pub product_id: Option<ProductId>,
    pub shop_id: Option<ShopId>,
}

impl ProductInfoFilter {
    pub fn product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            shop_id: None,
        }
    }

    pub fn shop(shop_id: ShopId) -> Self {
        Self {
            product_id: None,
            shop_id: Some(shop_id),
        }
    }

    pub fn matches(&self, info: &ProductInfo) -> bool {
        self.product_id.is_none_or(|id| id == info.product_id)
            && self.shop_id.is_none_or(|id| id == info.shop_id)
    }
}

/// Sort keys for listing queries. Default: id ascending (insertion order).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductInfoSort {
    #[default]
    Id,
    Name,
    Price,
    Quantity,
}

impl SortKey for ProductInfoSort {
    type Record = ProductInfo;
    const DEFAULT_DIRECTION: Direction = Direction::Ascending;

    fn column(&self) -> &'static str {
        match self {
            ProductInfoSort::Id => "id",
            ProductInfoSort::Name => "name",
            ProductInfoSort::Price => "price",
            ProductInfoSort::Quantity => "quantity",
        }
    }

    fn compare(&self, a: &ProductInfo, b: &ProductInfo) -> Ordering {
        match self {
            ProductInfoSort::Id => a.id.cmp(&b.id),
            ProductInfoSort::Name => a.name.cmp(&b.name),
            ProductInfoSort::Price => a.price.cmp(&b.price),
            ProductInfoSort::Quantity => a.quantity.cmp(&b.quantity),
        }
    }
}
