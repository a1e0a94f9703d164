use core::cmp::Ordering;

use serde::{Deserialize, Serialize};
use url::Url;

use retail_core::validation::{bounded_text, required_text};
use retail_core::{Direction, DomainError, DomainResult, Entity, ShopId, SortKey};

/// Maximum shop name length (characters).
pub const SHOP_NAME_MAX: usize = 50;

/// Maximum shop URL length (characters).
pub const SHOP_URL_MAX: usize = 200;

const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// A seller offering products for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub url: Option<String>,
}

impl Entity for Shop {
    type Id = ShopId;
    const KIND: &'static str = "shop";

    fn id(&self) -> &ShopId {
        &self.id
    }
}

/// Insert payload for a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShop {
    pub id: ShopId,
    pub name: String,
    pub url: Option<String>,
}

impl NewShop {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ShopId::new(),
            name: name.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Validate the payload and build the stored record.
    pub fn into_record(self) -> DomainResult<Shop> {
        validate_name(&self.name)?;
        if let Some(url) = &self.url {
            validate_url(url)?;
        }
        Ok(Shop {
            id: self.id,
            name: self.name,
            url: self.url,
        })
    }
}

/// Partial update of a shop. `url: Some(None)` clears the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopPatch {
    pub name: Option<String>,
    pub url: Option<Option<String>>,
}

impl ShopPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn url(mut self, url: Option<String>) -> Self {
        self.url = Some(url);
        self
    }

    /// Validate the patch and apply it to `shop`. On error `shop` is untouched.
    pub fn apply(self, shop: &mut Shop) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(Some(url)) = &self.url {
            validate_url(url)?;
        }
        if let Some(name) = self.name {
            shop.name = name;
        }
        if let Some(url) = self.url {
            shop.url = url;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    required_text("shop name", name, SHOP_NAME_MAX)
}

fn validate_url(url: &str) -> DomainResult<()> {
    bounded_text("shop url", url, SHOP_URL_MAX)?;
    let parsed =
        Url::parse(url).map_err(|e| DomainError::validation(format!("shop url: {e}")))?;
    if !URL_SCHEMES.contains(&parsed.scheme()) {
        return Err(DomainError::validation(format!(
            "shop url: unsupported scheme '{}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(DomainError::validation("shop url: missing host"));
    }
    Ok(())
}

/// Sort keys for shop listings. Default: name, descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopSort {
    #[default]
    Name,
    Id,
}

impl SortKey for ShopSort {
    type Record = Shop;
    const DEFAULT_DIRECTION: Direction = Direction::Descending;

    fn column(&self) -> &'static str {
        match self {
            ShopSort::Name => "name",
            ShopSort::Id => "id",
        }
    }

    fn compare(&self, a: &Shop, b: &Shop) -> Ordering {
        match self {
            ShopSort::Name => a.name.cmp(&b.name),
            ShopSort::Id => a.id.cmp(&b.id),
        }
    }
}
