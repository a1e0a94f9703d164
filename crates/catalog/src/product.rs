use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use retail_core::validation::required_text;
use retail_core::{CategoryId, Direction, DomainResult, Entity, ProductId, SortKey};

/// Maximum product name length (characters).
pub const PRODUCT_NAME_MAX: usize = 80;

/// An abstract catalog item, independent of any shop's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "product";

    fn id(&self) -> &ProductId {
        &self.id
    }
}

/// Insert payload for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, category_id: CategoryId) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            category_id,
        }
    }

    pub fn into_record(self) -> DomainResult<Product> {
        validate_name(&self.name)?;
        Ok(Product {
            id: self.id,
            name: self.name,
            category_id: self.category_id,
        })
    }
}

/// Partial update of a product (rename and/or move to another category).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn apply(self, product: &mut Product) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    required_text("product name", name, PRODUCT_NAME_MAX)
}

/// Sort keys for product listings. Default: name, descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    Id,
}

impl SortKey for ProductSort {
    type Record = Product;
    const DEFAULT_DIRECTION: Direction = Direction::Descending;

    fn column(&self) -> &'static str {
        match self {
            ProductSort::Name => "name",
            ProductSort::Id => "id",
        }
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            ProductSort::Name => a.name.cmp(&b.name),
            ProductSort::Id => a.id.cmp(&b.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retail_core::{DomainError, ListOrder};

    #[test]
    fn blank_name_is_rejected() {
        let err = NewProduct::new("  ", CategoryId::new()).into_record().unwrap_err();
        assert_eq!(err, DomainError::validation("product name cannot be empty"));
    }

    #[test]
    fn patch_moves_product_between_categories() {
        let mut product = NewProduct::new("Hammer", CategoryId::new()).into_record().unwrap();
        let target = CategoryId::new();
        ProductPatch::default().category(target).apply(&mut product).unwrap();
        assert_eq!(product.category_id, target);
    }

    #[test]
    fn default_listing_is_name_descending() {
        let category = CategoryId::new();
        let mut products: Vec<Product> = ["Axe", "Hammer", "Chisel"]
            .into_iter()
            .map(|n| NewProduct::new(n, category).into_record().unwrap())
            .collect();
        ListOrder::<ProductSort>::default().sort(&mut products);
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Hammer", "Chisel", "Axe"]);
    }
}
