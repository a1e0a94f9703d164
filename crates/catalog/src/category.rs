use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use retail_core::validation::required_text;
use retail_core::{CategoryId, Direction, DomainResult, Entity, ShopId, SortKey};

/// Maximum category name length (characters).
pub const CATEGORY_NAME_MAX: usize = 80;

/// A grouping of products, offered by zero or more shops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Entity for Category {
    type Id = CategoryId;
    const KIND: &'static str = "category";

    fn id(&self) -> &CategoryId {
        &self.id
    }
}

/// Association row between a shop and a category it offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShopCategory {
    pub shop_id: ShopId,
    pub category_id: CategoryId,
}

/// Insert payload for a category, together with the shops offering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub id: CategoryId,
    pub name: String,
    pub shop_ids: Vec<ShopId>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            shop_ids: Vec::new(),
        }
    }

    pub fn with_shops(mut self, shop_ids: impl IntoIterator<Item = ShopId>) -> Self {
        self.shop_ids.extend(shop_ids);
        self
    }

    /// Validate the payload and build the record plus its (deduplicated) links.
    pub fn into_record(self) -> DomainResult<(Category, Vec<ShopCategory>)> {
        validate_name(&self.name)?;
        let mut links: Vec<ShopCategory> = self
            .shop_ids
            .into_iter()
            .map(|shop_id| ShopCategory {
                shop_id,
                category_id: self.id,
            })
            .collect();
        links.sort();
        links.dedup();
        Ok((
            Category {
                id: self.id,
                name: self.name,
            },
            links,
        ))
    }
}

/// Partial update of a category. Shop membership is managed through link/unlink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
}

impl CategoryPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn apply(self, category: &mut Category) -> DomainResult<()> {
        if let Some(name) = self.name {
            validate_name(&name)?;
            category.name = name;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    required_text("category name", name, CATEGORY_NAME_MAX)
}

/// Sort keys for category listings. Default: name, descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySort {
    #[default]
    Name,
    Id,
}

impl SortKey for CategorySort {
    type Record = Category;
    const DEFAULT_DIRECTION: Direction = Direction::Descending;

    fn column(&self) -> &'static str {
        match self {
            CategorySort::Name => "name",
            CategorySort::Id => "id",
        }
    }

    fn compare(&self, a: &Category, b: &Category) -> Ordering {
        match self {
            CategorySort::Name => a.name.cmp(&b.name),
            CategorySort::Id => a.id.cmp(&b.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_shops_collapse_to_one_link() {
        let shop = ShopId::new();
        let (category, links) = NewCategory::new("Tools")
            .with_shops([shop, shop])
            .into_record()
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].category_id, category.id);
        assert_eq!(links[0].shop_id, shop);
    }

    #[test]
    fn name_limit_is_eighty_characters() {
        assert!(NewCategory::new("c".repeat(80)).into_record().is_ok());
        assert!(NewCategory::new("c".repeat(81)).into_record().is_err());
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let (mut category, _) = NewCategory::new("Tools").into_record().unwrap();
        CategoryPatch::default().apply(&mut category).unwrap();
        assert_eq!(category.name, "Tools");
    }
}
