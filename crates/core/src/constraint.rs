//! Catalogue of the named relational constraints.
//!
//! The names are used verbatim as PostgreSQL constraint names, so an error raised
//! by the database maps back to the same value the in-memory store reports.

use serde::{Deserialize, Serialize};

/// What a constraint guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
}

/// A named uniqueness or foreign-key constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// (shop, category) association pair.
    ShopCategoryPair,
    /// (product, shop, external_id) on product listings.
    UniqueProductInfo,
    /// (product_info, parameter) on listing attributes.
    UniqueProductParameter,
    /// (order, product_info) on order lines.
    UniqueOrderItem,

    ShopCategoryShop,
    ShopCategoryCategory,
    ProductCategory,
    ProductInfoProduct,
    ProductInfoShop,
    ProductParameterProductInfo,
    ProductParameterParameter,
    OrderUser,
    OrderItemOrder,
    OrderItemProductInfo,
}

impl Constraint {
    pub const ALL: [Constraint; 14] = [
        Constraint::ShopCategoryPair,
        Constraint::UniqueProductInfo,
        Constraint::UniqueProductParameter,
        Constraint::UniqueOrderItem,
        Constraint::ShopCategoryShop,
        Constraint::ShopCategoryCategory,
        Constraint::ProductCategory,
        Constraint::ProductInfoProduct,
        Constraint::ProductInfoShop,
        Constraint::ProductParameterProductInfo,
        Constraint::ProductParameterParameter,
        Constraint::OrderUser,
        Constraint::OrderItemOrder,
        Constraint::OrderItemProductInfo,
    ];

    /// Constraint name in the relational schema.
    pub fn name(self) -> &'static str {
        match self {
            Constraint::ShopCategoryPair => "shop_categories_pkey",
            Constraint::UniqueProductInfo => "unique_product_info",
            Constraint::UniqueProductParameter => "unique_product_parameter",
            Constraint::UniqueOrderItem => "unique_order_item",
            Constraint::ShopCategoryShop => "shop_categories_shop_id_fkey",
            Constraint::ShopCategoryCategory => "shop_categories_category_id_fkey",
            Constraint::ProductCategory => "products_category_id_fkey",
            Constraint::ProductInfoProduct => "product_infos_product_id_fkey",
            Constraint::ProductInfoShop => "product_infos_shop_id_fkey",
            Constraint::ProductParameterProductInfo => "product_parameters_product_info_id_fkey",
            Constraint::ProductParameterParameter => "product_parameters_parameter_id_fkey",
            Constraint::OrderUser => "orders_user_id_fkey",
            Constraint::OrderItemOrder => "order_items_order_id_fkey",
            Constraint::OrderItemProductInfo => "order_items_product_info_id_fkey",
        }
    }

    pub fn kind(self) -> ConstraintKind {
        match self {
            Constraint::ShopCategoryPair
            | Constraint::UniqueProductInfo
            | Constraint::UniqueProductParameter
            | Constraint::UniqueOrderItem => ConstraintKind::Unique,
            _ => ConstraintKind::ForeignKey,
        }
    }

    /// Look a constraint up by its schema name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl core::fmt::Display for Constraint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_resolvable() {
        let names: HashSet<&str> = Constraint::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Constraint::ALL.len());
        for c in Constraint::ALL {
            assert_eq!(Constraint::from_name(c.name()), Some(c));
        }
        assert_eq!(Constraint::from_name("no_such_constraint"), None);
    }

    #[test]
    fn uniqueness_constraints_are_classified() {
        let unique: Vec<Constraint> = Constraint::ALL
            .into_iter()
            .filter(|c| c.kind() == ConstraintKind::Unique)
            .collect();
        assert_eq!(unique.len(), 4);
        assert!(unique.contains(&Constraint::UniqueOrderItem));
    }
}
