use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use retail_core::validation::positive;
use retail_core::{Direction, DomainResult, Entity, OrderId, OrderItemId, ProductInfoId, SortKey};

/// A quantity of one listing within an order. `(order, product_info)` is unique:
/// adding more of the same listing updates the quantity in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_info_id: ProductInfoId,
    pub quantity: u32,
}

impl Entity for OrderItem {
    type Id = OrderItemId;
    const KIND: &'static str = "order_item";

    fn id(&self) -> &OrderItemId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_info_id: ProductInfoId,
    pub quantity: i64,
}

impl NewOrderItem {
    /// One unit of `product_info_id` in `order_id`.
    pub fn new(order_id: OrderId, product_info_id: ProductInfoId) -> Self {
        Self {
            id: OrderItemId::new(),
            order_id,
            product_info_id,
            quantity: 1,
        }
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn into_record(self) -> DomainResult<OrderItem> {
        Ok(OrderItem {
            id: self.id,
            order_id: self.order_id,
            product_info_id: self.product_info_id,
            quantity: positive("quantity", self.quantity)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemPatch {
    pub quantity: Option<i64>,
}

impl OrderItemPatch {
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn apply(self, item: &mut OrderItem) -> DomainResult<()> {
        if let Some(quantity) = self.quantity {
            item.quantity = positive("quantity", quantity)?;
        }
        Ok(())
    }
}

/// Sort keys for an order's items. Default: id ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemSort {
    #[default]
    Id,
    Quantity,
}

impl SortKey for OrderItemSort {
    type Record = OrderItem;
    const DEFAULT_DIRECTION: Direction = Direction::Ascending;

    fn column(&self) -> &'static str {
        match self {
            OrderItemSort::Id => "id",
            OrderItemSort::Quantity => "quantity",
        }
    }

    fn compare(&self, a: &OrderItem, b: &OrderItem) -> Ordering {
        match self {
            OrderItemSort::Id => a.id.cmp(&b.id),
            OrderItemSort::Quantity => a.quantity.cmp(&b.quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use retail_core::DomainError;

    #[test]
    fn quantity_defaults_to_one() {
        let item = NewOrderItem::new(OrderId::new(), ProductInfoId::new())
            .into_record()
            .unwrap();
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = NewOrderItem::new(OrderId::new(), ProductInfoId::new())
            .quantity(0)
            .into_record()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a rejected quantity patch never changes the item.
        #[test]
        fn rejected_patch_keeps_quantity(start in 1i64..1000, patch in i64::MIN..1) {
            let mut item = NewOrderItem::new(OrderId::new(), ProductInfoId::new())
                .quantity(start)
                .into_record()
                .unwrap();
            prop_assert!(OrderItemPatch::default().quantity(patch).apply(&mut item).is_err());
            prop_assert_eq!(i64::from(item.quantity), start);
        }
    }
}
