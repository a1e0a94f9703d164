use core::cmp::Ordering;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use retail_core::{Direction, DomainError, DomainResult, Entity, OrderId, SortKey, UserId};

/// Order status lifecycle.
///
/// `basket → new → confirmed → assembled → sent → delivered`, with `canceled`
/// reachable from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Basket,
    New,
    Confirmed,
    Assembled,
    Sent,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Basket,
        OrderStatus::New,
        OrderStatus::Confirmed,
        OrderStatus::Assembled,
        OrderStatus::Sent,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    /// Width of the status column.
    pub const MAX_LEN: usize = 15;

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Basket => "basket",
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Assembled => "assembled",
            OrderStatus::Sent => "sent",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    /// Next status on the success path, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Basket => Some(OrderStatus::New),
            OrderStatus::New => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Assembled),
            OrderStatus::Assembled => Some(OrderStatus::Sent),
            OrderStatus::Sent => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Canceled => None,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `target`.
    ///
    /// Not enforced by stores.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == OrderStatus::Canceled || self.next() == Some(target)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown order status '{s}'")))
    }
}

/// A user's basket or order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = OrderId;
    const KIND: &'static str = "order";

    fn id(&self) -> &OrderId {
        &self.id
    }
}

/// Insert payload for an order. Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
}

impl NewOrder {
    /// A new basket for `user_id`.
    pub fn basket(user_id: UserId) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Basket,
        }
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn into_record(self, now: DateTime<Utc>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of an order. `created_at` is never writable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
}

impl OrderPatch {
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Patch from a raw status string, as received from the outside.
    pub fn parse_status(status: &str) -> DomainResult<Self> {
        Ok(Self::default().status(status.parse()?))
    }

    /// Apply the patch and refresh `updated_at`.
    pub fn apply(self, order: &mut Order, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            order.status = status;
        }
        order.updated_at = now.max(order.created_at);
    }
}

/// Sort keys for order listings. Default: created_at, descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Id,
}

impl SortKey for OrderSort {
    type Record = Order;
    const DEFAULT_DIRECTION: Direction = Direction::Descending;

    fn column(&self) -> &'static str {
        match self {
            OrderSort::CreatedAt => "created_at",
            OrderSort::UpdatedAt => "updated_at",
            OrderSort::Id => "id",
        }
    }

    fn compare(&self, a: &Order, b: &Order) -> Ordering {
        match self {
            OrderSort::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            OrderSort::Id => a.id.cmp(&b.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn status_names_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            assert!(status.as_str().len() <= OrderStatus::MAX_LEN);
        }
    }

    #[test]
    fn unlisted_status_is_a_validation_error() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(OrderPatch::parse_status("BASKET").is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&OrderStatus::Assembled).unwrap();
        assert_eq!(json, "\"assembled\"");
        let parsed: OrderStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Canceled);
        assert!(serde_json::from_str::<OrderStatus>("\"lost\"").is_err());
    }

    #[test]
    fn success_path_ends_in_delivered() {
        let mut status = OrderStatus::default();
        let mut path = vec![status];
        while let Some(next) = status.next() {
            assert!(status.can_transition_to(next));
            status = next;
            path.push(status);
        }
        assert_eq!(path.len(), 6);
        assert_eq!(status, OrderStatus::Delivered);
    }

    #[test]
    fn cancel_is_allowed_from_every_non_terminal_status() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.can_transition_to(OrderStatus::Canceled),
                !status.is_terminal()
            );
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Basket));
        assert!(!OrderStatus::Basket.can_transition_to(OrderStatus::Sent));
    }

    #[test]
    fn patch_refreshes_updated_at_only() {
        let created = Utc::now();
        let mut order = NewOrder::basket(UserId::new()).into_record(created);
        let later = created + Duration::seconds(5);
        OrderPatch::default()
            .status(OrderStatus::New)
            .apply(&mut order, later);
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.created_at, created);
        assert_eq!(order.updated_at, later);
    }

    #[test]
    fn updated_at_never_precedes_created_at() {
        let created = Utc::now();
        let mut order = NewOrder::basket(UserId::new()).into_record(created);
        OrderPatch::default().apply(&mut order, created - Duration::seconds(1));
        assert_eq!(order.updated_at, created);
    }
}
