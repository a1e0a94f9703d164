//! List ordering: which column a listing sorts on and in which direction.
//!
//! Every record type exposes a sort-key enum whose `Default` is the record's
//! default ordering. Ties are always broken by id in the same direction, so two
//! stores given the same rows return them in the same order.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// A sortable column of a record type.
pub trait SortKey: Copy + core::fmt::Debug {
    type Record: Entity;

    /// Direction used when the caller does not override it.
    const DEFAULT_DIRECTION: Direction;

    /// Column name in the relational schema.
    fn column(&self) -> &'static str;

    /// Ascending comparison of two records on this key.
    fn compare(&self, a: &Self::Record, b: &Self::Record) -> Ordering;
}

/// Requested ordering for a list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOrder<K> {
    pub key: K,
    pub direction: Direction,
}

impl<K: SortKey> ListOrder<K> {
    pub fn new(key: K, direction: Direction) -> Self {
        Self { key, direction }
    }

    pub fn ascending(key: K) -> Self {
        Self::new(key, Direction::Ascending)
    }

    pub fn descending(key: K) -> Self {
        Self::new(key, Direction::Descending)
    }

    /// Sort rows in place (key first, then id, both in `direction`).
    pub fn sort(&self, rows: &mut [K::Record]) {
        rows.sort_by(|a, b| {
            let ordering = self.key.compare(a, b).then_with(|| a.id().cmp(b.id()));
            self.direction.apply(ordering)
        });
    }

    /// `ORDER BY` clause body, e.g. `name DESC, id DESC`.
    pub fn to_sql(&self) -> String {
        let dir = self.direction.as_sql();
        if self.key.column() == "id" {
            format!("id {dir}")
        } else {
            format!("{} {dir}, id {dir}", self.key.column())
        }
    }
}

impl<K: SortKey + Default> Default for ListOrder<K> {
    fn default() -> Self {
        Self::new(K::default(), K::DEFAULT_DIRECTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        id: u32,
        name: &'static str,
    }

    impl Entity for Row {
        type Id = u32;
        const KIND: &'static str = "row";

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    #[derive(Debug, Clone, Copy, Default)]
    enum RowSort {
        #[default]
        Name,
        Id,
    }

    impl SortKey for RowSort {
        type Record = Row;
        const DEFAULT_DIRECTION: Direction = Direction::Descending;

        fn column(&self) -> &'static str {
            match self {
                RowSort::Name => "name",
                RowSort::Id => "id",
            }
        }

        fn compare(&self, a: &Row, b: &Row) -> Ordering {
            match self {
                RowSort::Name => a.name.cmp(b.name),
                RowSort::Id => a.id.cmp(&b.id),
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: "b" },
            Row { id: 2, name: "a" },
            Row { id: 3, name: "b" },
        ]
    }

    #[test]
    fn default_order_uses_key_default_direction() {
        let mut rows = rows();
        ListOrder::<RowSort>::default().sort(&mut rows);
        let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn ascending_override_breaks_ties_by_id() {
        let mut rows = rows();
        ListOrder::ascending(RowSort::Name).sort(&mut rows);
        let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn sql_clause_includes_tie_breaker() {
        assert_eq!(ListOrder::<RowSort>::default().to_sql(), "name DESC, id DESC");
        assert_eq!(ListOrder::ascending(RowSort::Id).to_sql(), "id ASC");
    }
}
