//! Query scope: condition, ordering and limit.

use crate::condition::Condition;
use crate::order::Order;

/// Limit sentinel meaning "no LIMIT clause".
pub const NO_LIMIT: i64 = -1;

/// An immutable bundle of filter condition, ordering and row limit.
///
/// Scopes are plain values: equality and hashing are field-wise, so equal
/// scopes can share cache entries, and a scope can be reused across threads
/// and executions without synchronization. Deriving a scope with a different
/// limit or condition is done by building a new one from the parts of an
/// existing one.
///
/// ```rust
/// use strata_core::{col, Order, Scope, NO_LIMIT};
///
/// let base = Scope::new(Some(col("active").eq(true)), None, NO_LIMIT);
/// let first_ten = Scope::new(base.condition().cloned(), Some(Order::parse(&["id"])), 10);
/// assert_eq!(first_ten.condition(), base.condition());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scope {
    condition: Option<Condition>,
    order: Option<Order>,
    limit: i64,
}

impl Scope {
    /// No condition, no order, no limit.
    pub const DEFAULT: Self = Self {
        condition: None,
        order: None,
        limit: NO_LIMIT,
    };

    /// Creates a scope. No validation happens here.
    #[must_use]
    pub const fn new(condition: Option<Condition>, order: Option<Order>, limit: i64) -> Self {
        Self {
            condition,
            order,
            limit,
        }
    }

    /// Returns the filter condition.
    #[must_use]
    pub const fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Returns the ordering.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Returns the limit, [`NO_LIMIT`] when unbounded.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    /// Returns true when the limit is [`NO_LIMIT`].
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.limit == NO_LIMIT
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::DEFAULT
    }
}
