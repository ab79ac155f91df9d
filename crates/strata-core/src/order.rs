//! Ordering specification.

use crate::catalog::{Catalog, Resolver, check_column};
use crate::error::Result;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Ascending order (ASC)
    Ascending,
    /// Descending order (DESC)
    Descending,
}

impl Direction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortKey {
    /// Column to order by.
    pub column: String,
    /// Order direction.
    pub direction: Direction,
}

impl SortKey {
    /// Creates an ascending sort key.
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: String::from(column),
            direction: Direction::Ascending,
        }
    }

    /// Creates a descending sort key.
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: String::from(column),
            direction: Direction::Descending,
        }
    }

    /// Parses `"name"` (ascending) or `"-name"` (descending).
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(column) => Self::desc(column),
            None => Self::asc(spec),
        }
    }

    /// Returns the SQL representation (`name ASC`).
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction.keyword())
    }
}

/// An ordered sequence of sort keys. The first key is the primary key.
///
/// Orders are immutable: every builder method returns a new value.
///
/// ```rust
/// use strata_core::Order;
///
/// let order = Order::new().sort_descending("created_at").sort_ascending("id");
/// assert_eq!(order.build().unwrap(), "ORDER BY created_at DESC, id ASC");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    keys: Vec<SortKey>,
}

impl Order {
    /// Creates an empty order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a list of `"name"` / `"-name"` specs, in order.
    #[must_use]
    pub fn parse(specs: &[&str]) -> Self {
        specs.iter().map(|spec| SortKey::parse(spec)).collect()
    }

    /// Appends an ascending key.
    #[must_use]
    pub fn sort_ascending(self, column: &str) -> Self {
        self.then(SortKey::asc(column))
    }

    /// Appends a descending key.
    #[must_use]
    pub fn sort_descending(self, column: &str) -> Self {
        self.then(SortKey::desc(column))
    }

    /// Appends `key`.
    #[must_use]
    pub fn then(mut self, key: SortKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Returns the keys in declaration order.
    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Returns true when no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compiles to `ORDER BY ...`, or an empty string for an empty order.
    pub fn build(&self) -> Result<String> {
        self.render(None)
    }

    /// Like [`build`](Self::build), resolving columns against `catalog`.
    pub fn build_checked(&self, catalog: &Catalog, table: &str) -> Result<String> {
        self.render(Some(Resolver { catalog, table }))
    }

    pub(crate) fn render(&self, resolver: Option<Resolver<'_>>) -> Result<String> {
        if self.keys.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let sql = key.to_sql();
            check_column(resolver, &key.column, &sql)?;
            parts.push(sql);
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

impl FromIterator<SortKey> for Order {
    fn from_iter<I: IntoIterator<Item = SortKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    #[test]
    fn test_declaration_order_is_preserved() {
        let order = Order::new()
            .sort_ascending("last_name")
            .sort_descending("age")
            .sort_ascending("id");
        assert_eq!(
            order.build().unwrap(),
            "ORDER BY last_name ASC, age DESC, id ASC"
        );
    }

    #[test]
    fn test_parse_and_builder_agree() {
        let parsed = Order::parse(&["-created_at", "name"]);
        let built = Order::new().sort_descending("created_at").sort_ascending("name");
        let collected: Order = vec![SortKey::desc("created_at"), SortKey::asc("name")]
            .into_iter()
            .collect();
        assert_eq!(parsed, built);
        assert_eq!(built, collected);
        assert_eq!(parsed.build().unwrap(), collected.build().unwrap());
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = Order::new().sort_ascending("a").sort_ascending("b");
        let b = Order::new().sort_ascending("b").sort_ascending("a");
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_order_renders_nothing() {
        assert!(Order::new().is_empty());
        assert_eq!(Order::new().build().unwrap(), "");
    }

    #[test]
    fn test_unknown_sort_column() {
        let catalog = Catalog::new().with_table("users", &["id"]);
        let err = Order::new()
            .sort_ascending("nickname")
            .build_checked(&catalog, "users")
            .unwrap_err();
        assert!(matches!(err, QueryError::Compilation { ref column, .. } if column == "nickname"));
    }
}
