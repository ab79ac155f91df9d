//! SELECT assembly from a table, joins and a [`Scope`].
//!
//! This is the statement a store executor runs: the builder only renders SQL
//! text and parameters, it never touches a connection.
//!
//! The builder uses the typestate pattern so that `build()` is only available
//! once both the projection and the table are known.

use std::marker::PhantomData;

use crate::catalog::{Catalog, Resolver, check_column};
use crate::error::{QueryError, Result};
use crate::join::JoinSpec;
use crate::scope::Scope;
use crate::value::SqlValue;

/// Marker: No columns specified yet.
#[derive(Debug, Clone, Copy)]
pub struct NoColumns;
/// Marker: Columns have been specified.
#[derive(Debug, Clone, Copy)]
pub struct HasColumns;
/// Marker: No FROM clause specified yet.
#[derive(Debug, Clone, Copy)]
pub struct NoFrom;
/// Marker: FROM clause has been specified.
#[derive(Debug, Clone, Copy)]
pub struct HasFrom;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Projection {
    All,
    Count,
    Columns(Vec<String>),
}

/// A SELECT statement builder.
///
/// ```rust
/// use strata_core::{col, JoinSpec, Order, Scope, Select};
///
/// let scope = Scope::new(
///     Some(col("orders.total").gt(100)),
///     Some(Order::new().sort_descending("orders.total")),
///     10,
/// );
/// let (sql, params) = Select::new()
///     .columns(&["users.name", "orders.total"])
///     .from("users")
///     .join(JoinSpec::inner("orders", col("users.id").eq_column("orders.user_id")))
///     .scope(scope)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     sql,
///     "SELECT users.name, orders.total FROM users \
///      JOIN orders ON users.id = orders.user_id \
///      WHERE orders.total > ? ORDER BY orders.total DESC LIMIT 10"
/// );
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Select<Cols, F> {
    projection: Option<Projection>,
    table: Option<String>,
    joins: Vec<JoinSpec>,
    scope: Scope,
    _state: PhantomData<(Cols, F)>,
}

impl Select<NoColumns, NoFrom> {
    /// Creates a new SELECT builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            projection: None,
            table: None,
            joins: Vec::new(),
            scope: Scope::DEFAULT,
            _state: PhantomData,
        }
    }
}

impl Default for Select<NoColumns, NoFrom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cols, F> Select<Cols, F> {
    fn transition<C2, F2>(self) -> Select<C2, F2> {
        Select {
            projection: self.projection,
            table: self.table,
            joins: self.joins,
            scope: self.scope,
            _state: PhantomData,
        }
    }
}

// Transition: NoColumns -> HasColumns
impl<F> Select<NoColumns, F> {
    /// Specifies the columns to select.
    #[must_use]
    pub fn columns(mut self, cols: &[&str]) -> Select<HasColumns, F> {
        self.projection = Some(Projection::Columns(
            cols.iter().map(|c| String::from(*c)).collect(),
        ));
        self.transition()
    }

    /// Selects all columns (`*`).
    #[must_use]
    pub fn all(mut self) -> Select<HasColumns, F> {
        self.projection = Some(Projection::All);
        self.transition()
    }

    /// Selects `COUNT(*)`.
    #[must_use]
    pub fn count(mut self) -> Select<HasColumns, F> {
        self.projection = Some(Projection::Count);
        self.transition()
    }
}

// Transition: NoFrom -> HasFrom
impl<Cols> Select<Cols, NoFrom> {
    /// Specifies the base table.
    #[must_use]
    pub fn from(mut self, table: &str) -> Select<Cols, HasFrom> {
        self.table = Some(String::from(table));
        self.transition()
    }
}

// Methods available after FROM
impl<Cols> Select<Cols, HasFrom> {
    /// Appends a join. Joins render in the order they are added.
    #[must_use]
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    /// Appends several joins, in order.
    #[must_use]
    pub fn joins(mut self, joins: impl IntoIterator<Item = JoinSpec>) -> Self {
        self.joins.extend(joins);
        self
    }

    /// Sets the condition, ordering and limit.
    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

impl Select<HasColumns, HasFrom> {
    /// Builds the statement and its parameters, in placeholder order.
    pub fn build(&self) -> Result<(String, Vec<SqlValue>)> {
        self.render(None)
    }

    /// Like [`build`](Self::build), resolving every referenced column against
    /// `catalog`.
    pub fn build_checked(&self, catalog: &Catalog) -> Result<(String, Vec<SqlValue>)> {
        let table = self.table.as_deref().unwrap_or_default();
        if !catalog.has_table(table) {
            return Err(QueryError::Compilation {
                table: String::from(table),
                column: String::from("*"),
                fragment: format!("FROM {table}"),
            });
        }
        self.render(Some(Resolver { catalog, table }))
    }

    fn render(&self, resolver: Option<Resolver<'_>>) -> Result<(String, Vec<SqlValue>)> {
        let table = self.table.as_deref().unwrap_or_default();
        if table.is_empty() {
            return Err(QueryError::invalid_argument("empty table name", "FROM"));
        }

        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        match &self.projection {
            Some(Projection::Columns(cols)) if !cols.is_empty() => {
                for column in cols {
                    check_column(resolver, column, column)?;
                }
                sql.push_str(&cols.join(", "));
            }
            Some(Projection::Columns(_)) => {
                return Err(QueryError::invalid_argument(
                    "empty column list",
                    format!("SELECT  FROM {table}"),
                ));
            }
            Some(Projection::Count) => sql.push_str("COUNT(*)"),
            Some(Projection::All) | None => sql.push('*'),
        }

        sql.push_str(" FROM ");
        sql.push_str(table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.render(resolver, &mut params)?);
        }

        if let Some(condition) = self.scope.condition() {
            sql.push_str(" WHERE ");
            sql.push_str(&condition.render(resolver, &mut params)?);
        }

        if let Some(order) = self.scope.order() {
            let order_sql = order.render(resolver)?;
            if !order_sql.is_empty() {
                sql.push(' ');
                sql.push_str(&order_sql);
            }
        }

        if !self.scope.is_unbounded() {
            let limit = self.scope.limit();
            if limit < 0 {
                return Err(QueryError::invalid_argument(
                    format!("negative limit {limit}"),
                    format!("LIMIT {limit}"),
                ));
            }
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Ok((sql, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::col;
    use crate::order::Order;
    use crate::scope::NO_LIMIT;

    #[test]
    fn test_default_scope_select() {
        let (sql, params) = Select::new().all().from("users").build().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn test_count() {
        let (sql, _) = Select::new()
            .count()
            .from("users")
            .scope(Scope::new(Some(col("active").eq(true)), None, NO_LIMIT))
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM users WHERE active = ?");
    }

    #[test]
    fn test_limit_zero_is_emitted() {
        let (sql, _) = Select::new()
            .all()
            .from("users")
            .scope(Scope::new(None, None, 0))
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users LIMIT 0");
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let err = Select::new()
            .all()
            .from("users")
            .scope(Scope::new(None, None, -5))
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument { .. }));
    }

    #[test]
    fn test_empty_order_is_omitted() {
        let (sql, _) = Select::new()
            .all()
            .from("users")
            .scope(Scope::new(None, Some(Order::new()), NO_LIMIT))
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_joins_compose_in_declaration_order() {
        let (sql, params) = Select::new()
            .columns(&["u.name"])
            .from("users")
            .join(JoinSpec::inner("orders", col("users.id").eq_column("orders.user_id")))
            .join(JoinSpec::left_outer(
                "refunds",
                col("refunds.order_id")
                    .eq_column("orders.id")
                    .and(col("refunds.kind").eq("full")),
            ))
            .scope(Scope::new(Some(col("users.active").eq(true)), None, NO_LIMIT))
            .build()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT u.name FROM users \
             JOIN orders ON users.id = orders.user_id \
             LEFT OUTER JOIN refunds ON (refunds.order_id = orders.id) AND (refunds.kind = ?) \
             WHERE users.active = ?"
        );
        assert_eq!(
            params,
            vec![SqlValue::Text("full".into()), SqlValue::Bool(true)]
        );
    }

    #[test]
    fn test_build_checked_rejects_unknown_projection() {
        let catalog = Catalog::new().with_table("users", &["id", "name"]);
        let err = Select::new()
            .columns(&["id", "email"])
            .from("users")
            .build_checked(&catalog)
            .unwrap_err();
        assert!(matches!(err, QueryError::Compilation { ref column, .. } if column == "email"));
    }

    #[test]
    fn test_build_checked_unknown_table() {
        let catalog = Catalog::new().with_table("users", &["id"]);
        let err = Select::new()
            .all()
            .from("accounts")
            .build_checked(&catalog)
            .unwrap_err();
        assert!(matches!(err, QueryError::Compilation { ref table, .. } if table == "accounts"));
    }
}
