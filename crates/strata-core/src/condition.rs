//! Condition algebra.
//!
//! A [`Condition`] is an owned expression tree of leaf predicates combined
//! with `AND`, `OR` and `NOT`. Trees are immutable values with structural
//! equality and hashing, so two independently built trees with the same shape
//! and literals are equal and compile to identical SQL.
//!
//! # Example
//!
//! ```rust
//! use strata_core::{col, Condition};
//!
//! let cond = col("status")
//!     .eq("active")
//!     .and(col("age").gt(18).or(col("verified").eq(true)));
//!
//! let (sql, params) = cond.build().unwrap();
//! assert_eq!(sql, "(status = ?) AND ((age > ?) OR (verified = ?))");
//! assert_eq!(params.len(), 3);
//! ```

use std::fmt;

use crate::catalog::{Catalog, Resolver, check_column};
use crate::error::{QueryError, Result};
use crate::value::{SqlValue, ToSqlValue};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::NotEq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
        }
    }
}

/// A boolean predicate over named columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    /// `column op ?`
    Compare {
        /// Column name, optionally table-qualified.
        column: String,
        /// Operator.
        op: CompareOp,
        /// Bound literal.
        value: SqlValue,
    },
    /// `left op right`, both columns.
    CompareColumns {
        /// Left column.
        left: String,
        /// Operator.
        op: CompareOp,
        /// Right column.
        right: String,
    },
    /// `column IS NULL` or `column IS NOT NULL`.
    IsNull {
        /// Column name.
        column: String,
        /// `IS NOT NULL` when set.
        negated: bool,
    },
    /// `column IN (?, ...)` or `column NOT IN (?, ...)`.
    In {
        /// Column name.
        column: String,
        /// Candidate values.
        values: Vec<SqlValue>,
        /// `NOT IN` when set.
        negated: bool,
    },
    /// `column LIKE ?` or `column NOT LIKE ?`.
    Like {
        /// Column name.
        column: String,
        /// Pattern, `%` and `_` wildcards.
        pattern: String,
        /// `NOT LIKE` when set.
        negated: bool,
    },
    /// `column BETWEEN ? AND ?`
    Between {
        /// Column name.
        column: String,
        /// Inclusive lower bound.
        low: SqlValue,
        /// Inclusive upper bound.
        high: SqlValue,
    },
    /// Conjunction of one or more conditions.
    And(Vec<Condition>),
    /// Disjunction of one or more conditions.
    Or(Vec<Condition>),
    /// Negation.
    Not(Box<Condition>),
}

/// Hook for the external attribute validator.
///
/// Called with every literal a condition binds, before compilation.
pub trait AttributeValidator {
    /// Returns `Err(message)` when `value` is not acceptable for `attribute`.
    fn validate(&self, attribute: &str, value: &SqlValue) -> std::result::Result<(), String>;
}

impl<F> AttributeValidator for F
where
    F: Fn(&str, &SqlValue) -> std::result::Result<(), String>,
{
    fn validate(&self, attribute: &str, value: &SqlValue) -> std::result::Result<(), String> {
        self(attribute, value)
    }
}

/// Creates a column reference to build leaf conditions from.
#[must_use]
pub fn col(name: &str) -> Column {
    Column {
        name: String::from(name),
    }
}

/// A column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: String,
}

impl Column {
    /// Returns the column name as written in SQL.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn compare<T: ToSqlValue>(self, op: CompareOp, value: T) -> Condition {
        Condition::Compare {
            column: self.name,
            op,
            value: value.to_sql_value(),
        }
    }

    fn compare_column(self, op: CompareOp, other: &str) -> Condition {
        Condition::CompareColumns {
            left: self.name,
            op,
            right: String::from(other),
        }
    }

    /// `column = ?`
    #[must_use]
    pub fn eq<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::Eq, value)
    }

    /// `column != ?`
    #[must_use]
    pub fn not_eq<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::NotEq, value)
    }

    /// `column < ?`
    #[must_use]
    pub fn lt<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::Lt, value)
    }

    /// `column <= ?`
    #[must_use]
    pub fn lt_eq<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::LtEq, value)
    }

    /// `column > ?`
    #[must_use]
    pub fn gt<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::Gt, value)
    }

    /// `column >= ?`
    #[must_use]
    pub fn gt_eq<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::GtEq, value)
    }

    /// `column = other`, comparing two columns.
    #[must_use]
    pub fn eq_column(self, other: &str) -> Condition {
        self.compare_column(CompareOp::Eq, other)
    }

    /// `column != other`
    #[must_use]
    pub fn not_eq_column(self, other: &str) -> Condition {
        self.compare_column(CompareOp::NotEq, other)
    }

    /// `column < other`
    #[must_use]
    pub fn lt_column(self, other: &str) -> Condition {
        self.compare_column(CompareOp::Lt, other)
    }

    /// `column > other`
    #[must_use]
    pub fn gt_column(self, other: &str) -> Condition {
        self.compare_column(CompareOp::Gt, other)
    }

    /// `column IS NULL`
    #[must_use]
    pub fn is_null(self) -> Condition {
        Condition::IsNull {
            column: self.name,
            negated: false,
        }
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn is_not_null(self) -> Condition {
        Condition::IsNull {
            column: self.name,
            negated: true,
        }
    }

    /// `column IN (?, ...)`
    #[must_use]
    pub fn in_list<T: ToSqlValue>(self, values: Vec<T>) -> Condition {
        Condition::In {
            column: self.name,
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated: false,
        }
    }

    /// `column NOT IN (?, ...)`
    #[must_use]
    pub fn not_in_list<T: ToSqlValue>(self, values: Vec<T>) -> Condition {
        Condition::In {
            column: self.name,
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated: true,
        }
    }

    /// `column LIKE ?`
    #[must_use]
    pub fn like(self, pattern: &str) -> Condition {
        Condition::Like {
            column: self.name,
            pattern: String::from(pattern),
            negated: false,
        }
    }

    /// `column NOT LIKE ?`
    #[must_use]
    pub fn not_like(self, pattern: &str) -> Condition {
        Condition::Like {
            column: self.name,
            pattern: String::from(pattern),
            negated: true,
        }
    }

    /// `column LIKE '%value%'`
    #[must_use]
    pub fn contains(self, value: &str) -> Condition {
        self.like(&format!("%{value}%"))
    }

    /// `column LIKE 'value%'`
    #[must_use]
    pub fn starts_with(self, value: &str) -> Condition {
        self.like(&format!("{value}%"))
    }

    /// `column BETWEEN ? AND ?`
    #[must_use]
    pub fn between<T: ToSqlValue, U: ToSqlValue>(self, low: T, high: U) -> Condition {
        Condition::Between {
            column: self.name,
            low: low.to_sql_value(),
            high: high.to_sql_value(),
        }
    }
}

impl Condition {
    /// Conjunction of all `conditions`.
    #[must_use]
    pub fn all(conditions: Vec<Self>) -> Self {
        Self::And(conditions)
    }

    /// Disjunction of all `conditions`.
    #[must_use]
    pub fn any(conditions: Vec<Self>) -> Self {
        Self::Or(conditions)
    }

    /// Combines with `other` using AND.
    ///
    /// Chaining onto an existing conjunction appends to it.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other);
                Self::And(children)
            }
            this => Self::And(vec![this, other]),
        }
    }

    /// Combines with `other` using OR.
    ///
    /// Chaining onto an existing disjunction appends to it.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut children) => {
                children.push(other);
                Self::Or(children)
            }
            this => Self::Or(vec![this, other]),
        }
    }

    /// Negates with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Columns referenced by this condition, in rendering order.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Compare { column, .. }
            | Self::IsNull { column, .. }
            | Self::In { column, .. }
            | Self::Like { column, .. }
            | Self::Between { column, .. } => out.push(column),
            Self::CompareColumns { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_columns(out);
                }
            }
            Self::Not(inner) => inner.collect_columns(out),
        }
    }

    /// Runs every bound literal through `validator`.
    ///
    /// Stops at the first rejection.
    pub fn validate<V: AttributeValidator + ?Sized>(&self, validator: &V) -> Result<()> {
        let check = |column: &str, value: &SqlValue| {
            validator
                .validate(column, value)
                .map_err(|message| QueryError::ValidationFailed {
                    attribute: String::from(column),
                    message,
                })
        };
        match self {
            Self::Compare { column, value, .. } => check(column.as_str(), value),
            Self::In { column, values, .. } => {
                values.iter().try_for_each(|value| check(column.as_str(), value))
            }
            Self::Like {
                column, pattern, ..
            } => check(column.as_str(), &SqlValue::Text(pattern.clone())),
            Self::Between {
                column, low, high, ..
            } => {
                check(column.as_str(), low)?;
                check(column.as_str(), high)
            }
            Self::CompareColumns { .. } | Self::IsNull { .. } => Ok(()),
            Self::And(children) | Self::Or(children) => children
                .iter()
                .try_for_each(|child| child.validate(validator)),
            Self::Not(inner) => inner.validate(validator),
        }
    }

    /// Compiles to SQL with `?` placeholders and the bound parameters, in
    /// placeholder order.
    pub fn build(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut params = Vec::new();
        let sql = self.render(None, &mut params)?;
        Ok((sql, params))
    }

    /// Like [`build`](Self::build), also resolving every column against
    /// `catalog` with bare names belonging to `table`.
    pub fn build_checked(&self, catalog: &Catalog, table: &str) -> Result<(String, Vec<SqlValue>)> {
        let mut params = Vec::new();
        let sql = self.render(Some(Resolver { catalog, table }), &mut params)?;
        Ok((sql, params))
    }

    pub(crate) fn render(
        &self,
        resolver: Option<Resolver<'_>>,
        params: &mut Vec<SqlValue>,
    ) -> Result<String> {
        match self {
            Self::Compare { column, op, value } => {
                let sql = format!("{column} {op} ?");
                check_column(resolver, column, &sql)?;
                params.push(value.clone());
                Ok(sql)
            }
            Self::CompareColumns { left, op, right } => {
                let sql = format!("{left} {op} {right}");
                check_column(resolver, left, &sql)?;
                check_column(resolver, right, &sql)?;
                Ok(sql)
            }
            Self::IsNull { column, negated } => {
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                let sql = format!("{column} {keyword}");
                check_column(resolver, column, &sql)?;
                Ok(sql)
            }
            Self::In {
                column,
                values,
                negated,
            } => {
                let keyword = if *negated { "NOT IN" } else { "IN" };
                let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
                let sql = format!("{column} {keyword} ({})", placeholders.join(", "));
                if values.is_empty() {
                    return Err(QueryError::invalid_argument("empty IN list", sql));
                }
                check_column(resolver, column, &sql)?;
                params.extend(values.iter().cloned());
                Ok(sql)
            }
            Self::Like {
                column,
                pattern,
                negated,
            } => {
                let keyword = if *negated { "NOT LIKE" } else { "LIKE" };
                let sql = format!("{column} {keyword} ?");
                check_column(resolver, column, &sql)?;
                params.push(SqlValue::Text(pattern.clone()));
                Ok(sql)
            }
            Self::Between { column, low, high } => {
                let sql = format!("{column} BETWEEN ? AND ?");
                check_column(resolver, column, &sql)?;
                params.push(low.clone());
                params.push(high.clone());
                Ok(sql)
            }
            Self::And(children) => Self::render_junction(children, "AND", resolver, params),
            Self::Or(children) => Self::render_junction(children, "OR", resolver, params),
            Self::Not(inner) => {
                let inner_sql = inner.render(resolver, params)?;
                Ok(format!("NOT ({inner_sql})"))
            }
        }
    }

    fn render_junction(
        children: &[Self],
        keyword: &str,
        resolver: Option<Resolver<'_>>,
        params: &mut Vec<SqlValue>,
    ) -> Result<String> {
        if children.is_empty() {
            return Err(QueryError::invalid_argument(
                format!("{keyword} without operands"),
                keyword,
            ));
        }
        let parts = children
            .iter()
            .map(|child| child.render(resolver, params).map(|sql| format!("({sql})")))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(&format!(" {keyword} ")))
    }
}
