//! Join specification.

use crate::catalog::{Catalog, Resolver};
use crate::condition::Condition;
use crate::error::{QueryError, Result};
use crate::value::SqlValue;

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JoinType {
    /// `JOIN`
    Inner,
    /// `LEFT OUTER JOIN`
    LeftOuter,
    /// `RIGHT OUTER JOIN`
    RightOuter,
    /// `FULL OUTER JOIN`
    FullOuter,
}

impl JoinType {
    /// Returns the SQL keyword sequence.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::RightOuter => "RIGHT OUTER JOIN",
            Self::FullOuter => "FULL OUTER JOIN",
        }
    }
}

/// One joined relation: kind, target table and join condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JoinSpec {
    join_type: JoinType,
    target: String,
    on: Condition,
}

impl JoinSpec {
    /// Creates a join of the given kind.
    #[must_use]
    pub fn new(join_type: JoinType, target: &str, on: Condition) -> Self {
        Self {
            join_type,
            target: String::from(target),
            on,
        }
    }

    /// `JOIN target ON ...`
    #[must_use]
    pub fn inner(target: &str, on: Condition) -> Self {
        Self::new(JoinType::Inner, target, on)
    }

    /// `LEFT OUTER JOIN target ON ...`
    #[must_use]
    pub fn left_outer(target: &str, on: Condition) -> Self {
        Self::new(JoinType::LeftOuter, target, on)
    }

    /// `RIGHT OUTER JOIN target ON ...`
    #[must_use]
    pub fn right_outer(target: &str, on: Condition) -> Self {
        Self::new(JoinType::RightOuter, target, on)
    }

    /// `FULL OUTER JOIN target ON ...`
    #[must_use]
    pub fn full_outer(target: &str, on: Condition) -> Self {
        Self::new(JoinType::FullOuter, target, on)
    }

    /// Returns the join kind.
    #[must_use]
    pub const fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// Returns the joined table.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the join condition.
    #[must_use]
    pub const fn on(&self) -> &Condition {
        &self.on
    }

    /// Compiles to `<keyword> <target> ON <condition>` plus parameters.
    pub fn build(&self) -> Result<(String, Vec<SqlValue>)> {
        let mut params = Vec::new();
        let sql = self.render(None, &mut params)?;
        Ok((sql, params))
    }

    /// Like [`build`](Self::build), resolving columns against `catalog`.
    ///
    /// Bare column names in the join condition belong to `table`, the query's
    /// base table.
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
        let keyword = self.join_type.keyword();
        if self.target.is_empty() {
            return Err(QueryError::invalid_argument("empty join target", keyword));
        }
        let unknown_target = resolver.is_some_and(|r| !r.catalog.has_table(&self.target));
        if unknown_target {
            return Err(QueryError::Compilation {
                table: self.target.clone(),
                column: String::from("*"),
                fragment: format!("{keyword} {}", self.target),
            });
        }
        let on_sql = self.on.render(resolver, params)?;
        Ok(format!("{keyword} {} ON {on_sql}", self.target))
    }
}
