//! Index DDL rendering.

use crate::error::{QueryError, Result};

/// Index kind. Each variant renders its own `CREATE ... INDEX` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexType {
    /// Plain index.
    #[default]
    NonUnique,
    /// Unique index.
    Unique,
    /// Clustered index.
    Clustered,
}

impl IndexType {
    /// Returns the word placed between `CREATE` and `INDEX`.
    #[must_use]
    pub const fn modifier(self) -> &'static str {
        match self {
            Self::NonUnique => "",
            Self::Unique => "UNIQUE",
            Self::Clustered => "CLUSTERED",
        }
    }

    /// Returns whether the index enforces uniqueness.
    #[must_use]
    pub const fn is_unique(self) -> bool {
        matches!(self, Self::Unique)
    }

    /// Renders `CREATE <modifier> INDEX <name> ON <table> (<columns>)`.
    ///
    /// The modifier and name slots keep their surrounding spaces when empty,
    /// so a plain index reads `CREATE  INDEX` and an anonymous one
    /// `INDEX  ON`.
    ///
    /// ```rust
    /// use strata_core::IndexType;
    ///
    /// assert_eq!(
    ///     IndexType::NonUnique.to_sql("table1", Some("index1"), &["column1", "column2"]).unwrap(),
    ///     "CREATE  INDEX index1 ON table1 (column1, column2)"
    /// );
    /// ```
    pub fn to_sql<S: AsRef<str>>(
        self,
        table: &str,
        name: Option<&str>,
        columns: &[S],
    ) -> Result<String> {
        let modifier = self.modifier();
        let name = name.unwrap_or("");
        if columns.is_empty() {
            return Err(QueryError::invalid_argument(
                format!("index on '{table}' has no columns"),
                format!("CREATE {modifier} INDEX {name} ON {table} ()"),
            ));
        }
        let columns: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
        Ok(format!(
            "CREATE {modifier} INDEX {name} ON {table} ({})",
            columns.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_unique_named() {
        assert_eq!(
            IndexType::NonUnique
                .to_sql("table1", Some("index1"), &["column1", "column2"])
                .unwrap(),
            "CREATE  INDEX index1 ON table1 (column1, column2)"
        );
    }

    #[test]
    fn test_unique_anonymous() {
        assert_eq!(
            IndexType::Unique
                .to_sql("table1", None, &["column1", "column2"])
                .unwrap(),
            "CREATE UNIQUE INDEX  ON table1 (column1, column2)"
        );
    }

    #[test]
    fn test_clustered_single_column() {
        assert_eq!(
            IndexType::Clustered
                .to_sql("table1", Some("index1"), &["column1"])
                .unwrap(),
            "CREATE CLUSTERED INDEX index1 ON table1 (column1)"
        );
    }

    #[test]
    fn test_owned_column_names() {
        let columns = vec![String::from("a"), String::from("b")];
        assert_eq!(
            IndexType::Unique.to_sql("t", Some("i"), &columns).unwrap(),
            "CREATE UNIQUE INDEX i ON t (a, b)"
        );
    }

    #[test]
    fn test_empty_column_list_is_rejected() {
        let err = IndexType::NonUnique
            .to_sql::<&str>("table1", Some("index1"), &[])
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument { .. }));
        assert!(err.to_string().contains("table1"));
    }
}
