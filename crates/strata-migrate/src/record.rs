//! Declared schema of record types.

use crate::schema::{ColumnSchema, ConstraintSchema, IndexSchema, TableSchema};

/// A record type whose table the planner manages.
///
/// Implemented by the attribute-mapping layer (or by hand) to describe the
/// columns, indexes and constraints the table should have.
///
/// ```rust
/// use strata_migrate::prelude::*;
///
/// struct User;
///
/// impl RecordType for User {
///     const TABLE: &'static str = "users";
///
///     fn attributes() -> Vec<ColumnSchema> {
///         vec![
///             ColumnSchema::new("name", SqlType::Text),
///             ColumnSchema::new("age", SqlType::Integer),
///         ]
///     }
/// }
///
/// let schema = TableSchema::from_record::<User>();
/// assert_eq!(schema.name, "users");
/// assert_eq!(schema.columns.len(), 2);
/// ```
pub trait RecordType {
    /// The SQL table name.
    const TABLE: &'static str;

    /// Mapped attributes, in declaration order.
    fn attributes() -> Vec<ColumnSchema>;

    /// Declared indexes.
    fn indexes() -> Vec<IndexSchema> {
        Vec::new()
    }

    /// Declared table-level constraints.
    fn constraints() -> Vec<ConstraintSchema> {
        Vec::new()
    }
}

impl TableSchema {
    /// Builds the declared schema of a record type.
    #[must_use]
    pub fn from_record<R: RecordType>() -> Self {
        Self {
            name: R::TABLE.to_string(),
            columns: R::attributes(),
            indexes: R::indexes(),
            constraints: R::constraints(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SqlType;

    struct Account;

    impl RecordType for Account {
        const TABLE: &'static str = "accounts";

        fn attributes() -> Vec<ColumnSchema> {
            vec![
                ColumnSchema::new("id", SqlType::Integer).primary_key(),
                ColumnSchema::new("email", SqlType::Varchar(255)).not_null(),
            ]
        }

        fn indexes() -> Vec<IndexSchema> {
            vec![IndexSchema::new(&["email"]).unique()]
        }
    }

    #[test]
    fn test_from_record_keeps_declaration_order() {
        let schema = TableSchema::from_record::<Account>();
        assert_eq!(schema.name, "accounts");
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "email"]);
        assert_eq!(schema.indexes.len(), 1);
        assert!(schema.constraints.is_empty());
    }
}
