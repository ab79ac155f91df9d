//! Migration operations.
//!
//! Every operation carries the complete definition of the object it touches,
//! so each one has an exact inverse.

use serde::{Deserialize, Serialize};

use crate::schema::{ColumnSchema, ConstraintSchema, IndexSchema, TableSchema};

/// A single schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MigrationOperation {
    /// Create a table with its columns, indexes and constraints.
    CreateTable {
        /// Table definition.
        schema: TableSchema,
    },
    /// Drop a table.
    DropTable {
        /// Definition of the dropped table.
        schema: TableSchema,
    },
    /// Add a column to an existing table.
    AddColumn {
        /// Table name.
        table: String,
        /// Column definition.
        column: ColumnSchema,
    },
    /// Drop a column.
    DropColumn {
        /// Table name.
        table: String,
        /// Definition of the dropped column.
        column: ColumnSchema,
    },
    /// Create an index.
    CreateIndex {
        /// Table name.
        table: String,
        /// Index definition.
        index: IndexSchema,
    },
    /// Drop an index.
    DropIndex {
        /// Table name.
        table: String,
        /// Definition of the dropped index.
        index: IndexSchema,
    },
    /// Add a constraint to an existing table.
    AddConstraint {
        /// Table name.
        table: String,
        /// Constraint definition.
        constraint: ConstraintSchema,
    },
    /// Drop a constraint.
    DropConstraint {
        /// Table name.
        table: String,
        /// Definition of the dropped constraint.
        constraint: ConstraintSchema,
    },
}

impl MigrationOperation {
    /// Creates a `CreateTable` operation.
    #[must_use]
    pub const fn create_table(schema: TableSchema) -> Self {
        Self::CreateTable { schema }
    }

    /// Creates an `AddColumn` operation.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: ColumnSchema) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    /// Creates a `CreateIndex` operation.
    #[must_use]
    pub fn create_index(table: impl Into<String>, index: IndexSchema) -> Self {
        Self::CreateIndex {
            table: table.into(),
            index,
        }
    }

    /// Creates an `AddConstraint` operation.
    #[must_use]
    pub fn add_constraint(table: impl Into<String>, constraint: ConstraintSchema) -> Self {
        Self::AddConstraint {
            table: table.into(),
            constraint,
        }
    }

    /// Returns the operation that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Self::CreateTable { schema } => Self::DropTable {
                schema: schema.clone(),
            },
            Self::DropTable { schema } => Self::CreateTable {
                schema: schema.clone(),
            },
            Self::AddColumn { table, column } => Self::DropColumn {
                table: table.clone(),
                column: column.clone(),
            },
            Self::DropColumn { table, column } => Self::AddColumn {
                table: table.clone(),
                column: column.clone(),
            },
            Self::CreateIndex { table, index } => Self::DropIndex {
                table: table.clone(),
                index: index.clone(),
            },
            Self::DropIndex { table, index } => Self::CreateIndex {
                table: table.clone(),
                index: index.clone(),
            },
            Self::AddConstraint { table, constraint } => Self::DropConstraint {
                table: table.clone(),
                constraint: constraint.clone(),
            },
            Self::DropConstraint { table, constraint } => Self::AddConstraint {
                table: table.clone(),
                constraint: constraint.clone(),
            },
        }
    }

    /// Returns the name of the table this operation touches.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable { schema } | Self::DropTable { schema } => &schema.name,
            Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::CreateIndex { table, .. }
            | Self::DropIndex { table, .. }
            | Self::AddConstraint { table, .. }
            | Self::DropConstraint { table, .. } => table,
        }
    }

    /// Returns whether this operation is destructive (data loss possible).
    #[must_use]
    pub const fn is_destructive(&self) -> bool {
        matches!(self, Self::DropTable { .. } | Self::DropColumn { .. })
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::CreateTable { schema } => format!("Create table {}", schema.name),
            Self::DropTable { schema } => format!("Drop table {}", schema.name),
            Self::AddColumn { table, column } => {
                format!("Add column {} to {table}", column.name)
            }
            Self::DropColumn { table, column } => {
                format!("Drop column {} from {table}", column.name)
            }
            Self::CreateIndex { table, index } => {
                format!("Create index {} on {table}", index.effective_name(table))
            }
            Self::DropIndex { table, index } => {
                format!("Drop index {} from {table}", index.effective_name(table))
            }
            Self::AddConstraint { table, constraint } => {
                format!("Add constraint {} to {table}", constraint.name())
            }
            Self::DropConstraint { table, constraint } => {
                format!("Drop constraint {} from {table}", constraint.name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SqlType;

    fn users() -> TableSchema {
        TableSchema::new("users")
            .column(ColumnSchema::new("id", SqlType::Integer).primary_key())
            .column(ColumnSchema::new("email", SqlType::Text))
            .index(IndexSchema::new(&["email"]).unique())
    }

    fn all_kinds() -> Vec<MigrationOperation> {
        vec![
            MigrationOperation::create_table(users()),
            MigrationOperation::DropTable { schema: users() },
            MigrationOperation::add_column("users", ColumnSchema::new("age", SqlType::Integer)),
            MigrationOperation::DropColumn {
                table: "users".into(),
                column: ColumnSchema::new("age", SqlType::Integer),
            },
            MigrationOperation::create_index("users", IndexSchema::named("by_age", &["age"])),
            MigrationOperation::DropIndex {
                table: "users".into(),
                index: IndexSchema::named("by_age", &["age"]),
            },
            MigrationOperation::add_constraint(
                "users",
                ConstraintSchema::check("age_positive", "age > 0"),
            ),
            MigrationOperation::DropConstraint {
                table: "users".into(),
                constraint: ConstraintSchema::unique("uq_email", &["email"]),
            },
        ]
    }

    #[test]
    fn test_inverse_is_an_involution() {
        for op in all_kinds() {
            assert_eq!(op.inverse().inverse(), op, "{}", op.description());
            assert_ne!(op.inverse(), op);
        }
    }

    #[test]
    fn test_inverse_keeps_full_definition() {
        let drop = MigrationOperation::create_table(users()).inverse();
        match drop {
            MigrationOperation::DropTable { schema } => assert_eq!(schema, users()),
            other => panic!("unexpected inverse: {other:?}"),
        }
    }

    #[test]
    fn test_table_and_description() {
        let op = MigrationOperation::create_index("users", IndexSchema::new(&["email"]));
        assert_eq!(op.table(), "users");
        assert_eq!(op.description(), "Create index idx_users_email on users");
        assert!(!op.is_destructive());
        assert!(op.inverse().inverse().table() == "users");
        assert!(MigrationOperation::DropTable { schema: users() }.is_destructive());
    }

    #[test]
    fn test_operations_serialize() {
        let op = MigrationOperation::add_column("users", ColumnSchema::new("age", SqlType::Integer));
        let json = serde_json::to_string(&op).unwrap();
        let back: MigrationOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
