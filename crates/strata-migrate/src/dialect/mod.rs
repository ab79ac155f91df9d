//! Database dialect implementations.
//!
//! Each dialect knows how to generate SQL for migration operations
//! specific to that database system.

mod generic;
mod sqlite;

pub use generic::GenericDialect;
pub use sqlite::SqliteDialect;

use crate::error::{MigrateError, Result};
use crate::operations::MigrationOperation;
use crate::schema::{ColumnSchema, ConstraintSchema, IndexSchema, SqlType, TableSchema};

/// Trait for database-specific SQL generation.
pub trait MigrationDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Generates the statements for a migration operation, in execution order.
    fn generate_sql(&self, operation: &MigrationOperation) -> Result<Vec<String>>;

    /// Generates `CREATE INDEX` for an index on `table`.
    fn create_index_sql(&self, table: &str, index: &IndexSchema) -> Result<String>;

    /// Returns whether DDL statements can run inside a transaction.
    fn supports_transactional_ddl(&self) -> bool;

    /// Returns whether this dialect supports adding constraints after table creation.
    fn supports_add_constraint(&self) -> bool;

    /// Returns the SQL type name for the given type.
    fn type_name(&self, sql_type: &SqlType) -> String {
        sql_type.sql_name()
    }

    /// Quote an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    /// Generates column definition SQL.
    fn column_definition(&self, column: &ColumnSchema) -> String {
        let mut parts = vec![
            self.quote_identifier(&column.name),
            self.type_name(&column.sql_type),
        ];

        if column.primary_key {
            parts.push("PRIMARY KEY".to_string());
        } else if !column.nullable {
            parts.push("NOT NULL".to_string());
        }

        if let Some(default_sql) = column.default.to_sql() {
            parts.push(format!("DEFAULT {default_sql}"));
        }

        parts.join(" ")
    }

    /// Generates a table-level constraint clause.
    fn constraint_definition(&self, constraint: &ConstraintSchema) -> String {
        match constraint {
            ConstraintSchema::Unique { name, columns } => format!(
                "CONSTRAINT {} UNIQUE ({})",
                self.quote_identifier(name),
                self.quote_list(columns)
            ),
            ConstraintSchema::Check { name, expression } => format!(
                "CONSTRAINT {} CHECK ({expression})",
                self.quote_identifier(name)
            ),
        }
    }

    /// Quotes and comma-joins a list of identifiers.
    fn quote_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.quote_identifier(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Generates `CREATE TABLE` followed by one `CREATE INDEX` per index.
    fn create_table_sql(&self, schema: &TableSchema) -> Result<Vec<String>> {
        let mut defs: Vec<String> = schema
            .columns
            .iter()
            .map(|c| self.column_definition(c))
            .collect();
        defs.extend(
            schema
                .constraints
                .iter()
                .map(|c| self.constraint_definition(c)),
        );

        let mut statements = vec![format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.quote_identifier(&schema.name),
            defs.join(",\n  ")
        )];
        for index in &schema.indexes {
            statements.push(self.create_index_sql(&schema.name, index)?);
        }
        Ok(statements)
    }

    /// Generates `ALTER TABLE ... ADD CONSTRAINT` for an existing table.
    ///
    /// Fails with [`MigrateError::Unsupported`] when the dialect cannot add
    /// constraints after creation.
    fn add_constraint_sql(&self, table: &str, constraint: &ConstraintSchema) -> Result<String> {
        if !self.supports_add_constraint() {
            return Err(self.unsupported(&MigrationOperation::add_constraint(
                table,
                constraint.clone(),
            )));
        }
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.quote_identifier(table),
            self.constraint_definition(constraint)
        ))
    }

    /// Builds the error returned for operations this dialect cannot express.
    fn unsupported(&self, operation: &MigrationOperation) -> MigrateError {
        MigrateError::Unsupported {
            operation: operation.description(),
            dialect: self.name(),
        }
    }
}
