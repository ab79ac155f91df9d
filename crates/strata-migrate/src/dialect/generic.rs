//! Dialect emitting plain ANSI-style DDL.
//!
//! Identifiers are not quoted and index statements are exactly what
//! [`strata_core::IndexType::to_sql`] renders, which makes this dialect the reference for
//! the index DDL format.

use crate::error::Result;
use crate::operations::MigrationOperation;
use crate::schema::IndexSchema;

use super::MigrationDialect;

/// Generic migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MigrationDialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn supports_add_constraint(&self) -> bool {
        true
    }

    fn quote_identifier(&self, name: &str) -> String {
        name.to_string()
    }

    fn create_index_sql(&self, table: &str, index: &IndexSchema) -> Result<String> {
        let name = index.effective_name(table);
        Ok(index.index_type.to_sql(table, Some(name.as_str()), &index.columns)?)
    }

    fn generate_sql(&self, operation: &MigrationOperation) -> Result<Vec<String>> {
        let sql = match operation {
            MigrationOperation::CreateTable { schema } => return self.create_table_sql(schema),
            MigrationOperation::DropTable { schema } => format!("DROP TABLE {}", schema.name),
            MigrationOperation::AddColumn { table, column } => format!(
                "ALTER TABLE {table} ADD COLUMN {}",
                self.column_definition(column)
            ),
            MigrationOperation::DropColumn { table, column } => {
                format!("ALTER TABLE {table} DROP COLUMN {}", column.name)
            }
            MigrationOperation::CreateIndex { table, index } => {
                self.create_index_sql(table, index)?
            }
            MigrationOperation::DropIndex { table, index } => {
                format!("DROP INDEX {}", index.effective_name(table))
            }
            MigrationOperation::AddConstraint { table, constraint } => {
                self.add_constraint_sql(table, constraint)?
            }
            MigrationOperation::DropConstraint { table, constraint } => {
                format!("ALTER TABLE {table} DROP CONSTRAINT {}", constraint.name())
            }
        };
        Ok(vec![sql])
    }
}
