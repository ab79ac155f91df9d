//! SQLite dialect for migrations.
//!
//! SQLite cannot add or drop table constraints after creation. Unique
//! constraints on an existing table are therefore emitted as named unique
//! indexes; check constraints can only be declared at table creation.

use strata_core::IndexType;
use tracing::warn;

use crate::error::Result;
use crate::operations::MigrationOperation;
use crate::schema::{ConstraintSchema, IndexSchema};

use super::MigrationDialect;

/// SQLite migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn index_sql(
        &self,
        index_type: IndexType,
        table: &str,
        name: &str,
        columns: &[String],
    ) -> Result<String> {
        let quoted: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        Ok(index_type.to_sql(
            &self.quote_identifier(table),
            Some(self.quote_identifier(name).as_str()),
            &quoted,
        )?)
    }

    fn drop_index_sql(&self, name: &str) -> String {
        format!("DROP INDEX {}", self.quote_identifier(name))
    }
}

impl MigrationDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn supports_add_constraint(&self) -> bool {
        false
    }

    fn create_index_sql(&self, table: &str, index: &IndexSchema) -> Result<String> {
        let name = index.effective_name(table);
        let index_type = match index.index_type {
            IndexType::Clustered => {
                warn!(
                    table = %table,
                    index = %name,
                    "SQLite has no clustered indexes, creating a plain index"
                );
                IndexType::NonUnique
            }
            other => other,
        };
        self.index_sql(index_type, table, &name, &index.columns)
    }

    fn generate_sql(&self, operation: &MigrationOperation) -> Result<Vec<String>> {
        match operation {
            MigrationOperation::CreateTable { schema } => self.create_table_sql(schema),

            MigrationOperation::DropTable { schema } => Ok(vec![format!(
                "DROP TABLE {}",
                self.quote_identifier(&schema.name)
            )]),

            MigrationOperation::AddColumn { table, column } => Ok(vec![format!(
                "ALTER TABLE {} ADD COLUMN {}",
                self.quote_identifier(table),
                self.column_definition(column)
            )]),

            // SQLite 3.35.0+
            MigrationOperation::DropColumn { table, column } => Ok(vec![format!(
                "ALTER TABLE {} DROP COLUMN {}",
                self.quote_identifier(table),
                self.quote_identifier(&column.name)
            )]),

            MigrationOperation::CreateIndex { table, index } => {
                Ok(vec![self.create_index_sql(table, index)?])
            }

            MigrationOperation::DropIndex { table, index } => {
                Ok(vec![self.drop_index_sql(&index.effective_name(table))])
            }

            MigrationOperation::AddConstraint { table, constraint } => match constraint {
                ConstraintSchema::Unique { name, columns } => Ok(vec![self.index_sql(
                    IndexType::Unique,
                    table,
                    name,
                    columns,
                )?]),
                ConstraintSchema::Check { .. } => {
                    Ok(vec![self.add_constraint_sql(table, constraint)?])
                }
            },

            MigrationOperation::DropConstraint { constraint, .. } => match constraint {
                ConstraintSchema::Unique { name, .. } => Ok(vec![self.drop_index_sql(name)]),
                ConstraintSchema::Check { .. } => Err(self.unsupported(operation)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::schema::{ColumnSchema, DefaultValue, SqlType, TableSchema};

    fn users() -> TableSchema {
        TableSchema::new("users")
            .column(ColumnSchema::new("id", SqlType::Integer).primary_key())
            .column(ColumnSchema::new("email", SqlType::Varchar(255)).not_null())
            .column(
                ColumnSchema::new("active", SqlType::Boolean).default(DefaultValue::Bool(true)),
            )
            .index(IndexSchema::named("idx_users_email", &["email"]).unique())
            .constraint(ConstraintSchema::check("email_not_blank", "length(email) > 0"))
    }

    #[test]
    fn test_create_table() {
        let sql = SqliteDialect::new()
            .generate_sql(&MigrationOperation::create_table(users()))
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE \"users\" (\n  \"id\" INTEGER PRIMARY KEY,\n  \"email\" VARCHAR(255) NOT NULL,\n  \"active\" BOOLEAN DEFAULT 1,\n  CONSTRAINT \"email_not_blank\" CHECK (length(email) > 0)\n)".to_string(),
                "CREATE UNIQUE INDEX \"idx_users_email\" ON \"users\" (\"email\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_drop_table() {
        let sql = SqliteDialect::new()
            .generate_sql(&MigrationOperation::DropTable { schema: users() })
            .unwrap();
        assert_eq!(sql, vec!["DROP TABLE \"users\"".to_string()]);
    }

    #[test]
    fn test_add_and_drop_column() {
        let dialect = SqliteDialect::new();
        let add = MigrationOperation::add_column("users", ColumnSchema::new("bio", SqlType::Text));
        assert_eq!(
            dialect.generate_sql(&add).unwrap(),
            vec!["ALTER TABLE \"users\" ADD COLUMN \"bio\" TEXT".to_string()]
        );
        assert_eq!(
            dialect.generate_sql(&add.inverse()).unwrap(),
            vec!["ALTER TABLE \"users\" DROP COLUMN \"bio\"".to_string()]
        );
    }

    #[test]
    fn test_plain_index_keeps_index_dsl_spacing() {
        let op = MigrationOperation::create_index("users", IndexSchema::new(&["email", "id"]));
        assert_eq!(
            SqliteDialect::new().generate_sql(&op).unwrap(),
            vec!["CREATE  INDEX \"idx_users_email_id\" ON \"users\" (\"email\", \"id\")".to_string()]
        );
    }

    #[test]
    fn test_clustered_index_degrades() {
        let op = MigrationOperation::create_index(
            "users",
            IndexSchema::named("by_id", &["id"]).clustered(),
        );
        assert_eq!(
            SqliteDialect::new().generate_sql(&op).unwrap(),
            vec!["CREATE  INDEX \"by_id\" ON \"users\" (\"id\")".to_string()]
        );
    }

    #[test]
    fn test_drop_index_uses_generated_name() {
        let op = MigrationOperation::DropIndex {
            table: "users".into(),
            index: IndexSchema::new(&["email"]).unique(),
        };
        assert_eq!(
            SqliteDialect::new().generate_sql(&op).unwrap(),
            vec!["DROP INDEX \"uq_users_email\"".to_string()]
        );
    }

    #[test]
    fn test_unique_constraint_becomes_index() {
        let op = MigrationOperation::add_constraint(
            "users",
            ConstraintSchema::unique("uq_email", &["email"]),
        );
        let dialect = SqliteDialect::new();
        assert_eq!(
            dialect.generate_sql(&op).unwrap(),
            vec!["CREATE UNIQUE INDEX \"uq_email\" ON \"users\" (\"email\")".to_string()]
        );
        assert_eq!(
            dialect.generate_sql(&op.inverse()).unwrap(),
            vec!["DROP INDEX \"uq_email\"".to_string()]
        );
    }

    #[test]
    fn test_check_constraint_on_existing_table_is_unsupported() {
        let op = MigrationOperation::add_constraint(
            "users",
            ConstraintSchema::check("positive", "id > 0"),
        );
        let err = SqliteDialect::new().generate_sql(&op).unwrap_err();
        assert!(matches!(err, MigrateError::Unsupported { dialect: "sqlite", .. }));
    }
}
