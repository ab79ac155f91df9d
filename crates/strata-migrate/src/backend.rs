//! Database backends: schema introspection and DDL execution.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::debug;

use crate::dialect::{MigrationDialect, SqliteDialect};
use crate::error::Result;
use crate::introspect::ConstraintParser;
use crate::schema::{ColumnSchema, DefaultValue, IndexSchema, SqlType, TableSchema};
use strata_core::IndexType;

/// A database the migration engine can inspect and change.
///
/// Methods take `&mut self`: a backend runs one statement at a time, and a
/// migration holds it exclusively while running.
#[allow(async_fn_in_trait)]
pub trait SchemaBackend {
    /// Dialect used to render operations for this backend.
    type Dialect: MigrationDialect;

    /// Returns the dialect.
    fn dialect(&self) -> &Self::Dialect;

    /// Reads the live definition of `table`, or `None` if it does not exist.
    async fn introspect_table(&mut self, table: &str) -> Result<Option<TableSchema>>;

    /// Executes one DDL statement.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Opens a transaction.
    async fn begin(&mut self) -> Result<()>;

    /// Commits the open transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the open transaction.
    async fn rollback(&mut self) -> Result<()>;
}

/// SQLite backend over a single connection.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: SqliteConnection,
    dialect: SqliteDialect,
    constraints: ConstraintParser,
}

impl SqliteBackend {
    /// Opens a connection, creating the database file if needed.
    ///
    /// Accepts `sqlite:path.db` and `sqlite::memory:` URLs.
    pub async fn connect(url: &str) -> Result<Self> {
        let conn = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .connect()
            .await?;
        Self::from_connection(conn)
    }

    /// Wraps an open connection.
    pub fn from_connection(conn: SqliteConnection) -> Result<Self> {
        Ok(Self {
            conn,
            dialect: SqliteDialect::new(),
            constraints: ConstraintParser::new()?,
        })
    }

    /// Returns the underlying connection.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Closes the connection.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    async fn introspect_columns(&mut self, table: &str) -> Result<Vec<ColumnSchema>> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, declared, not_null, default, pk)| {
                let sql_type = SqlType::parse(&declared);
                ColumnSchema {
                    name,
                    default: DefaultValue::from_sql_typed(default.as_deref(), &sql_type),
                    sql_type,
                    nullable: not_null == 0 && pk == 0,
                    primary_key: pk > 0,
                }
            })
            .collect())
    }

    async fn introspect_indexes(&mut self, table: &str) -> Result<Vec<IndexSchema>> {
        // origin 'c' is CREATE INDEX; 'u' and 'pk' back inline constraints.
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT name, \"unique\" FROM pragma_index_list(?) WHERE origin = 'c' ORDER BY name",
        )
        .bind(table)
        .fetch_all(&mut self.conn)
        .await?;

        let mut indexes = Vec::with_capacity(rows.len());
        for (name, unique) in rows {
            let columns: Vec<(Option<String>,)> =
                sqlx::query_as("SELECT name FROM pragma_index_info(?) ORDER BY seqno")
                    .bind(name.as_str())
                    .fetch_all(&mut self.conn)
                    .await?;
            indexes.push(IndexSchema {
                name: Some(name),
                index_type: if unique == 0 {
                    IndexType::NonUnique
                } else {
                    IndexType::Unique
                },
                columns: columns.into_iter().filter_map(|(c,)| c).collect(),
            });
        }
        Ok(indexes)
    }
}

impl SchemaBackend for SqliteBackend {
    type Dialect = SqliteDialect;

    fn dialect(&self) -> &SqliteDialect {
        &self.dialect
    }

    async fn introspect_table(&mut self, table: &str) -> Result<Option<TableSchema>> {
        // SQLite identifiers are case-insensitive.
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT name, sql FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
        )
        .bind(table)
        .fetch_optional(&mut self.conn)
        .await?;
        let Some((name, create_sql)) = row else {
            debug!(table = %table, "Table not found");
            return Ok(None);
        };

        let schema = TableSchema {
            columns: self.introspect_columns(&name).await?,
            indexes: self.introspect_indexes(&name).await?,
            constraints: self.constraints.parse(&create_sql),
            name,
        };
        debug!(
            table = %table,
            columns = schema.columns.len(),
            indexes = schema.indexes.len(),
            constraints = schema.constraints.len(),
            "Introspected table"
        );
        Ok(Some(schema))
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "Executing SQL");
        sqlx::query(sql).execute(&mut self.conn).await?;
        Ok(())
    }

    async fn begin(&mut self) -> Result<()> {
        sqlx::query("BEGIN").execute(&mut self.conn).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        sqlx::query("COMMIT").execute(&mut self.conn).await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        sqlx::query("ROLLBACK").execute(&mut self.conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ConstraintSchema;

    async fn backend() -> SqliteBackend {
        SqliteBackend::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_table() {
        let mut backend = backend().await;
        assert!(backend.introspect_table("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_introspect_table() {
        let mut backend = backend().await;
        backend
            .execute(
                "CREATE TABLE \"users\" (\n  \"id\" INTEGER PRIMARY KEY,\n  \"email\" VARCHAR(255) NOT NULL,\n  \"score\" REAL DEFAULT 0.5,\n  CONSTRAINT \"uq_email\" UNIQUE (\"email\")\n)",
            )
            .await
            .unwrap();
        backend
            .execute("CREATE INDEX \"by_score\" ON \"users\" (\"score\", \"id\")")
            .await
            .unwrap();

        let schema = backend.introspect_table("users").await.unwrap().unwrap();
        assert_eq!(
            schema.columns,
            vec![
                ColumnSchema::new("id", SqlType::Integer).primary_key(),
                ColumnSchema::new("email", SqlType::Varchar(255)).not_null(),
                ColumnSchema::new("score", SqlType::Real).default(DefaultValue::Float(0.5)),
            ]
        );
        assert_eq!(
            schema.indexes,
            vec![IndexSchema::named("by_score", &["score", "id"])]
        );
        assert_eq!(
            schema.constraints,
            vec![ConstraintSchema::unique("uq_email", &["email"])]
        );
    }

    #[tokio::test]
    async fn test_rollback_discards_ddl() {
        let mut backend = backend().await;
        backend.begin().await.unwrap();
        backend.execute("CREATE TABLE t (a TEXT)").await.unwrap();
        backend.rollback().await.unwrap();
        assert!(backend.introspect_table("t").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_table_lookup_ignores_case() {
        let mut backend = backend().await;
        backend.execute("CREATE TABLE users (id INTEGER)").await.unwrap();

        let schema = backend.introspect_table("Users").await.unwrap().unwrap();
        assert_eq!(schema.name, "users");
        assert_eq!(schema.columns, vec![ColumnSchema::new("id", SqlType::Integer)]);
    }

    #[tokio::test]
    async fn test_boolean_default_round_trips() {
        let mut backend = backend().await;
        let declared = TableSchema::new("flags").column(
            ColumnSchema::new("active", SqlType::Boolean)
                .not_null()
                .default(DefaultValue::Bool(true)),
        );
        for sql in backend.dialect().create_table_sql(&declared).unwrap() {
            backend.execute(&sql).await.unwrap();
        }

        let live = backend.introspect_table("flags").await.unwrap().unwrap();
        assert_eq!(live.columns, declared.columns);
    }
}
