//! Planned migrations and their execution.
//!
//! A [`Migration`] is computed once from a declared table and the live
//! schema, then applied and possibly reverted. Its lifecycle is
//! `Unapplied -> Applied -> Reverted`; a reverted migration may be applied
//! again.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::SchemaBackend;
use crate::dialect::MigrationDialect;
use crate::error::{MigrateError, Result};
use crate::operations::MigrationOperation;
use crate::planner;
use crate::record::RecordType;
use crate::schema::TableSchema;

/// Where a migration is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MigrationState {
    /// Planned, not yet run.
    #[default]
    Unapplied,
    /// All operations ran and were committed.
    Applied,
    /// The inverse operations ran and were committed.
    Reverted,
}

/// An ordered, revertible list of schema operations for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    table: String,
    operations: Vec<MigrationOperation>,
    #[serde(default)]
    state: MigrationState,
}

impl Migration {
    /// Creates an unapplied migration from explicit operations.
    #[must_use]
    pub fn new(table: impl Into<String>, operations: Vec<MigrationOperation>) -> Self {
        Self {
            table: table.into(),
            operations,
            state: MigrationState::Unapplied,
        }
    }

    /// Plans the migration from `declared` to the given live snapshot.
    pub fn plan(declared: &TableSchema, live: Option<&TableSchema>) -> Result<Self> {
        Ok(Self::new(
            declared.name.clone(),
            planner::plan(declared, live)?,
        ))
    }

    /// Introspects `declared`'s table through `backend` and plans against it.
    pub async fn plan_against<B: SchemaBackend>(
        backend: &mut B,
        declared: &TableSchema,
    ) -> Result<Self> {
        let live = backend.introspect_table(&declared.name).await?;
        Self::plan(declared, live.as_ref())
    }

    /// Plans the migration for a record type.
    pub async fn for_record<R: RecordType, B: SchemaBackend>(backend: &mut B) -> Result<Self> {
        Self::plan_against(backend, &TableSchema::from_record::<R>()).await
    }

    /// Returns the table this migration changes.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the operations, in application order.
    #[must_use]
    pub fn operations(&self) -> &[MigrationOperation] {
        &self.operations
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MigrationState {
        self.state
    }

    /// Returns true when there is nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the operations that undo this migration, in execution order.
    #[must_use]
    pub fn inverse_operations(&self) -> Vec<MigrationOperation> {
        self.operations
            .iter()
            .rev()
            .map(MigrationOperation::inverse)
            .collect()
    }

    /// Renders the forward statements without executing them.
    pub fn sql<D: MigrationDialect + ?Sized>(&self, dialect: &D) -> Result<Vec<String>> {
        render(dialect, &self.operations)
    }

    /// Renders the revert statements without executing them.
    pub fn revert_sql<D: MigrationDialect + ?Sized>(&self, dialect: &D) -> Result<Vec<String>> {
        render(dialect, &self.inverse_operations())
    }

    /// Runs the operations against `backend`.
    ///
    /// On failure the state is left unchanged and the error reports how far
    /// execution got.
    pub async fn apply<B: SchemaBackend>(&mut self, backend: &mut B) -> Result<()> {
        if self.state == MigrationState::Applied {
            return Err(MigrateError::InvalidState(format!(
                "migration for '{}' is already applied",
                self.table
            )));
        }

        info!(
            table = %self.table,
            operations = self.operations.len(),
            "Applying migration"
        );
        execute(backend, &self.operations).await?;
        self.state = MigrationState::Applied;
        info!(table = %self.table, "Migration applied successfully");
        Ok(())
    }

    /// Runs the inverse operations, in reverse order.
    pub async fn revert<B: SchemaBackend>(&mut self, backend: &mut B) -> Result<()> {
        if self.state != MigrationState::Applied {
            return Err(MigrateError::InvalidState(format!(
                "migration for '{}' is {:?}, only an applied migration can be reverted",
                self.table, self.state
            )));
        }

        info!(table = %self.table, "Reverting migration");
        let inverse = self.inverse_operations();
        for operation in inverse.iter().filter(|op| op.is_destructive()) {
            warn!(operation = %operation.description(), "Revert discards data");
        }
        execute(backend, &inverse).await?;
        self.state = MigrationState::Reverted;
        info!(table = %self.table, "Migration reverted successfully");
        Ok(())
    }

    /// Writes the migration, state included, as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), "Saved migration");
        Ok(())
    }

    /// Reads a migration written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Brings `declared`'s table up to date and returns the applied migration.
///
/// When the table already matches, the returned migration is empty but still
/// `Applied`, so it can be saved and reverted like any other.
pub async fn migrate<B: SchemaBackend>(backend: &mut B, declared: &TableSchema) -> Result<Migration> {
    let mut migration = Migration::plan_against(backend, declared).await?;
    if migration.is_empty() {
        info!(table = %declared.name, "Schema up to date");
    }
    migration.apply(backend).await?;
    Ok(migration)
}

fn render<D: MigrationDialect + ?Sized>(
    dialect: &D,
    operations: &[MigrationOperation],
) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    for operation in operations {
        statements.extend(dialect.generate_sql(operation)?);
    }
    Ok(statements)
}

/// Executes `operations` in order, inside one transaction when the dialect
/// allows it.
///
/// Every statement is rendered before anything runs, so an operation the
/// dialect cannot express fails without touching the database.
async fn execute<B: SchemaBackend>(backend: &mut B, operations: &[MigrationOperation]) -> Result<()> {
    let rendered = operations
        .iter()
        .map(|op| backend.dialect().generate_sql(op))
        .collect::<Result<Vec<_>>>()?;
    let transactional = backend.dialect().supports_transactional_ddl();

    if transactional {
        backend.begin().await?;
    }

    for (position, (operation, statements)) in operations.iter().zip(&rendered).enumerate() {
        debug!(operation = %operation.description(), "Running operation");
        for sql in statements {
            if let Err(err) = backend.execute(sql).await {
                let rolled_back = if transactional {
                    match backend.rollback().await {
                        Ok(()) => true,
                        Err(rollback_err) => {
                            warn!(error = %rollback_err, "Rollback failed");
                            false
                        }
                    }
                } else {
                    false
                };
                return Err(MigrateError::MigrationFailed {
                    operation: Box::new(operation.clone()),
                    sql: sql.clone(),
                    completed: operations[..position].to_vec(),
                    rolled_back,
                    message: err.to_string(),
                });
            }
        }
    }

    if transactional {
        backend.commit().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, SqliteDialect};
    use crate::schema::{ColumnSchema, IndexSchema, SqlType};

    /// Backend that records statements and fails on a chosen one.
    #[derive(Default)]
    struct RecordingBackend {
        dialect: GenericDialect,
        log: Vec<String>,
        fail_on: Option<String>,
    }

    impl SchemaBackend for RecordingBackend {
        type Dialect = GenericDialect;

        fn dialect(&self) -> &GenericDialect {
            &self.dialect
        }

        async fn introspect_table(&mut self, _table: &str) -> Result<Option<TableSchema>> {
            Ok(None)
        }

        async fn execute(&mut self, sql: &str) -> Result<()> {
            if self.fail_on.as_deref() == Some(sql) {
                return Err(MigrateError::InvalidState("boom".into()));
            }
            self.log.push(sql.to_string());
            Ok(())
        }

        async fn begin(&mut self) -> Result<()> {
            self.log.push("BEGIN".into());
            Ok(())
        }

        async fn commit(&mut self) -> Result<()> {
            self.log.push("COMMIT".into());
            Ok(())
        }

        async fn rollback(&mut self) -> Result<()> {
            self.log.push("ROLLBACK".into());
            Ok(())
        }
    }

    fn ops() -> Vec<MigrationOperation> {
        vec![
            MigrationOperation::add_column("t", ColumnSchema::new("a", SqlType::Text)),
            MigrationOperation::add_column("t", ColumnSchema::new("b", SqlType::Text)),
            MigrationOperation::create_index("t", IndexSchema::named("t_ab", &["a", "b"])),
        ]
    }

    #[tokio::test]
    async fn test_state_machine() {
        let mut backend = RecordingBackend::default();
        let mut migration = Migration::new("t", ops());
        assert_eq!(migration.state(), MigrationState::Unapplied);

        assert!(matches!(
            migration.revert(&mut backend).await,
            Err(MigrateError::InvalidState(_))
        ));

        migration.apply(&mut backend).await.unwrap();
        assert_eq!(migration.state(), MigrationState::Applied);
        assert!(matches!(
            migration.apply(&mut backend).await,
            Err(MigrateError::InvalidState(_))
        ));

        migration.revert(&mut backend).await.unwrap();
        assert_eq!(migration.state(), MigrationState::Reverted);

        migration.apply(&mut backend).await.unwrap();
        assert_eq!(migration.state(), MigrationState::Applied);
    }

    #[tokio::test]
    async fn test_revert_runs_inverses_in_reverse_order() {
        let mut backend = RecordingBackend::default();
        let mut migration = Migration::new("t", ops());
        migration.apply(&mut backend).await.unwrap();
        backend.log.clear();

        migration.revert(&mut backend).await.unwrap();
        assert_eq!(
            backend.log,
            [
                "DROP INDEX t_ab",
                "ALTER TABLE t DROP COLUMN b",
                "ALTER TABLE t DROP COLUMN a",
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_reports_completed_prefix() {
        let mut backend = RecordingBackend {
            fail_on: Some("ALTER TABLE t ADD COLUMN b TEXT".into()),
            ..RecordingBackend::default()
        };
        let mut migration = Migration::new("t", ops());

        let err = migration.apply(&mut backend).await.unwrap_err();
        match err {
            MigrateError::MigrationFailed {
                operation,
                sql,
                completed,
                rolled_back,
                message,
            } => {
                assert_eq!(*operation, ops()[1]);
                assert_eq!(sql, "ALTER TABLE t ADD COLUMN b TEXT");
                assert_eq!(completed, ops()[..1].to_vec());
                assert!(!rolled_back);
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(migration.state(), MigrationState::Unapplied);
        // No compensating inverses: only the first statement ran.
        assert_eq!(backend.log, ["ALTER TABLE t ADD COLUMN a TEXT"]);
    }

    #[test]
    fn test_sql_rendering() {
        let migration = Migration::new("t", ops());
        assert_eq!(
            migration.sql(&SqliteDialect::new()).unwrap(),
            vec![
                "ALTER TABLE \"t\" ADD COLUMN \"a\" TEXT".to_string(),
                "ALTER TABLE \"t\" ADD COLUMN \"b\" TEXT".to_string(),
                "CREATE  INDEX \"t_ab\" ON \"t\" (\"a\", \"b\")".to_string(),
            ]
        );
        assert_eq!(migration.revert_sql(&GenericDialect::new()).unwrap().len(), 3);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");

        let migration = Migration::new("t", ops());
        migration.save(&path).unwrap();
        let loaded = Migration::load(&path).unwrap();
        assert_eq!(loaded, migration);
    }
}
