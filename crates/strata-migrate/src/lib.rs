//! Schema migrations for record tables.
//!
//! `strata-migrate` compares the schema a record type declares with the
//! live table and produces an ordered list of operations that bring the
//! table up to date. Every operation carries the full definition of what it
//! touches, so a migration can always be reverted.
//!
//! # Architecture
//!
//! - **Schema** - Declared and introspected tables (`TableSchema`, `ColumnSchema`, ...)
//! - **Planner** - Diffs a declared table against the live one
//! - **Operations** - `CreateTable`, `AddColumn`, `CreateIndex`, ... and their inverses
//! - **Dialect** - Database-specific SQL generation
//! - **Backend** - Introspection and DDL execution (`SqliteBackend`)
//! - **Migration** - The `Unapplied -> Applied -> Reverted` state machine
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_migrate::prelude::*;
//!
//! struct Person;
//!
//! impl RecordType for Person {
//!     const TABLE: &'static str = "person";
//!
//!     fn attributes() -> Vec<ColumnSchema> {
//!         vec![
//!             ColumnSchema::new("name", SqlType::Text),
//!             ColumnSchema::new("age", SqlType::Integer),
//!         ]
//!     }
//! }
//!
//! # async fn run() -> strata_migrate::Result<()> {
//! let mut backend = SqliteBackend::connect("sqlite:app.db").await?;
//! let mut migration = Migration::for_record::<Person, _>(&mut backend).await?;
//! migration.apply(&mut backend).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Show what would change
//! strata-migrate plan --schema person.json
//!
//! # Apply and keep the migration for a later revert
//! strata-migrate apply --schema person.json --save person.plan.json
//!
//! # Undo it
//! strata-migrate revert --plan person.plan.json
//! ```

// Backends are driven from a single task; their futures need not be Send.
#![allow(clippy::future_not_send)]

pub mod backend;
pub mod dialect;
pub mod error;
pub mod introspect;
pub mod migration;
pub mod operations;
pub mod planner;
pub mod record;
pub mod schema;

pub use error::{MigrateError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::{SchemaBackend, SqliteBackend};
    pub use crate::dialect::{GenericDialect, MigrationDialect, SqliteDialect};
    pub use crate::error::{MigrateError, Result};
    pub use crate::migration::{migrate, Migration, MigrationState};
    pub use crate::operations::MigrationOperation;
    pub use crate::planner::plan;
    pub use crate::record::RecordType;
    pub use crate::schema::{
        ColumnSchema, ConstraintSchema, DefaultValue, IndexSchema, SqlType, TableSchema,
    };
    pub use strata_core::IndexType;
}
