//! Migration planning.
//!
//! Compares the declared schema of a table with what introspection found and
//! produces the operations that bring the database up to the declaration.
//! Planning is pure: it never talks to the database.

use std::collections::{HashMap, HashSet};

use strata_core::{Catalog, QueryError};
use tracing::debug;

use crate::error::Result;
use crate::operations::MigrationOperation;
use crate::schema::{ConstraintSchema, IndexSchema, TableSchema};

/// Computes the operations that turn `live` into `declared`.
///
/// - A missing table yields a single `CreateTable` carrying every declared
///   column, index and constraint.
/// - An existing table yields `AddColumn`, then `CreateIndex`, then
///   `AddConstraint` for whatever is missing, each group in declaration
///   order.
/// - Objects present in the database but not declared are left alone.
///
/// Anonymous indexes are satisfied by any live index over the same ordered
/// columns. When one has to be created it is given its generated name (see
/// [`IndexSchema::effective_name`]) so the operation can be inverted.
pub fn plan(declared: &TableSchema, live: Option<&TableSchema>) -> Result<Vec<MigrationOperation>> {
    validate(declared)?;

    let Some(live) = live else {
        debug!(table = %declared.name, "Table missing, planning creation");
        let mut schema = declared.clone();
        schema.indexes = declared
            .indexes
            .iter()
            .map(|index| resolve_name(index, &declared.name))
            .collect();
        return Ok(vec![MigrationOperation::create_table(schema)]);
    };

    let table = declared.name.as_str();
    let mut operations = Vec::new();

    for column in &declared.columns {
        if !live.has_column(&column.name) {
            debug!(table = %table, column = %column.name, "Column missing");
            operations.push(MigrationOperation::add_column(table, column.clone()));
        }
    }

    for index in &declared.indexes {
        if !index_satisfied(index, live) {
            let index = resolve_name(index, table);
            debug!(table = %table, index = %index.effective_name(table), "Index missing");
            operations.push(MigrationOperation::create_index(table, index));
        }
    }

    for constraint in &declared.constraints {
        if !constraint_satisfied(constraint, live) {
            debug!(table = %table, constraint = %constraint.name(), "Constraint missing");
            operations.push(MigrationOperation::add_constraint(table, constraint.clone()));
        }
    }

    Ok(operations)
}

/// Rejects declarations that could never produce valid DDL.
fn validate(declared: &TableSchema) -> Result<()> {
    let table = declared.name.as_str();
    if table.is_empty() {
        return Err(QueryError::invalid_argument("empty table name", "CREATE TABLE").into());
    }
    if declared.columns.is_empty() {
        return Err(QueryError::invalid_argument(
            format!("table '{table}' declares no columns"),
            format!("CREATE TABLE {table} ()"),
        )
        .into());
    }

    let mut seen = HashSet::new();
    for column in &declared.columns {
        if column.name.is_empty() {
            return Err(QueryError::invalid_argument(
                "empty column name",
                format!("CREATE TABLE {table}"),
            )
            .into());
        }
        if !seen.insert(column.name.as_str()) {
            return Err(QueryError::invalid_argument(
                format!("column '{}' declared twice", column.name),
                format!("CREATE TABLE {table}"),
            )
            .into());
        }
    }

    check_index_names(declared)?;

    let names: Vec<&str> = declared.columns.iter().map(|c| c.name.as_str()).collect();
    let catalog = Catalog::new().with_table(table, &names);

    for index in &declared.indexes {
        let name = index.effective_name(table);
        let ddl = index
            .index_type
            .to_sql(table, Some(name.as_str()), &index.columns)?;
        for column in &index.columns {
            catalog.check_column(table, column, &ddl)?;
        }
    }

    for constraint in &declared.constraints {
        if constraint.name().is_empty() {
            return Err(QueryError::invalid_argument(
                "constraints must be named",
                format!("ALTER TABLE {table} ADD CONSTRAINT"),
            )
            .into());
        }
        if let ConstraintSchema::Unique { name, columns } = constraint {
            let fragment = format!("CONSTRAINT {name} UNIQUE ({})", columns.join(", "));
            if columns.is_empty() {
                return Err(QueryError::invalid_argument("empty column list", fragment).into());
            }
            for column in columns {
                catalog.check_column(table, column, &fragment)?;
            }
        }
    }

    Ok(())
}

/// Index names share one namespace with unique constraints, which SQLite
/// backs with indexes of the same name.
fn check_index_names(declared: &TableSchema) -> Result<()> {
    let table = declared.name.as_str();
    let mut seen: HashMap<String, String> = HashMap::new();

    let indexes = declared.indexes.iter().map(|index| {
        (
            index.effective_name(table),
            format!("index on ({})", index.columns.join(", ")),
        )
    });
    let constraints = declared.constraints.iter().filter_map(|constraint| match constraint {
        ConstraintSchema::Unique { name, columns } => Some((
            name.clone(),
            format!("unique constraint on ({})", columns.join(", ")),
        )),
        ConstraintSchema::Check { .. } => None,
    });

    for (name, owner) in indexes.chain(constraints) {
        if let Some(previous) = seen.get(&name) {
            return Err(QueryError::invalid_argument(
                format!("{previous} and {owner} are both named '{name}'"),
                format!("CREATE INDEX {name} ON {table}"),
            )
            .into());
        }
        seen.insert(name, owner);
    }
    Ok(())
}

fn resolve_name(index: &IndexSchema, table: &str) -> IndexSchema {
    let mut resolved = index.clone();
    resolved.name = Some(index.effective_name(table));
    resolved
}

/// Anonymous indexes match on columns and uniqueness. Clustered and plain
/// indexes are interchangeable since SQLite stores both as plain indexes.
fn index_satisfied(index: &IndexSchema, live: &TableSchema) -> bool {
    match &index.name {
        Some(name) => live.get_index(name).is_some(),
        None => live.indexes.iter().any(|l| {
            l.columns == index.columns && l.index_type.is_unique() == index.index_type.is_unique()
        }),
    }
}

/// Unique constraints added to an existing SQLite table live on as unique
/// indexes, so a unique index with the constraint's name also counts.
fn constraint_satisfied(constraint: &ConstraintSchema, live: &TableSchema) -> bool {
    if live.get_constraint(constraint.name()).is_some() {
        return true;
    }
    match constraint {
        ConstraintSchema::Unique { name, .. } => live
            .get_index(name)
            .is_some_and(|index| index.index_type.is_unique()),
        ConstraintSchema::Check { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::schema::{ColumnSchema, SqlType};

    fn person() -> TableSchema {
        TableSchema::new("person")
            .column(ColumnSchema::new("name", SqlType::Text))
            .column(ColumnSchema::new("age", SqlType::Integer))
    }

    #[test]
    fn test_missing_table_yields_single_create() {
        let ops = plan(&person(), None).unwrap();
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            MigrationOperation::CreateTable { schema } => {
                let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, ["name", "age"]);
            }
            other => panic!("expected CreateTable, got {other:?}"),
        }
    }

    #[test]
    fn test_matching_schema_yields_nothing() {
        let declared = person().index(IndexSchema::named("by_age", &["age"]));
        assert!(plan(&declared, Some(&declared)).unwrap().is_empty());
    }

    #[test]
    fn test_operations_are_grouped_by_kind() {
        let live = TableSchema::new("person").column(ColumnSchema::new("name", SqlType::Text));
        let declared = person()
            .column(ColumnSchema::new("email", SqlType::Text))
            .index(IndexSchema::new(&["email"]).unique())
            .constraint(ConstraintSchema::check("age_positive", "age > 0"));

        let ops = plan(&declared, Some(&live)).unwrap();
        let kinds: Vec<String> = ops.iter().map(MigrationOperation::description).collect();
        assert_eq!(
            kinds,
            [
                "Add column age to person",
                "Add column email to person",
                "Create index uq_person_email on person",
                "Add constraint age_positive to person",
            ]
        );
    }

    #[test]
    fn test_undeclared_live_objects_are_ignored() {
        let live = person()
            .column(ColumnSchema::new("legacy", SqlType::Blob))
            .index(IndexSchema::named("legacy_idx", &["legacy"]));
        assert!(plan(&person(), Some(&live)).unwrap().is_empty());
    }

    #[test]
    fn test_anonymous_index_matches_by_columns() {
        let declared = person().index(IndexSchema::new(&["name", "age"]));
        let live = person().index(IndexSchema::named("whatever", &["name", "age"]));
        assert!(plan(&declared, Some(&live)).unwrap().is_empty());

        let reversed = person().index(IndexSchema::named("whatever", &["age", "name"]));
        let ops = plan(&declared, Some(&reversed)).unwrap();
        assert_eq!(
            ops,
            vec![MigrationOperation::create_index(
                "person",
                IndexSchema::named("idx_person_name_age", &["name", "age"])
            )]
        );
    }

    #[test]
    fn test_create_table_resolves_index_names() {
        let declared = person().index(IndexSchema::new(&["age"]));
        let ops = plan(&declared, None).unwrap();
        match &ops[0] {
            MigrationOperation::CreateTable { schema } => {
                assert_eq!(schema.indexes[0].name.as_deref(), Some("idx_person_age"));
            }
            other => panic!("expected CreateTable, got {other:?}"),
        }
    }

    #[test]
    fn test_unique_constraint_satisfied_by_unique_index() {
        let declared = person().constraint(ConstraintSchema::unique("uq_name", &["name"]));
        let live = person().index(IndexSchema::named("uq_name", &["name"]).unique());
        assert!(plan(&declared, Some(&live)).unwrap().is_empty());
    }

    #[test]
    fn test_index_on_undeclared_column_is_rejected() {
        let declared = person().index(IndexSchema::new(&["nickname"]));
        let err = plan(&declared, None).unwrap_err();
        assert!(matches!(
            err,
            MigrateError::Query(QueryError::Compilation { ref column, .. }) if column == "nickname"
        ));
    }

    #[test]
    fn test_empty_index_is_rejected() {
        let declared = person().index(IndexSchema::new(&[]));
        let err = plan(&declared, None).unwrap_err();
        assert!(matches!(
            err,
            MigrateError::Query(QueryError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let declared = person().column(ColumnSchema::new("age", SqlType::BigInt));
        assert!(plan(&declared, None).is_err());
    }

    #[test]
    fn test_plain_index_does_not_satisfy_unique_one() {
        let declared = person().index(IndexSchema::new(&["name"]).unique());
        let live = person().index(IndexSchema::named("by_name", &["name"]));
        let ops = plan(&declared, Some(&live)).unwrap();
        assert_eq!(
            ops,
            vec![MigrationOperation::create_index(
                "person",
                IndexSchema::named("uq_person_name", &["name"]).unique()
            )]
        );

        let clustered = person().index(IndexSchema::new(&["name"]).clustered());
        assert!(plan(&clustered, Some(&live)).unwrap().is_empty());
    }

    #[test]
    fn test_generated_index_names_must_not_collide() {
        let declared = person()
            .column(ColumnSchema::new("name_age", SqlType::Text))
            .index(IndexSchema::new(&["name", "age"]))
            .index(IndexSchema::new(&["name_age"]));
        let err = plan(&declared, None).unwrap_err();
        match err {
            MigrateError::Query(QueryError::InvalidArgument { message, .. }) => {
                assert!(message.contains("(name, age)"));
                assert!(message.contains("(name_age)"));
                assert!(message.contains("idx_person_name_age"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_index_name_must_not_reuse_unique_constraint_name() {
        let declared = person()
            .index(IndexSchema::new(&["name"]).unique())
            .constraint(ConstraintSchema::unique("uq_person_name", &["name"]));
        assert!(matches!(
            plan(&declared, None),
            Err(MigrateError::Query(QueryError::InvalidArgument { .. }))
        ));
    }
}
