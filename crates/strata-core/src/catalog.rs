//! Column metadata used to check descriptors at compile time.
//!
//! Descriptors compile without metadata. When a [`Catalog`] is supplied,
//! every column a descriptor references is resolved against it and unknown
//! names are reported as [`QueryError::Compilation`].

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{QueryError, Result};

/// Static table metadata.
///
/// Implemented by record types (usually through the attribute-mapping layer)
/// to expose their column list.
pub trait Table {
    /// The SQL table name.
    const NAME: &'static str;

    /// List of all column names.
    const COLUMNS: &'static [&'static str];
}

/// Known tables and their columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table with the given columns.
    #[must_use]
    pub fn with_table(mut self, name: &str, columns: &[&str]) -> Self {
        self.tables.insert(
            String::from(name),
            columns.iter().map(|c| String::from(*c)).collect(),
        );
        self
    }

    /// Adds a table described by a [`Table`] implementation.
    #[must_use]
    pub fn with<T: Table>(self) -> Self {
        self.with_table(T::NAME, T::COLUMNS)
    }

    /// Returns whether `table` is known.
    #[must_use]
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Resolves `column` against the catalog.
    ///
    /// Qualified names (`orders.user_id`) are resolved against their own
    /// table; bare names against `base_table`.
    pub fn check_column(&self, base_table: &str, column: &str, fragment: &str) -> Result<()> {
        let (table, name) = match column.split_once('.') {
            Some((table, name)) => (table, name),
            None => (base_table, column),
        };
        let known = self
            .tables
            .get(table)
            .is_some_and(|columns| columns.contains(name));
        if known {
            Ok(())
        } else {
            Err(QueryError::Compilation {
                table: String::from(table),
                column: String::from(name),
                fragment: String::from(fragment),
            })
        }
    }
}

/// A catalog bound to the table a query is compiled against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolver<'a> {
    pub(crate) catalog: &'a Catalog,
    pub(crate) table: &'a str,
}

impl Resolver<'_> {
    pub(crate) fn check(&self, column: &str, fragment: &str) -> Result<()> {
        self.catalog.check_column(self.table, column, fragment)
    }
}

/// Rejects empty column names, then resolves against the catalog if any.
pub(crate) fn check_column(
    resolver: Option<Resolver<'_>>,
    column: &str,
    fragment: &str,
) -> Result<()> {
    if column.is_empty() {
        return Err(QueryError::invalid_argument("empty column name", fragment));
    }
    match resolver {
        Some(resolver) => resolver.check(column, fragment),
        None => Ok(()),
    }
}
