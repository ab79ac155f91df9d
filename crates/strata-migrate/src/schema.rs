//! Schema representation types.
//!
//! These types describe the structure of a table and are used both for what a
//! record type declares and for what introspection finds in the database.

use serde::{Deserialize, Serialize};
use strata_core::IndexType;

/// Logical SQL column types.
///
/// Each type renders to a declared type name that [`SqlType::parse`] maps
/// back to the same variant, so a type survives a trip through the database
/// catalog unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Integer (32-bit).
    Integer,
    /// Big integer (64-bit).
    BigInt,
    /// Small integer (16-bit).
    SmallInt,
    /// Unbounded text.
    Text,
    /// Variable-length character string.
    Varchar(u32),
    /// Boolean.
    Boolean,
    /// Floating point (single precision).
    Real,
    /// Floating point (double precision).
    Double,
    /// Decimal with precision and scale.
    Decimal(u8, u8),
    /// Binary large object.
    Blob,
    /// Date and time.
    Timestamp,
    /// Date only.
    Date,
    /// Any other declared type, kept verbatim.
    Custom(String),
}

impl SqlType {
    /// Returns the declared type name.
    #[must_use]
    pub fn sql_name(&self) -> String {
        match self {
            Self::Integer => "INTEGER".to_string(),
            Self::BigInt => "BIGINT".to_string(),
            Self::SmallInt => "SMALLINT".to_string(),
            Self::Text => "TEXT".to_string(),
            Self::Varchar(len) => format!("VARCHAR({len})"),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Real => "REAL".to_string(),
            Self::Double => "DOUBLE".to_string(),
            Self::Decimal(p, s) => format!("DECIMAL({p},{s})"),
            Self::Blob => "BLOB".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parses a declared type name as reported by the database.
    ///
    /// Unknown names become [`SqlType::Custom`].
    #[must_use]
    pub fn parse(declared: &str) -> Self {
        let trimmed = declared.trim();
        let upper = trimmed.to_ascii_uppercase();
        let (base, args) = match upper.split_once('(') {
            Some((base, rest)) => (base.trim(), rest.strip_suffix(')')),
            None => (upper.as_str(), None),
        };

        match (base, args) {
            ("INTEGER" | "INT", None) => Self::Integer,
            ("BIGINT", None) => Self::BigInt,
            ("SMALLINT", None) => Self::SmallInt,
            ("TEXT", None) => Self::Text,
            ("BOOLEAN" | "BOOL", None) => Self::Boolean,
            ("REAL", None) => Self::Real,
            ("DOUBLE", None) => Self::Double,
            ("BLOB", None) => Self::Blob,
            ("TIMESTAMP", None) => Self::Timestamp,
            ("DATE", None) => Self::Date,
            ("VARCHAR", Some(len)) => len
                .trim()
                .parse()
                .map_or_else(|_| Self::Custom(trimmed.to_string()), Self::Varchar),
            ("DECIMAL", Some(args)) => {
                let parsed = args
                    .split_once(',')
                    .and_then(|(p, s)| {
                        Some((p.trim().parse::<u8>().ok()?, s.trim().parse::<u8>().ok()?))
                    });
                match parsed {
                    Some((p, s)) => Self::Decimal(p, s),
                    None => Self::Custom(trimmed.to_string()),
                }
            }
            _ => Self::Custom(trimmed.to_string()),
        }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum DefaultValue {
    /// No default value.
    #[default]
    None,
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value.
    #[must_use]
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Null => Some("NULL".to_string()),
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::Expression(expr) => Some(expr.clone()),
        }
    }

    /// Reads a default as the database catalog reports it.
    #[must_use]
    pub fn from_sql(sql: Option<&str>) -> Self {
        let Some(sql) = sql.map(str::trim) else {
            return Self::None;
        };
        if sql.eq_ignore_ascii_case("NULL") {
            return Self::Null;
        }
        if let Ok(i) = sql.parse::<i64>() {
            return Self::Integer(i);
        }
        if let Ok(f) = sql.parse::<f64>() {
            return Self::Float(f);
        }
        match sql.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            Some(inner) => Self::String(inner.replace("''", "'")),
            None => Self::Expression(sql.to_string()),
        }
    }

    /// Reads a default back for a column of type `sql_type`.
    ///
    /// Boolean defaults are stored as `0`/`1`, so on boolean columns those
    /// integers read back as [`DefaultValue::Bool`].
    #[must_use]
    pub fn from_sql_typed(sql: Option<&str>, sql_type: &SqlType) -> Self {
        match (Self::from_sql(sql), sql_type) {
            (Self::Integer(0), SqlType::Boolean) => Self::Bool(false),
            (Self::Integer(1), SqlType::Boolean) => Self::Bool(true),
            (value, _) => value,
        }
    }

    /// Returns true when no default is set.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

const fn default_true() -> bool {
    true
}

/// Column schema definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// SQL data type.
    pub sql_type: SqlType,
    /// Whether the column accepts NULL.
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Whether this column is the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "DefaultValue::is_none")]
    pub default: DefaultValue,
}

impl ColumnSchema {
    /// Creates a nullable column with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            primary_key: false,
            default: DefaultValue::None,
        }
    }

    /// Makes the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Makes the column the primary key (implies NOT NULL).
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }
}

/// Index schema definition.
///
/// An index without a name is matched against the live schema by its column
/// list alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Index name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Index kind.
    #[serde(default)]
    pub index_type: IndexType,
    /// Indexed columns, in key order.
    pub columns: Vec<String>,
}

impl IndexSchema {
    /// Creates an anonymous non-unique index.
    #[must_use]
    pub fn new(columns: &[&str]) -> Self {
        Self {
            name: None,
            index_type: IndexType::NonUnique,
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Creates a named non-unique index.
    #[must_use]
    pub fn named(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(columns).name(name)
    }

    /// Sets the index name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the index kind.
    #[must_use]
    pub fn index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(self) -> Self {
        self.index_type(IndexType::Unique)
    }

    /// Makes the index clustered.
    #[must_use]
    pub fn clustered(self) -> Self {
        self.index_type(IndexType::Clustered)
    }

    /// Returns the declared name, or the generated one for anonymous indexes:
    /// `idx_<table>_<columns>`, `uq_` instead of `idx_` when unique.
    #[must_use]
    pub fn effective_name(&self, table: &str) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let prefix = if self.index_type.is_unique() {
            "uq"
        } else {
            "idx"
        };
        format!("{prefix}_{table}_{}", self.columns.join("_"))
    }
}

/// Table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintSchema {
    /// `CONSTRAINT name UNIQUE (columns)`
    Unique {
        /// Constraint name.
        name: String,
        /// Constrained columns.
        columns: Vec<String>,
    },
    /// `CONSTRAINT name CHECK (expression)`
    Check {
        /// Constraint name.
        name: String,
        /// Boolean SQL expression.
        expression: String,
    },
}

impl ConstraintSchema {
    /// Creates a named unique constraint.
    #[must_use]
    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::Unique {
            name: name.into(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Creates a named check constraint.
    #[must_use]
    pub fn check(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::Check {
            name: name.into(),
            expression: expression.into(),
        }
    }

    /// Returns the constraint name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Unique { name, .. } | Self::Check { name, .. } => name,
        }
    }
}

/// Full table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Columns, in declaration order.
    pub columns: Vec<ColumnSchema>,
    /// Secondary indexes.
    #[serde(default)]
    pub indexes: Vec<IndexSchema>,
    /// Table-level constraints.
    #[serde(default)]
    pub constraints: Vec<ConstraintSchema>,
}

impl TableSchema {
    /// Creates an empty table schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: IndexSchema) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: ConstraintSchema) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Checks if the table has a column.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// Gets an index by name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&IndexSchema> {
        self.indexes
            .iter()
            .find(|i| i.name.as_deref() == Some(name))
    }

    /// Gets a constraint by name.
    #[must_use]
    pub fn get_constraint(&self, name: &str) -> Option<&ConstraintSchema> {
        self.constraints.iter().find(|c| c.name() == name)
    }
}
