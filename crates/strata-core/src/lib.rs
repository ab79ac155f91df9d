//! # strata-core
//!
//! Immutable query descriptors and their SQL compilation.
//!
//! This crate provides:
//! - A filter [`Condition`] tree built from [`col`], compiled to a
//!   parameterized WHERE fragment
//! - An [`Order`] of sort keys and [`JoinSpec`] join descriptions
//! - A [`Scope`] bundling condition, order and limit, usable as a cache key
//! - A [`Select`] builder assembling the full statement
//! - [`IndexType`] rendering of `CREATE ... INDEX` statements
//!
//! Descriptors never fail to build. Malformed input and unknown columns are
//! reported when compiling, and only then.
//!
//! ```rust
//! use strata_core::{col, Condition};
//!
//! let condition = col("age").gt_eq(18).and(col("name").starts_with("A"));
//! let (sql, params) = condition.build().unwrap();
//!
//! assert_eq!(sql, "(age >= ?) AND (name LIKE ?)");
//! assert_eq!(params.len(), 2);
//! ```
//!
//! ## Column checking
//!
//! Supplying a [`Catalog`] resolves every referenced column:
//!
//! ```rust
//! use strata_core::{col, Catalog, QueryError};
//!
//! let catalog = Catalog::new().with_table("users", &["id", "name"]);
//! let err = col("email").eq("a@b.c").build_checked(&catalog, "users").unwrap_err();
//! assert!(matches!(err, QueryError::Compilation { .. }));
//! ```

mod catalog;
mod condition;
mod error;
mod index;
mod join;
mod order;
mod scope;
pub mod select;
mod value;

pub use catalog::{Catalog, Table};
pub use condition::{AttributeValidator, Column, CompareOp, Condition, col};
pub use error::{QueryError, Result};
pub use index::IndexType;
pub use join::{JoinSpec, JoinType};
pub use order::{Direction, Order, SortKey};
pub use scope::{NO_LIMIT, Scope};
pub use select::Select;
pub use value::{SqlValue, ToSqlValue};
