//! Thin database abstraction: predicate compilation per SQL dialect, placeholder
//! translation, and single-link connections with nested transactions.
//!
//! ```rust
//! use sql_dbal::prelude::*;
//!
//! let expr = Expression::and(vec![
//!     Expression::eq("status", vec![1_i64, 2]),
//!     Expression::starts_with("label", "ab"),
//! ]);
//! let compiled = Compiler::new(&Sqlite).compile(&expr)?;
//! assert_eq!(compiled.sql, "(status IN (?,?) AND label LIKE ? ESCAPE '\\')");
//! assert_eq!(compiled.params.len(), 3);
//! # Ok::<(), DbalError>(())
//! ```

pub mod compiler;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod expression;
pub mod prelude;
pub mod process;
pub mod render;
pub mod results;
pub mod statement;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use compiler::{CompiledPredicate, Compiler, FieldMap};
pub use connection::{Connection, ConnectionConfig, Driver, DriverOptions, Link};
pub use dialect::{Dialect, DialectKind};
pub use error::{DbalError, DriverError};
pub use expression::{Expression, Operand, Operator};
pub use results::{CustomDbRow, ResultSet};
pub use statement::{ResultHandle, Statement};
pub use types::RowValues;
