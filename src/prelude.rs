//! Convenient imports for common functionality.
//!
//! ```rust
//! use sql_dbal::prelude::*;
//! ```

pub use crate::compiler::{CompiledPredicate, Compiler, FieldMap};
pub use crate::connection::{
    ColumnCase, Connection, ConnectionConfig, ConnectionConfigBuilder, ConnectionParams, Driver,
    DriverOptions, Link, NullHandling,
};
pub use crate::dialect::{Dialect, DialectKind, Mssql, Mysql, Postgres, Sqlite};
pub use crate::error::{DbalError, DriverError};
pub use crate::expression::{Expression, Operand, Operator};
pub use crate::process::{SerialRunner, TaskRunner};
pub use crate::render::{Helper, RenderHost};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::statement::{ResultHandle, Statement};
pub use crate::translation::{
    PlaceholderStyle, count_placeholders, has_placeholders, translate_placeholders,
};
pub use crate::types::RowValues;

#[cfg(feature = "postgres")]
pub use crate::postgres::{PostgresDriver, PostgresLink};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDriver, SqliteLink};
