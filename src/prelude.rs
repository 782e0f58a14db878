//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::command::{
    DbContext, Parameter, ParameterDirection, ProcedureCall, SprocContext, StoredProcCommand,
};
pub use crate::config::{ExecuteOptions, SprocOptions};
pub use crate::connection::{AsyncConnection, BlockingConnection, DbConnection, SyncConnection};
pub use crate::conversion::{FromRowValue, assign_field};
pub use crate::cursor::SprocResults;
pub use crate::error::SprocError;
pub use crate::executor::{ROWS_AFFECTED_UNKNOWN, ResultHandler};
pub use crate::mapping::{FieldBinding, SprocRecord};
pub use crate::results::{ResultReader, ResultSet};
pub use crate::types::{CommandBehavior, ConnectionHandling, ConnectionState, RowValues};
pub use crate::{impl_sproc_record, sproc_record};

pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "mssql")]
pub use crate::mssql::{BlockingMssqlConnection, MssqlConnection, MssqlOptions};
