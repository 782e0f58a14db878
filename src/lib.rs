//! Stored-procedure execution with typed result mapping.
//!
//! A [`DbContext`] builds a [`StoredProcCommand`] with
//! [`load_stored_proc`](DbContext::load_stored_proc); parameters are bound
//! fluently and one of the `execute_*` methods runs it. The execution lifecycle
//! opens the connection when it should, hands a [`SprocResults`] cursor to the
//! result handlers, and always closes what it opened and releases the command.
//!
//! ```rust
//! use sql_sproc::prelude::*;
//! use sql_sproc::test_utils::ScriptedConnection;
//!
//! sproc_record! {
//!     #[derive(Debug, Default)]
//!     pub struct User {
//!         pub id: i64 as "Id",
//!         pub name: String as "Name",
//!     }
//! }
//!
//! # fn demo() -> Result<(), SprocError> {
//! let connection = ScriptedConnection::new().with_result_set(
//!     ResultSet::with_column_names(["Id", "Name"])
//!         .row(vec![RowValues::Int(1), RowValues::Text("ann".into())]),
//! );
//! let mut context = SprocContext::new(connection);
//! let users: Vec<User> = context
//!     .load_stored_proc("GetUsersByStatus")
//!     .with_param("status", "active")?
//!     .execute_stored_proc(ExecuteOptions::default(), |results| results.read_to_list())?;
//! assert_eq!(users[0].name, "ann");
//! # Ok(()) }
//! # demo().unwrap();
//! ```

pub mod command;
pub mod config;
pub mod connection;
pub mod conversion;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod prelude;
pub mod results;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use command::{
    CommandKind, DbContext, Parameter, ParameterDirection, ProcedureCall, SprocContext,
    StoredProcCommand,
};
pub use config::{DEFAULT_COMMAND_TIMEOUT, ExecuteOptions, SprocOptions, SprocOptionsBuilder};
pub use connection::{AsyncConnection, BlockingConnection, DbConnection, SyncConnection};
pub use conversion::{FromRowValue, assign_field};
pub use cursor::SprocResults;
pub use error::SprocError;
pub use executor::{ROWS_AFFECTED_UNKNOWN, ResultHandler};
pub use mapping::{FieldBinding, SprocRecord, map_to_list, map_to_value};
pub use results::{BufferedReader, ColumnSchema, ResultReader, ResultSet};
pub use types::{CommandBehavior, ConnectionHandling, ConnectionState, RowValues};

// Keep the tokio-util cancellation type available to callers without a direct dependency.
pub use tokio_util::sync::CancellationToken;
