// SQL Server backend built on tiberius.
//
// - config: connection options and their builder
// - client: raw client creation over a tokio TCP stream
// - query: call text, parameter binding and result buffering
// - connection: the AsyncConnection implementation

pub mod client;
pub mod config;
pub mod connection;
pub mod query;

pub use client::{MssqlClient, create_mssql_client};
pub use config::{MssqlOptions, MssqlOptionsBuilder};
pub use connection::{BlockingMssqlConnection, MssqlConnection};
pub use query::{bind_query_params, build_call_text};
