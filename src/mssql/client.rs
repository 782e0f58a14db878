use std::net::ToSocketAddrs;

use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::config::MssqlOptions;
use crate::error::SprocError;

/// Type alias for a SQL Server client over a tokio TCP stream.
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Helper function to create a new MSSQL connection
///
/// # Errors
/// Returns `SprocError::ConnectionError` if the address cannot be resolved or
/// the TCP connection fails, and the driver's error if the login fails.
pub async fn create_mssql_client(opts: &MssqlOptions) -> Result<MssqlClient, SprocError> {
    let config = opts.tiberius_config();
    let port = opts.port_or_default();

    let server_addr = (opts.server.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| SprocError::ConnectionError(format!("Failed to resolve server address: {e}")))?
        .next()
        .ok_or_else(|| {
            SprocError::ConnectionError(format!("No valid address found for {}", opts.server))
        })?;

    let tcp = TcpStream::connect(server_addr)
        .await
        .map_err(|e| SprocError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| SprocError::ConnectionError(format!("TCP configuration error: {e}")))?;

    tracing::debug!(server = %opts.server, database = %opts.database, port, "connecting to SQL Server");
    Ok(Client::connect(config, tcp.compat_write()).await?)
}
