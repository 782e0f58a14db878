use async_trait::async_trait;

use super::client::{MssqlClient, create_mssql_client};
use super::config::MssqlOptions;
use super::query::{execute_call, query_result_sets, with_command_timeout};
use crate::command::ProcedureCall;
use crate::connection::{AsyncConnection, BlockingConnection, DbConnection};
use crate::error::SprocError;
use crate::results::{BufferedReader, ResultReader};
use crate::types::ConnectionState;

/// Blocking SQL Server connection for the synchronous execution paths.
pub type BlockingMssqlConnection = BlockingConnection<MssqlConnection>;

/// SQL Server connection that is opened on demand.
///
/// Open connects and logs in; close drops the client, ending the session. A
/// call that times out or whose future is dropped mid-exchange also drops the
/// client, leaving the connection closed.
pub struct MssqlConnection {
    options: MssqlOptions,
    client: ClientSlot<MssqlClient>,
}

/// Holds the client between exchanges.
///
/// The client is checked out for the length of one exchange. It only comes back
/// when the exchange ran to completion, so an interrupted TDS stream is never
/// reused.
#[derive(Debug)]
struct ClientSlot<C>(Option<C>);

impl<C> ClientSlot<C> {
    fn empty() -> Self {
        Self(None)
    }

    fn holding(client: C) -> Self {
        Self(Some(client))
    }

    fn is_open(&self) -> bool {
        self.0.is_some()
    }

    fn put(&mut self, client: C) {
        self.0 = Some(client);
    }

    fn take(&mut self) -> Option<C> {
        self.0.take()
    }

    fn check_out(&mut self) -> Result<C, SprocError> {
        self.0.take().ok_or_else(|| {
            SprocError::ConnectionError("SQL Server connection is not open".to_string())
        })
    }

    fn check_in<T>(&mut self, client: C, outcome: &Result<T, SprocError>) {
        if let Err(SprocError::Timeout(after)) = outcome {
            tracing::warn!(?after, "dropping SQL Server client after an interrupted exchange");
            return;
        }
        self.0 = Some(client);
    }
}

impl MssqlConnection {
    /// A closed connection for `options`.
    #[must_use]
    pub fn new(options: MssqlOptions) -> Self {
        Self {
            options,
            client: ClientSlot::empty(),
        }
    }

    /// Wrap an already-connected client. The connection starts open.
    #[must_use]
    pub fn from_client(options: MssqlOptions, client: MssqlClient) -> Self {
        Self {
            options,
            client: ClientSlot::holding(client),
        }
    }

    #[must_use]
    pub fn options(&self) -> &MssqlOptions {
        &self.options
    }

    /// # Errors
    ///
    /// Returns `SprocError::ConfigError` if the blocking runtime cannot be built.
    pub fn into_blocking(self) -> Result<BlockingMssqlConnection, SprocError> {
        BlockingConnection::new(self)
    }
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("server", &self.options.server)
            .field("database", &self.options.database)
            .field("state", &self.state())
            .finish()
    }
}

impl DbConnection for MssqlConnection {
    fn state(&self) -> ConnectionState {
        if self.client.is_open() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    fn close(&mut self) -> Result<(), SprocError> {
        if self.client.take().is_some() {
            tracing::debug!(server = %self.options.server, "SQL Server connection closed");
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncConnection for MssqlConnection {
    async fn open_async(&mut self) -> Result<(), SprocError> {
        if !self.client.is_open() {
            self.client.put(create_mssql_client(&self.options).await?);
        }
        Ok(())
    }

    async fn execute_reader_async(
        &mut self,
        call: &ProcedureCall,
    ) -> Result<Box<dyn ResultReader>, SprocError> {
        let mut client = self.client.check_out()?;
        let outcome = with_command_timeout(call.timeout, query_result_sets(&mut client, call)).await;
        self.client.check_in(client, &outcome);
        Ok(Box::new(BufferedReader::new(outcome?)))
    }

    async fn execute_non_query_async(
        &mut self,
        call: &ProcedureCall,
    ) -> Result<Option<u64>, SprocError> {
        let mut client = self.client.check_out()?;
        let outcome = with_command_timeout(call.timeout, execute_call(&mut client, call)).await;
        self.client.check_in(client, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn dropped_exchange_leaves_slot_empty() {
        let mut slot = ClientSlot::holding("session");

        let exchange = async {
            let client = slot.check_out()?;
            tokio::time::sleep(Duration::from_secs(30)).await;
            slot.check_in(client, &Ok(()));
            Ok::<_, SprocError>(())
        };
        assert!(tokio::time::timeout(Duration::from_millis(10), exchange).await.is_err());

        assert!(!slot.is_open());
        assert!(matches!(slot.check_out(), Err(SprocError::ConnectionError(_))));
    }

    #[test]
    fn timed_out_exchange_drops_client() {
        let mut slot = ClientSlot::holding("session");
        let client = slot.check_out().unwrap();
        slot.check_in(client, &Err::<(), _>(SprocError::Timeout(Duration::from_secs(30))));
        assert!(!slot.is_open());
    }

    #[test]
    fn completed_exchange_returns_client() {
        let mut slot = ClientSlot::holding("session");

        let client = slot.check_out().unwrap();
        assert!(!slot.is_open());
        slot.check_in(client, &Ok(3_u64));
        assert!(slot.is_open());

        let client = slot.check_out().unwrap();
        slot.check_in(client, &Err::<(), _>(SprocError::ExecutionError("deadlock victim".into())));
        assert_eq!(slot.take(), Some("session"));
    }

    #[test]
    fn new_connection_starts_closed() {
        let connection = MssqlConnection::new(MssqlOptions::new(
            "localhost".to_string(),
            "app".to_string(),
            "sa".to_string(),
            "secret".to_string(),
        ));
        assert_eq!(connection.state(), ConnectionState::Closed);
    }
}
