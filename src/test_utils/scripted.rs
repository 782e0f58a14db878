use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::command::ProcedureCall;
use crate::connection::{AsyncConnection, DbConnection, SyncConnection};
use crate::error::SprocError;
use crate::results::{BufferedReader, ColumnSchema, ResultReader, ResultSet};
use crate::types::{ConnectionState, RowValues};

/// Something that happened to a [`ScriptedConnection`] or one of its readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionEvent {
    Opened,
    Executed,
    ReaderReleased,
    Closed,
    CommandReleased,
}

/// Where a [`ScriptedConnection`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Open,
    Execute,
    Close,
}

/// Shared, ordered journal of [`ConnectionEvent`]s.
///
/// Clones share the same journal, so a test can keep one while the connection
/// is moved into a context.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ConnectionEvent>>>,
}

impl EventLog {
    fn lock(&self) -> MutexGuard<'_, Vec<ConnectionEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: ConnectionEvent) {
        tracing::trace!(?event, "scripted connection event");
        self.lock().push(event);
    }

    #[must_use]
    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.lock().clone()
    }

    #[must_use]
    pub fn count(&self, event: ConnectionEvent) -> usize {
        self.lock().iter().filter(|e| **e == event).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Connection that replays scripted result sets and records what the lifecycle
/// does to it.
///
/// Executing while closed fails with `SprocError::ConnectionError`, like a real
/// driver would.
#[derive(Debug, Default)]
pub struct ScriptedConnection {
    state: ConnectionState,
    result_sets: Vec<ResultSet>,
    rows_affected: Option<u64>,
    failures: HashSet<FailurePoint>,
    execute_delay: Option<Duration>,
    log: EventLog,
    calls: Arc<Mutex<Vec<ProcedureCall>>>,
}

impl ScriptedConnection {
    /// A closed connection with no scripted results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start in the open state, as if the caller had opened it.
    #[must_use]
    pub fn opened(mut self) -> Self {
        self.state = ConnectionState::Open;
        self
    }

    #[must_use]
    pub fn with_result_set(mut self, set: ResultSet) -> Self {
        self.result_sets.push(set);
        self
    }

    #[must_use]
    pub fn with_result_sets(mut self, sets: impl IntoIterator<Item = ResultSet>) -> Self {
        self.result_sets.extend(sets);
        self
    }

    /// Count reported by the non-query paths. `None` means "unknown".
    #[must_use]
    pub fn with_rows_affected(mut self, rows: Option<u64>) -> Self {
        self.rows_affected = rows;
        self
    }

    #[must_use]
    pub fn failing_at(mut self, point: FailurePoint) -> Self {
        self.failures.insert(point);
        self
    }

    /// Delay every execution, so cancellation can land while it is pending.
    #[must_use]
    pub fn with_execute_delay(mut self, delay: Duration) -> Self {
        self.execute_delay = Some(delay);
        self
    }

    /// Handle on the event journal.
    #[must_use]
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    /// Calls executed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ProcedureCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn last_call(&self) -> Option<ProcedureCall> {
        self.calls().pop()
    }

    fn fails_at(&self, point: FailurePoint) -> bool {
        self.failures.contains(&point)
    }

    fn open_now(&mut self) -> Result<(), SprocError> {
        if self.fails_at(FailurePoint::Open) {
            return Err(SprocError::ConnectionError("scripted open failure".to_string()));
        }
        self.state = ConnectionState::Open;
        self.log.record(ConnectionEvent::Opened);
        Ok(())
    }

    fn begin_execute(&mut self, call: &ProcedureCall) -> Result<(), SprocError> {
        if self.state() == ConnectionState::Closed {
            return Err(SprocError::ConnectionError(
                "connection must be open to execute a command".to_string(),
            ));
        }
        if self.fails_at(FailurePoint::Execute) {
            return Err(SprocError::ExecutionError(format!(
                "scripted failure executing {}",
                call.text
            )));
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());
        self.log.record(ConnectionEvent::Executed);
        Ok(())
    }

    fn reader(&self) -> Box<dyn ResultReader> {
        Box::new(TrackedReader {
            inner: BufferedReader::new(self.result_sets.clone()),
            log: self.log.clone(),
        })
    }
}

impl DbConnection for ScriptedConnection {
    fn state(&self) -> ConnectionState {
        self.state
    }

    fn close(&mut self) -> Result<(), SprocError> {
        if self.state() == ConnectionState::Closed {
            return Ok(());
        }
        if self.fails_at(FailurePoint::Close) {
            return Err(SprocError::ConnectionError("scripted close failure".to_string()));
        }
        self.state = ConnectionState::Closed;
        self.log.record(ConnectionEvent::Closed);
        Ok(())
    }

    fn release_command(&mut self, _call: &ProcedureCall) {
        self.log.record(ConnectionEvent::CommandReleased);
    }
}

impl SyncConnection for ScriptedConnection {
    fn open(&mut self) -> Result<(), SprocError> {
        self.open_now()
    }

    fn execute_reader(
        &mut self,
        call: &ProcedureCall,
    ) -> Result<Box<dyn ResultReader>, SprocError> {
        if let Some(delay) = self.execute_delay {
            std::thread::sleep(delay);
        }
        self.begin_execute(call)?;
        Ok(self.reader())
    }

    fn execute_non_query(&mut self, call: &ProcedureCall) -> Result<Option<u64>, SprocError> {
        if let Some(delay) = self.execute_delay {
            std::thread::sleep(delay);
        }
        self.begin_execute(call)?;
        Ok(self.rows_affected)
    }
}

#[async_trait]
impl AsyncConnection for ScriptedConnection {
    async fn open_async(&mut self) -> Result<(), SprocError> {
        self.open_now()
    }

    async fn execute_reader_async(
        &mut self,
        call: &ProcedureCall,
    ) -> Result<Box<dyn ResultReader>, SprocError> {
        if let Some(delay) = self.execute_delay {
            tokio::time::sleep(delay).await;
        }
        self.begin_execute(call)?;
        Ok(self.reader())
    }

    async fn execute_non_query_async(
        &mut self,
        call: &ProcedureCall,
    ) -> Result<Option<u64>, SprocError> {
        if let Some(delay) = self.execute_delay {
            tokio::time::sleep(delay).await;
        }
        self.begin_execute(call)?;
        Ok(self.rows_affected)
    }
}

/// Buffered reader that records its own release.
struct TrackedReader {
    inner: BufferedReader,
    log: EventLog,
}

#[async_trait]
impl ResultReader for TrackedReader {
    fn columns(&self) -> &[ColumnSchema] {
        self.inner.columns()
    }

    fn has_rows(&self) -> bool {
        self.inner.has_rows()
    }

    fn read(&mut self) -> Result<bool, SprocError> {
        self.inner.read()
    }

    fn value(&self, ordinal: usize) -> Result<&RowValues, SprocError> {
        self.inner.value(ordinal)
    }

    fn next_result(&mut self) -> Result<bool, SprocError> {
        self.inner.next_result()
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.log.record(ConnectionEvent::ReaderReleased);
    }
}
