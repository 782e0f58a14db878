//! Building stored-procedure commands and binding their parameters.

mod context;
mod params;

pub use context::{DbContext, SprocContext};
pub use params::{Parameter, ParameterDirection};

use std::time::Duration;

use crate::config::DEFAULT_COMMAND_TIMEOUT;
use crate::connection::DbConnection;
use crate::error::SprocError;
use crate::types::RowValues;

/// How the driver should interpret [`ProcedureCall::text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Raw SQL text, sent verbatim.
    #[default]
    Text,
    /// A stored-procedure name, possibly schema-qualified.
    StoredProcedure,
}

/// The driver-facing description of one call: text, kind, parameters, timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCall {
    pub text: String,
    pub kind: CommandKind,
    pub params: Vec<Parameter>,
    pub timeout: Duration,
}

impl Default for ProcedureCall {
    fn default() -> Self {
        Self {
            text: String::new(),
            kind: CommandKind::Text,
            params: Vec::new(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl ProcedureCall {
    /// True once the call names a stored procedure.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.kind == CommandKind::StoredProcedure && !self.text.is_empty()
    }
}

/// A configured call bound to the connection it will run on.
///
/// Consumed by the `execute_*` methods. Dropping it, executed or not, releases
/// the command on its connection exactly once.
pub struct StoredProcCommand<'c, C: DbConnection + ?Sized> {
    pub(crate) connection: &'c mut C,
    pub(crate) call: ProcedureCall,
}

impl<'c, C: DbConnection + ?Sized> StoredProcCommand<'c, C> {
    /// An unconfigured command. Parameters cannot be bound until it is given a
    /// procedure name with [`stored_procedure`](Self::stored_procedure).
    pub fn new(connection: &'c mut C) -> Self {
        Self {
            connection,
            call: ProcedureCall::default(),
        }
    }

    /// Configure the command as a call to `name`.
    #[must_use]
    pub fn stored_procedure(mut self, name: impl Into<String>) -> Self {
        self.call.text = name.into();
        self.call.kind = CommandKind::StoredProcedure;
        self
    }

    /// Replace the command with raw SQL text.
    #[must_use]
    pub fn sql_text(mut self, text: impl Into<String>) -> Self {
        self.call.text = text.into();
        self.call.kind = CommandKind::Text;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call.timeout = timeout;
        self
    }

    #[must_use]
    pub fn call(&self) -> &ProcedureCall {
        &self.call
    }

    /// Bind `value` to `name`. `None` binds database-null.
    ///
    /// ```rust
    /// use sql_sproc::prelude::*;
    /// use sql_sproc::test_utils::ScriptedConnection;
    ///
    /// # fn demo() -> Result<(), SprocError> {
    /// let mut context = SprocContext::new(ScriptedConnection::new());
    /// let command = context
    ///     .load_stored_proc("GetUsersByStatus")
    ///     .with_param("status", "active")?
    ///     .with_param("since", None::<chrono::NaiveDateTime>)?;
    /// assert_eq!(command.call().params.len(), 2);
    /// # Ok(()) }
    /// # demo().unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `SprocError::InvalidOperation` if the command is not yet a
    /// stored-procedure call.
    pub fn with_param(
        self,
        name: impl Into<String>,
        value: impl Into<RowValues>,
    ) -> Result<Self, SprocError> {
        self.with_parameter(Parameter::new(name, value))
    }

    /// Bind `value` to `name`, then let `configure` adjust the parameter.
    ///
    /// # Errors
    ///
    /// Returns `SprocError::InvalidOperation` if the command is not yet a
    /// stored-procedure call.
    pub fn with_param_configured<F>(
        mut self,
        name: impl Into<String>,
        value: impl Into<RowValues>,
        configure: F,
    ) -> Result<Self, SprocError>
    where
        F: FnOnce(&mut Parameter),
    {
        self.ensure_stored_procedure()?;
        let mut param = Parameter::new(name, value);
        configure(&mut param);
        self.call.params.push(param);
        Ok(self)
    }

    /// Add a parameter named `name` whose value and direction are set entirely
    /// by `configure` (the value starts as database-null).
    ///
    /// # Errors
    ///
    /// Returns `SprocError::InvalidOperation` if the command is not yet a
    /// stored-procedure call.
    pub fn with_param_config<F>(
        mut self,
        name: impl Into<String>,
        configure: F,
    ) -> Result<Self, SprocError>
    where
        F: FnOnce(&mut Parameter),
    {
        self.ensure_stored_procedure()?;
        let mut param = Parameter::null(name);
        configure(&mut param);
        self.call.params.push(param);
        Ok(self)
    }

    /// Add a prebuilt parameter.
    ///
    /// # Errors
    ///
    /// Returns `SprocError::InvalidOperation` if the command is not yet a
    /// stored-procedure call.
    pub fn with_parameter(mut self, param: Parameter) -> Result<Self, SprocError> {
        self.ensure_stored_procedure()?;
        self.call.params.push(param);
        Ok(self)
    }

    /// Add several prebuilt parameters.
    ///
    /// # Errors
    ///
    /// Returns `SprocError::InvalidOperation` if the command is not yet a
    /// stored-procedure call.
    pub fn with_parameters<I>(mut self, params: I) -> Result<Self, SprocError>
    where
        I: IntoIterator<Item = Parameter>,
    {
        self.ensure_stored_procedure()?;
        self.call.params.extend(params);
        Ok(self)
    }

    fn ensure_stored_procedure(&self) -> Result<(), SprocError> {
        if self.call.is_configured() {
            Ok(())
        } else {
            Err(SprocError::InvalidOperation(
                "Call load_stored_proc before binding parameters".to_string(),
            ))
        }
    }
}

impl<C: DbConnection + ?Sized> Drop for StoredProcCommand<'_, C> {
    fn drop(&mut self) {
        tracing::trace!(procedure = %self.call.text, "releasing command");
        self.connection.release_command(&self.call);
    }
}

impl<C: DbConnection + ?Sized> std::fmt::Debug for StoredProcCommand<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredProcCommand")
            .field("call", &self.call)
            .finish_non_exhaustive()
    }
}
