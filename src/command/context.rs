use super::StoredProcCommand;
use crate::config::SprocOptions;
use crate::connection::DbConnection;

/// Something that owns a connection and knows the model's default schema.
pub trait DbContext {
    type Connection: DbConnection;

    fn connection_mut(&mut self) -> &mut Self::Connection;

    /// Schema prepended to procedure names when
    /// [`SprocOptions::prepend_default_schema`] is set.
    fn default_schema(&self) -> Option<&str> {
        None
    }

    /// Build a stored-procedure command with default [`SprocOptions`].
    fn load_stored_proc(&mut self, name: &str) -> StoredProcCommand<'_, Self::Connection> {
        self.load_stored_proc_with(name, &SprocOptions::default())
    }

    /// Build a stored-procedure command.
    ///
    /// With `prepend_default_schema` set and a default schema present, the
    /// command text becomes `schema.name`.
    fn load_stored_proc_with(
        &mut self,
        name: &str,
        options: &SprocOptions,
    ) -> StoredProcCommand<'_, Self::Connection> {
        let text = match self.default_schema() {
            Some(schema) if options.prepend_default_schema => format!("{schema}.{name}"),
            _ => name.to_string(),
        };
        StoredProcCommand::new(self.connection_mut())
            .stored_procedure(text)
            .with_timeout(options.command_timeout)
    }
}

/// Plain [`DbContext`]: a connection plus an optional default schema.
#[derive(Debug)]
pub struct SprocContext<C> {
    connection: C,
    default_schema: Option<String>,
}

impl<C: DbConnection> SprocContext<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            default_schema: None,
        }
    }

    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn into_connection(self) -> C {
        self.connection
    }
}

impl<C: DbConnection> DbContext for SprocContext<C> {
    type Connection = C;

    fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }
}
