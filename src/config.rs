//! Options for loading stored procedures and for executing them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{CommandBehavior, ConnectionHandling};

/// Command timeout applied when none is configured.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Options used when a context builds a stored-procedure command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SprocOptions {
    /// Prefix the procedure name with the context's default schema, if it has one.
    pub prepend_default_schema: bool,
    /// Timeout the driver applies around execution. Zero disables it.
    pub command_timeout: Duration,
}

impl Default for SprocOptions {
    fn default() -> Self {
        Self {
            prepend_default_schema: true,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl SprocOptions {
    #[must_use]
    pub fn builder() -> SprocOptionsBuilder {
        SprocOptionsBuilder::default()
    }

    #[must_use]
    pub fn with_prepend_default_schema(mut self, prepend: bool) -> Self {
        self.prepend_default_schema = prepend;
        self
    }

    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Fluent builder for [`SprocOptions`].
#[derive(Debug, Clone, Default)]
pub struct SprocOptionsBuilder {
    opts: SprocOptions,
}

impl SprocOptionsBuilder {
    #[must_use]
    pub fn prepend_default_schema(mut self, prepend: bool) -> Self {
        self.opts.prepend_default_schema = prepend;
        self
    }

    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.opts.command_timeout = timeout;
        self
    }

    #[must_use]
    pub fn finish(self) -> SprocOptions {
        self.opts
    }
}

/// Per-execution options for the reader paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteOptions {
    pub behavior: CommandBehavior,
    pub connection: ConnectionHandling,
}

impl ExecuteOptions {
    #[must_use]
    pub fn with_behavior(mut self, behavior: CommandBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionHandling) -> Self {
        self.connection = connection;
        self
    }
}
