use serde::{Deserialize, Serialize};

use crate::types::RowValues;

/// Direction of a stored-procedure parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
}

impl ParameterDirection {
    #[must_use]
    pub fn is_output(self) -> bool {
        matches!(self, Self::Output | Self::InputOutput)
    }
}

/// A named parameter bound to a stored-procedure call.
///
/// An absent value is carried as [`RowValues::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: RowValues,
    pub direction: ParameterDirection,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<RowValues>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            direction: ParameterDirection::Input,
        }
    }

    /// Parameter with a database-null value, to be configured afterwards.
    #[must_use]
    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, RowValues::Null)
    }

    #[must_use]
    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Name without a leading `@`.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches('@')
    }
}
