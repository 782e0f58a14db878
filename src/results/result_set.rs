use crate::types::RowValues;

/// Name and position of one column in a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub ordinal: usize,
}

impl ColumnSchema {
    #[must_use]
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }
}

/// One materialized result set: its column schema and its rows.
///
/// Columns are kept even when there are no rows, so an empty result set still
/// reports its shape.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Column schema, in ordinal order
    columns: Vec<ColumnSchema>,
    /// The rows, each holding one value per column
    rows: Vec<Vec<RowValues>>,
}

impl ResultSet {
    /// Create an empty result set with the given column schema.
    #[must_use]
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a result set from column names, numbering the ordinals in order.
    ///
    /// ```rust
    /// use sql_sproc::prelude::*;
    ///
    /// let mut set = ResultSet::with_column_names(["Id", "Name"]);
    /// set.add_row_values(vec![RowValues::Int(1), RowValues::Text("ann".into())]);
    /// assert_eq!(set.row_count(), 1);
    /// assert_eq!(set.columns()[1].ordinal, 1);
    /// ```
    #[must_use]
    pub fn with_column_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .enumerate()
                .map(|(ordinal, name)| ColumnSchema::new(name, ordinal))
                .collect(),
        )
    }

    /// Builder-style variant of [`ResultSet::add_row_values`].
    #[must_use]
    pub fn row(mut self, row_values: Vec<RowValues>) -> Self {
        self.add_row_values(row_values);
        self
    }

    /// Add a row to the result set
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        self.rows.push(row_values);
    }

    /// Get the column schema for this result set
    #[must_use]
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<RowValues>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
