//! Result sets and the forward-only reader abstraction drivers hand back.

pub mod reader;
pub mod result_set;

pub use reader::{BufferedReader, ResultReader};
pub use result_set::{ColumnSchema, ResultSet};
