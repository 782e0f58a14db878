//! In-memory connection for exercising the execution lifecycle without a server.

mod scripted;

pub use scripted::{ConnectionEvent, EventLog, FailurePoint, ScriptedConnection};
