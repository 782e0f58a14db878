#![allow(dead_code)]

use std::sync::Once;

use chrono::NaiveDateTime;
use sql_sproc::prelude::*;

static TRACING: Once = Once::new();

/// Route library tracing to the test harness output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    });
}

sproc_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct User {
        pub id: i64 as "Id",
        pub name: String as "Name",
        pub email: Option<String> as "Email",
        pub signup_date: Option<NaiveDateTime> as "SignupDate",
    }
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// What `GetUsersByStatus` returns for status "active".
pub fn active_users() -> ResultSet {
    ResultSet::with_column_names(["Id", "Name", "Email", "SignupDate"])
        .row(vec![
            RowValues::Int(1),
            RowValues::Text("Ann".into()),
            RowValues::Text("ann@example.com".into()),
            RowValues::Timestamp(ts("2024-01-05 09:30:00")),
        ])
        .row(vec![
            RowValues::Int(2),
            RowValues::Text("Bob".into()),
            RowValues::Null,
            RowValues::Timestamp(ts("2024-02-11 17:00:00")),
        ])
}

pub fn scalar(column: &str, value: RowValues) -> ResultSet {
    ResultSet::with_column_names([column]).row(vec![value])
}
