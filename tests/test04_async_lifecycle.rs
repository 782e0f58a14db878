mod common;

use std::time::Duration;

use common::{User, active_users, scalar};
use futures_util::future::BoxFuture;
use sql_sproc::prelude::*;
use sql_sproc::test_utils::{ConnectionEvent, ScriptedConnection};

use ConnectionEvent::{Closed, CommandReleased, Executed, Opened, ReaderReleased};

fn users_with_total() -> ScriptedConnection {
    ScriptedConnection::new().with_result_sets([active_users(), scalar("Total", RowValues::Int(2))])
}

/// Reads the users, then advances and reads the total.
struct UsersAndTotal {
    users: Vec<User>,
    total: Option<i64>,
}

impl ResultHandler for UsersAndTotal {
    type Output = ();

    fn handle<'r>(&'r mut self, results: &'r mut SprocResults) -> BoxFuture<'r, Result<(), SprocError>> {
        Box::pin(async move {
            self.users = results.read_to_list()?;
            if results.next_result_async(None).await? {
                self.total = results.read_to_value()?;
            }
            Ok(())
        })
    }
}

#[tokio::test]
async fn single_handler_maps_users() {
    common::init_tracing();
    let connection = ScriptedConnection::new().with_result_set(active_users());
    let log = connection.log();
    let mut context = SprocContext::new(connection);

    let users = context
        .load_stored_proc("GetUsersByStatus")
        .with_param("status", "active")
        .unwrap()
        .execute_stored_proc_async(ExecuteOptions::default(), None, &mut |results: &mut SprocResults| {
            results.read_to_list::<User>()
        })
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[1].name, "Bob");
    assert_eq!(
        log.events(),
        vec![Opened, Executed, ReaderReleased, Closed, CommandReleased]
    );
}

#[tokio::test]
async fn awaiting_handler_walks_result_sets() {
    let mut context = SprocContext::new(users_with_total());
    let mut handler = UsersAndTotal {
        users: Vec::new(),
        total: None,
    };

    context
        .load_stored_proc("GetUsersWithTotal")
        .execute_stored_proc_async(ExecuteOptions::default(), None, &mut handler)
        .await
        .unwrap();

    assert_eq!(handler.users.len(), 2);
    assert_eq!(handler.total, Some(2));
}

#[tokio::test]
async fn handlers_share_one_cursor() {
    let connection = users_with_total();
    let log = connection.log();
    let mut context = SprocContext::new(connection);

    let mut users: Vec<User> = Vec::new();
    let mut total: Option<i64> = None;
    {
        let mut read_users = |results: &mut SprocResults| -> Result<(), SprocError> {
            users = results.read_to_list()?;
            Ok(())
        };
        let mut read_total = |results: &mut SprocResults| -> Result<(), SprocError> {
            results.next_result()?;
            total = results.read_to_value()?;
            Ok(())
        };

        context
            .load_stored_proc("GetUsersWithTotal")
            .execute_stored_proc_async_many(
                ExecuteOptions::default(),
                None,
                &mut [&mut read_users, &mut read_total],
            )
            .await
            .unwrap();
    }

    assert_eq!(users.len(), 2);
    assert_eq!(total, Some(2));
    assert_eq!(log.count(Executed), 1);
    assert_eq!(log.count(Closed), 1);
}

#[tokio::test]
async fn multi_handler_matches_single_handler() {
    let mut single = SprocContext::new(users_with_total());
    let mut combined = UsersAndTotal {
        users: Vec::new(),
        total: None,
    };
    single
        .load_stored_proc("GetUsersWithTotal")
        .execute_stored_proc_async(ExecuteOptions::default(), None, &mut combined)
        .await
        .unwrap();

    let mut many = SprocContext::new(users_with_total());
    let mut users: Vec<User> = Vec::new();
    let mut total: Option<i64> = None;
    {
        // The first handler leaves the cursor on the total set for the second.
        let mut read_users_then_advance = |results: &mut SprocResults| -> Result<(), SprocError> {
            users = results.read_to_list()?;
            results.next_result()?;
            Ok(())
        };
        let mut read_total = |results: &mut SprocResults| -> Result<(), SprocError> {
            total = results.read_to_value()?;
            Ok(())
        };
        many.load_stored_proc("GetUsersWithTotal")
            .execute_stored_proc_async_many(
                ExecuteOptions::default(),
                None,
                &mut [&mut read_users_then_advance, &mut read_total],
            )
            .await
            .unwrap();
    }

    assert_eq!(users.len(), 2);
    assert_eq!(combined.users, users);
    assert_eq!(combined.total, total);
    assert_eq!(total, Some(2));
}

#[tokio::test]
async fn failing_handler_stops_the_sequence() {
    let connection = users_with_total();
    let log = connection.log();
    let mut context = SprocContext::new(connection);
    let mut second_ran = false;

    let err = {
        let mut fail = |_results: &mut SprocResults| -> Result<(), SprocError> {
            Err(SprocError::Other("first handler failed".into()))
        };
        let mut mark = |_results: &mut SprocResults| -> Result<(), SprocError> {
            second_ran = true;
            Ok(())
        };
        context
            .load_stored_proc("GetUsersWithTotal")
            .execute_stored_proc_async_many(
                ExecuteOptions::default(),
                None,
                &mut [&mut fail, &mut mark],
            )
            .await
            .unwrap_err()
    };

    assert!(matches!(err, SprocError::Other(_)));
    assert!(!second_ran);
    assert_eq!(log.count(Closed), 1);
    assert_eq!(log.count(CommandReleased), 1);
}

#[tokio::test]
async fn cancelled_before_start_touches_nothing() {
    let connection = ScriptedConnection::new().with_result_set(active_users());
    let log = connection.log();
    let mut context = SprocContext::new(connection);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = context
        .load_stored_proc("GetUsersByStatus")
        .execute_stored_proc_async(ExecuteOptions::default(), Some(&cancel), &mut |results: &mut SprocResults| {
            results.read_to_list::<User>()
        })
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(log.events(), vec![CommandReleased]);
    assert_eq!(context.connection().state(), ConnectionState::Closed);
}

#[tokio::test]
async fn cancellation_during_execution_closes_connection() {
    let connection = ScriptedConnection::new()
        .with_result_set(active_users())
        .with_execute_delay(Duration::from_secs(30));
    let log = connection.log();
    let mut context = SprocContext::new(connection);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = context
        .load_stored_proc("SlowReport")
        .execute_stored_proc_async(ExecuteOptions::default(), Some(&cancel), &mut |results: &mut SprocResults| {
            results.read_to_list::<User>()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SprocError::Cancelled));
    assert_eq!(log.events(), vec![Opened, Closed, CommandReleased]);
}

#[tokio::test]
async fn dropped_future_still_cleans_up() {
    let connection = ScriptedConnection::new()
        .with_result_set(active_users())
        .with_execute_delay(Duration::from_secs(30));
    let log = connection.log();
    let mut context = SprocContext::new(connection);

    let mut handler = |results: &mut SprocResults| results.read_to_list::<User>();
    let call = context
        .load_stored_proc("SlowReport")
        .execute_stored_proc_async(ExecuteOptions::default(), None, &mut handler);
    let timed_out = tokio::time::timeout(Duration::from_millis(20), call).await;

    assert!(timed_out.is_err());
    assert_eq!(log.count(Opened), 1);
    assert_eq!(log.count(Closed), 1);
    assert_eq!(log.count(CommandReleased), 1);
    assert_eq!(context.connection().state(), ConnectionState::Closed);
}

#[tokio::test]
async fn empty_handler_sequence_still_executes() {
    let connection = users_with_total();
    let log = connection.log();
    let mut context = SprocContext::new(connection);

    context
        .load_stored_proc("GetUsersWithTotal")
        .execute_stored_proc_async_many(ExecuteOptions::default(), None, &mut [])
        .await
        .unwrap();

    assert_eq!(
        log.events(),
        vec![Opened, Executed, ReaderReleased, Closed, CommandReleased]
    );
}
