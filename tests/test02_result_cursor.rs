mod common;

use common::{User, active_users, scalar};
use sql_sproc::prelude::*;
use sql_sproc::BufferedReader;

fn users_then_total() -> SprocResults {
    SprocResults::new(Box::new(BufferedReader::new(vec![
        active_users(),
        scalar("Total", RowValues::Int(2)),
    ])))
}

#[test]
fn reads_each_result_set_in_turn() {
    common::init_tracing();
    let mut results = users_then_total();

    let users: Vec<User> = results.read_to_list().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(results.result_index(), 0);

    assert!(results.next_result().unwrap());
    assert_eq!(results.result_index(), 1);
    assert_eq!(results.columns()[0].name, "Total");
    assert_eq!(results.read_to_value::<i64>().unwrap(), Some(2));

    assert!(!results.next_result().unwrap());
}

#[test]
fn reading_past_the_last_set_yields_nothing() {
    let mut results = users_then_total();
    assert!(results.next_result().unwrap());
    assert!(!results.next_result().unwrap());
    assert!(results.read_to_list::<User>().unwrap().is_empty());
    assert_eq!(results.read_to_value::<i64>().unwrap(), None);
}

#[test]
fn skipping_a_set_discards_its_rows() {
    let mut results = users_then_total();
    assert!(results.next_result().unwrap());

    // Only the Total row is left; none of its columns belong to User.
    let users: Vec<User> = results.read_to_list().unwrap();
    assert_eq!(users, vec![User::default()]);

    assert!(!results.next_result().unwrap());
    assert!(results.read_to_list::<User>().unwrap().is_empty());
}

#[test]
fn single_row_behavior_limits_mapping() {
    let mut results = SprocResults::with_behavior(
        Box::new(BufferedReader::new(vec![active_users()])),
        CommandBehavior::SingleRow,
    );
    let users: Vec<User> = results.read_to_list().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Ann");
}

#[tokio::test]
async fn async_advance_matches_sync_advance() {
    let mut results = users_then_total();
    assert!(results.next_result_async(None).await.unwrap());
    assert_eq!(results.read_to_value::<i64>().unwrap(), Some(2));
    assert!(!results.next_result_async(None).await.unwrap());
}

#[tokio::test]
async fn async_advance_is_cancellable() {
    let mut results = users_then_total();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = results.next_result_async(Some(&cancel)).await.unwrap_err();
    assert!(matches!(err, SprocError::Cancelled));
    let users: Vec<User> = results.read_to_list().unwrap();
    assert_eq!(users.len(), 2);
}
