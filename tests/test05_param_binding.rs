mod common;

use chrono::NaiveDateTime;
use sql_sproc::CommandKind;
use sql_sproc::prelude::*;
use sql_sproc::test_utils::{ConnectionEvent, ScriptedConnection};

fn assert_usage_error<T: std::fmt::Debug>(result: Result<T, SprocError>) {
    let err = result.unwrap_err();
    assert!(err.is_usage_error(), "expected a usage error, got {err}");
    assert!(err.to_string().contains("load_stored_proc"));
}

#[test]
fn binding_before_configuration_is_rejected_by_every_form() {
    common::init_tracing();
    let mut connection = ScriptedConnection::new();

    assert_usage_error(StoredProcCommand::new(&mut connection).with_param("status", "active"));
    assert_usage_error(
        StoredProcCommand::new(&mut connection).with_param_configured("status", "active", |p| {
            p.direction = ParameterDirection::InputOutput;
        }),
    );
    assert_usage_error(
        StoredProcCommand::new(&mut connection).with_param_config("status", |p| {
            p.value = RowValues::Text("active".into());
        }),
    );
    assert_usage_error(
        StoredProcCommand::new(&mut connection).with_parameter(Parameter::new("status", "active")),
    );
    assert_usage_error(StoredProcCommand::new(&mut connection).with_parameters(vec![
        Parameter::new("status", "active"),
        Parameter::new("limit", 10_i64),
    ]));
}

#[test]
fn configure_callbacks_do_not_run_on_unconfigured_commands() {
    let mut connection = ScriptedConnection::new();
    let mut calls = 0;

    assert_usage_error(
        StoredProcCommand::new(&mut connection).with_param_configured("status", "active", |_| calls += 1),
    );
    assert_usage_error(StoredProcCommand::new(&mut connection).with_param_config("status", |_| calls += 1));
    assert_eq!(calls, 0);
}

#[test]
fn parameter_batches_are_appended_after_single_binds() {
    let mut context = SprocContext::new(ScriptedConnection::new().with_rows_affected(Some(0)));

    context
        .load_stored_proc("Archive")
        .with_param("first", 1_i64)
        .unwrap()
        .with_parameters(vec![Parameter::new("second", 2_i64), Parameter::new("third", 3_i64)])
        .unwrap()
        .execute_stored_non_query(ConnectionHandling::Managed)
        .unwrap();

    let call = context.connection().last_call().unwrap();
    let names: Vec<&str> = call.params.iter().map(Parameter::bare_name).collect();
    assert_eq!(names, ["first", "second", "third"]);
}

#[test]
fn raw_text_commands_cannot_take_parameters() {
    let mut connection = ScriptedConnection::new();
    assert_usage_error(
        StoredProcCommand::new(&mut connection)
            .sql_text("SELECT 1")
            .with_param("x", 1_i64),
    );
}

#[test]
fn parameters_are_recorded_in_order() {
    let mut context = SprocContext::new(ScriptedConnection::new().with_rows_affected(Some(1)));

    context
        .load_stored_proc("UpdateUserStatus")
        .with_param("@id", 42_i64)
        .unwrap()
        .with_param("reason", None::<String>)
        .unwrap()
        .with_param_configured("status", "inactive", |p| {
            p.direction = ParameterDirection::InputOutput;
        })
        .unwrap()
        .with_param_config("changed", |p| {
            p.value = RowValues::Timestamp(
                NaiveDateTime::parse_from_str("2024-03-01 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            );
            p.direction = ParameterDirection::Output;
        })
        .unwrap()
        .execute_stored_non_query(ConnectionHandling::Managed)
        .unwrap();

    let call = context.connection().last_call().unwrap();
    let names: Vec<&str> = call.params.iter().map(Parameter::bare_name).collect();
    assert_eq!(names, ["id", "reason", "status", "changed"]);
    assert_eq!(call.params[0].value, RowValues::Int(42));
    assert_eq!(call.params[1].value, RowValues::Null);
    assert_eq!(call.params[2].direction, ParameterDirection::InputOutput);
    assert!(call.params[3].direction.is_output());
}

#[test]
fn default_schema_prefix_is_optional() {
    let mut context =
        SprocContext::new(ScriptedConnection::new().with_rows_affected(Some(0))).with_default_schema("app");

    context
        .load_stored_proc("Purge")
        .execute_stored_non_query(ConnectionHandling::Managed)
        .unwrap();
    assert_eq!(context.connection().last_call().unwrap().text, "app.Purge");

    let options = SprocOptions::builder()
        .prepend_default_schema(false)
        .command_timeout(std::time::Duration::from_secs(5))
        .finish();
    context
        .load_stored_proc_with("Purge", &options)
        .execute_stored_non_query(ConnectionHandling::Managed)
        .unwrap();
    let call = context.connection().last_call().unwrap();
    assert_eq!(call.text, "Purge");
    assert_eq!(call.timeout, std::time::Duration::from_secs(5));
}

#[test]
fn loaded_command_defaults() {
    let mut context = SprocContext::new(ScriptedConnection::new());
    let command = context.load_stored_proc("GetUsersByStatus");
    assert_eq!(command.call().kind, CommandKind::StoredProcedure);
    assert_eq!(command.call().timeout, sql_sproc::DEFAULT_COMMAND_TIMEOUT);
    assert!(command.call().params.is_empty());
}

#[test]
fn unexecuted_command_is_released_once() {
    let connection = ScriptedConnection::new();
    let log = connection.log();
    let mut context = SprocContext::new(connection);

    let command = context
        .load_stored_proc("GetUsersByStatus")
        .with_param("status", "active")
        .unwrap();
    drop(command);

    assert_eq!(log.events(), vec![ConnectionEvent::CommandReleased]);
}
