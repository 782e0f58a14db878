use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::TryStreamExt;
use tiberius::{Column, ColumnData, FromSql, Query, QueryItem, Row};

use super::client::MssqlClient;
use crate::command::{CommandKind, ProcedureCall};
use crate::error::SprocError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// SQL text sent for `call`.
///
/// Stored procedures become `EXEC name @a = @P1, @b = @P2 OUTPUT`, binding
/// parameters by name; plain text is sent verbatim.
#[must_use]
pub fn build_call_text(call: &ProcedureCall) -> String {
    match call.kind {
        CommandKind::Text => call.text.clone(),
        CommandKind::StoredProcedure => {
            let mut sql = format!("EXEC {}", call.text);
            for (i, param) in call.params.iter().enumerate() {
                sql.push_str(if i == 0 { " " } else { ", " });
                sql.push_str(&format!("@{} = @P{}", param.bare_name(), i + 1));
                if param.direction.is_output() {
                    sql.push_str(" OUTPUT");
                }
            }
            sql
        }
    }
}

/// Bind parameters directly to the query for SQL Server
/// Return a query builder with parameters already bound
pub fn bind_query_params<'a>(sql: &'a str, params: &[RowValues]) -> Query<'a> {
    let mut query = Query::new(sql);

    for param in params {
        match param {
            RowValues::Int(i) => query.bind(*i),
            RowValues::Float(f) => query.bind(*f),
            RowValues::Text(s) => query.bind(s.clone()),
            RowValues::Bool(b) => query.bind(*b),
            RowValues::Timestamp(dt) => query.bind(*dt),
            RowValues::Null => query.bind(Option::<String>::None),
            RowValues::JSON(jsval) => query.bind(jsval.to_string()),
            RowValues::Blob(bytes) => query.bind(bytes.clone()),
        }
    }

    query
}

/// Execute `call` and buffer every result set it produces.
///
/// Column metadata opens a new result set, so sets without rows keep their
/// schema.
pub(crate) async fn query_result_sets(
    client: &mut MssqlClient,
    call: &ProcedureCall,
) -> Result<Vec<ResultSet>, SprocError> {
    let sql = build_call_text(call);
    let values: Vec<RowValues> = call.params.iter().map(|p| p.value.clone()).collect();
    tracing::trace!(sql = %sql, "sending SQL Server query");

    let mut stream = bind_query_params(&sql, &values).query(client).await?;
    let mut sets: Vec<ResultSet> = Vec::new();

    while let Some(item) = stream.try_next().await? {
        match item {
            QueryItem::Metadata(meta) => {
                sets.push(ResultSet::with_column_names(
                    meta.columns().iter().map(tiberius::Column::name),
                ));
            }
            QueryItem::Row(row) => {
                let set = sets.last_mut().ok_or_else(|| {
                    SprocError::ExecutionError(
                        "SQL Server sent a row before its column metadata".to_string(),
                    )
                })?;
                set.add_row_values(row_values(&row)?);
            }
        }
    }

    Ok(sets)
}

/// Execute `call` expecting no result set. `None` when the server reports no
/// counts at all.
pub(crate) async fn execute_call(
    client: &mut MssqlClient,
    call: &ProcedureCall,
) -> Result<Option<u64>, SprocError> {
    let sql = build_call_text(call);
    let values: Vec<RowValues> = call.params.iter().map(|p| p.value.clone()).collect();
    tracing::trace!(sql = %sql, "sending SQL Server command");

    let result = bind_query_params(&sql, &values).execute(client).await?;
    let counts = result.rows_affected();
    if counts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(counts.iter().sum()))
    }
}

/// Run `operation` under the command timeout. A zero timeout waits forever.
pub(crate) async fn with_command_timeout<T, F>(
    timeout: Duration,
    operation: F,
) -> Result<T, SprocError>
where
    F: std::future::Future<Output = Result<T, SprocError>>,
{
    if timeout.is_zero() {
        return operation.await;
    }
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| SprocError::Timeout(timeout))?
}

fn row_values(row: &Row) -> Result<Vec<RowValues>, SprocError> {
    row.cells()
        .map(|(column, data)| extract_value(column, data))
        .collect()
}

/// Convert one cell.
///
/// DECIMAL, NUMERIC and MONEY become `Float`. UNIQUEIDENTIFIER, TIME and XML
/// become `Text`. DATE is read as midnight and DATETIMEOFFSET as its UTC instant.
fn extract_value(column: &Column, data: &ColumnData<'static>) -> Result<RowValues, SprocError> {
    let value = match data {
        ColumnData::U8(v) => v.map(|n| RowValues::Int(i64::from(n))),
        ColumnData::I16(v) => v.map(|n| RowValues::Int(i64::from(n))),
        ColumnData::I32(v) => v.map(|n| RowValues::Int(i64::from(n))),
        ColumnData::I64(v) => v.map(RowValues::Int),
        ColumnData::F32(v) => v.map(|n| RowValues::Float(f64::from(n))),
        ColumnData::F64(v) => v.map(RowValues::Float),
        ColumnData::Bit(v) => v.map(RowValues::Bool),
        ColumnData::Numeric(v) => v.map(|n| RowValues::Float(f64::from(n))),
        ColumnData::String(v) => v.as_ref().map(|s| RowValues::Text(s.to_string())),
        ColumnData::Guid(v) => v.map(|g| RowValues::Text(g.to_string())),
        ColumnData::Xml(v) => v.as_ref().map(|x| RowValues::Text(x.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|b| RowValues::Blob(b.to_vec())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal::<NaiveDateTime>(column, data)?.map(RowValues::Timestamp)
        }
        ColumnData::Date(_) => temporal::<NaiveDate>(column, data)?
            .map(|d| RowValues::Timestamp(d.and_time(NaiveTime::MIN))),
        ColumnData::Time(_) => {
            temporal::<NaiveTime>(column, data)?.map(|t| RowValues::Text(t.to_string()))
        }
        ColumnData::DateTimeOffset(_) => temporal::<DateTime<FixedOffset>>(column, data)?
            .map(|dt| RowValues::Timestamp(dt.naive_utc())),
    };
    Ok(value.unwrap_or(RowValues::Null))
}

fn temporal<'a, T: FromSql<'a>>(
    column: &Column,
    data: &'a ColumnData<'static>,
) -> Result<Option<T>, SprocError> {
    T::from_sql(data).map_err(|e| {
        SprocError::ConversionError(format!(
            "Cannot read column '{}' ({:?}): {e}",
            column.name(),
            column.column_type()
        ))
    })
}
