//! Oracle-backed [`Session`].
//!
//! The `oracle` driver is blocking, so every call runs on tokio's blocking
//! pool against a shared connection.

use crate::config::DatabaseConfig;
use chrono::NaiveDateTime;
use oracle::sql_type::{OracleType, ToSql};
use oracle::{Connection, SqlValue};
use oragen::{Bind, Error, GenResult, Row, Session, Value};
use std::sync::Arc;

/// Error codes that mean the connection itself is gone.
const CONNECTION_LOST: &[&str] = &[
    "ORA-03113", // end-of-file on communication channel
    "ORA-03114", // not connected to ORACLE
    "ORA-03135", // connection lost contact
    "ORA-12541", // no listener
    "DPI-1010",  // not connected
    "DPI-1080",  // connection was closed
];

pub struct OracleSession {
    conn: Arc<Connection>,
}

impl OracleSession {
    pub async fn connect(db: &DatabaseConfig) -> GenResult<Self> {
        let username = db.username.clone();
        let password = db.password.clone();
        let dsn = db.dsn.clone();
        tracing::debug!(%username, %dsn, "connecting");

        let conn = tokio::task::spawn_blocking(move || {
            Connection::connect(&username, &password, &dsn)
        })
        .await
        .map_err(|e| Error::connection(format!("connect task failed: {e}")))?
        .map_err(|e| Error::connection(format!("failed to connect to {}: {e}", db.dsn)))?;

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Close the connection. Nothing is committed: the session never writes.
    pub async fn close(self) -> GenResult<()> {
        let conn = self.conn;
        tokio::task::spawn_blocking(move || conn.close())
            .await
            .map_err(|e| Error::connection(format!("close task failed: {e}")))?
            .map_err(|e| Error::connection(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Session for OracleSession {
    async fn query(&self, sql: &str, binds: &[Bind<'_>]) -> GenResult<Vec<Row>> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        let binds: Vec<(String, String)> = binds
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        tokio::task::spawn_blocking(move || run_query(&conn, &sql, &binds))
            .await
            .map_err(|e| Error::connection(format!("query task failed: {e}")))?
    }
}

fn run_query(conn: &Connection, sql: &str, binds: &[(String, String)]) -> GenResult<Vec<Row>> {
    tracing::debug!(sql = sql.trim(), binds = binds.len(), "query");

    let params: Vec<(&str, &dyn ToSql)> = binds
        .iter()
        .map(|(k, v)| (k.as_str(), v as &dyn ToSql))
        .collect();
    let result_set = conn.query_named(sql, &params).map_err(classify)?;

    let names: Arc<[String]> = result_set
        .column_info()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut rows = Vec::new();
    for row in result_set {
        let row = row.map_err(classify)?;
        let mut values = Vec::with_capacity(names.len());
        for (info, value) in row.column_info().iter().zip(row.sql_values()) {
            values.push(convert(info.name(), info.oracle_type(), value)?);
        }
        rows.push(Row::new(Arc::clone(&names), values));
    }
    Ok(rows)
}

fn convert(column: &str, ty: &OracleType, value: &SqlValue) -> GenResult<Value> {
    let decode = |e: oracle::Error| Error::decode(column, e.to_string());

    if value.is_null().map_err(decode)? {
        return Ok(Value::Null);
    }
    Ok(match ty {
        OracleType::Number(_, _)
        | OracleType::Float(_)
        | OracleType::BinaryFloat
        | OracleType::BinaryDouble => Value::Number(value.get::<String>().map_err(decode)?),
        OracleType::Date => Value::Date(value.get::<NaiveDateTime>().map_err(decode)?),
        OracleType::Timestamp(_) | OracleType::TimestampTZ(_) | OracleType::TimestampLTZ(_) => {
            Value::Timestamp(value.get::<NaiveDateTime>().map_err(decode)?)
        }
        _ => Value::Text(value.get::<String>().map_err(decode)?),
    })
}

fn classify(e: oracle::Error) -> Error {
    let message = e.to_string();
    if is_connection_lost(&message) {
        Error::connection(message)
    } else {
        Error::query(message)
    }
}

fn is_connection_lost(message: &str) -> bool {
    CONNECTION_LOST.iter().any(|code| message.contains(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_recognized() {
        assert!(is_connection_lost(
            "ORA-03113: end-of-file on communication channel"
        ));
        assert!(is_connection_lost("DPI-1010: not connected"));
        assert!(!is_connection_lost(
            "ORA-00942: table or view does not exist"
        ));
    }
}
