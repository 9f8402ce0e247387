//! Database session trait.
//!
//! The engine only ever reads: dictionary lookups, `COUNT(*)` and row
//! fetches. Connecting, disconnecting and transaction control belong to
//! whoever owns the session.

use crate::error::{Error, GenResult};
use crate::row::Row;

/// A named bind parameter (`:name` in the SQL text).
pub type Bind<'a> = (&'a str, &'a str);

/// A trait for types that can run read-only Oracle queries.
///
/// Implementations must map transport failures to [`Error::Connection`] and
/// statement failures to [`Error::Query`]; the pipelines use that split to
/// decide between aborting the run and skipping one table.
#[async_trait::async_trait]
pub trait Session: Sync {
    /// Execute a query and return all rows.
    async fn query(&self, sql: &str, binds: &[Bind<'_>]) -> GenResult<Vec<Row>>;

    /// Execute a query and return exactly one row.
    async fn query_one(&self, sql: &str, binds: &[Bind<'_>]) -> GenResult<Row> {
        let mut rows = self.query(sql, binds).await?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(Error::query(format!("query returned no rows: {sql}"))),
            n => Err(Error::query(format!(
                "query returned {n} rows, expected 1: {sql}"
            ))),
        }
    }
}
