//! Statement Builder.
//!
//! Every query the engine runs against a table (count, sample, row fetch)
//! and every statement it writes (DELETE, MERGE) takes its filter from the
//! same [`Predicate`] value, so what the operator previews is exactly what
//! the generated statement will match.

use crate::collect::FilterValue;
use crate::error::{Error, GenResult};
use crate::ident::{TableRef, column_sql};
use crate::introspect::{ColumnSpec, primary_key_of};
use crate::literal::format_value;
use crate::row::Row;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// A rendered WHERE condition (without the `WHERE` keyword).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Predicate(String);

impl Predicate {
    pub fn as_sql(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Merge,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => f.write_str("MERGE"),
            Self::Delete => f.write_str("DELETE"),
        }
    }
}

/// A finished statement block for one table occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedStatement {
    pub table: TableRef,
    pub kind: StatementKind,
    pub sql_text: String,
    pub generated_at: NaiveDateTime,
    /// Number of SQL statements in `sql_text` (one per row for MERGE).
    pub statement_count: usize,
    /// Rows the filter matched when the statement was generated.
    pub matched_rows: Option<u64>,
}

/// Join the active filters into a predicate, in filter order.
///
/// Returns `None` when no filter is active: the statement then has no WHERE
/// clause and targets the whole table.
pub fn build_predicate(filters: &[FilterValue]) -> Option<Predicate> {
    let conditions: Vec<String> = filters
        .iter()
        .filter_map(|f| {
            f.resolved_literal
                .as_deref()
                .map(|lit| format!("{} = {lit}", column_sql(&f.column)))
        })
        .collect();
    if conditions.is_empty() {
        None
    } else {
        Some(Predicate(conditions.join(" AND ")))
    }
}

fn where_clause(predicate: Option<&Predicate>) -> String {
    match predicate {
        Some(p) => format!(" WHERE {p}"),
        None => String::new(),
    }
}

fn column_list(columns: &[ColumnSpec]) -> String {
    columns
        .iter()
        .map(|c| column_sql(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `SELECT COUNT(*)` over the rows `predicate` matches.
pub fn count_sql(table: &TableRef, predicate: Option<&Predicate>) -> String {
    format!(
        "SELECT COUNT(*) AS ROW_COUNT FROM {}{}",
        table.to_sql(),
        where_clause(predicate)
    )
}

/// First `limit` matching rows, for previews.
pub fn sample_sql(
    table: &TableRef,
    columns: &[ColumnSpec],
    predicate: Option<&Predicate>,
    limit: usize,
) -> String {
    let filter = match predicate {
        Some(p) => format!("({p}) AND ROWNUM <= {limit}"),
        None => format!("ROWNUM <= {limit}"),
    };
    format!(
        "SELECT {} FROM {} WHERE {filter}",
        column_list(columns),
        table.to_sql()
    )
}

/// All matching rows, ordered by primary key.
pub fn select_rows_sql(
    table: &TableRef,
    columns: &[ColumnSpec],
    key_columns: &[ColumnSpec],
    predicate: Option<&Predicate>,
) -> String {
    let mut sql = format!(
        "SELECT {} FROM {}{}",
        column_list(columns),
        table.to_sql(),
        where_clause(predicate)
    );
    if !key_columns.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&column_list(key_columns));
    }
    sql
}

/// The bare DELETE statement.
pub fn delete_sql(table: &TableRef, predicate: Option<&Predicate>) -> String {
    format!("DELETE FROM {}{};", table.to_sql(), where_clause(predicate))
}

/// DELETE statement with its comment header. Never followed by a COMMIT.
pub fn build_delete(
    table: &TableRef,
    predicate: Option<&Predicate>,
    generated_at: NaiveDateTime,
) -> String {
    let mut out = format!(
        "-- DELETE statement for {table}\n-- Generated on {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    if predicate.is_none() {
        out.push_str("-- WARNING: no filter, this deletes ALL rows of the table\n");
    }
    out.push_str(&delete_sql(table, predicate));
    out
}

/// One MERGE statement per row, keyed on the primary-key columns.
///
/// `columns` is the full column list in table order; each row must carry a
/// value for every column.
pub fn build_merge(table: &TableRef, columns: &[ColumnSpec], rows: &[Row]) -> GenResult<String> {
    let keys = primary_key_of(table, columns)?;

    let on_clause = keys
        .iter()
        .map(|c| {
            let name = column_sql(&c.name);
            format!("target.{name} = source.{name}")
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    let update_clause = columns
        .iter()
        .filter(|c| !c.is_primary_key)
        .map(|c| {
            let name = column_sql(&c.name);
            format!("target.{name} = source.{name}")
        })
        .collect::<Vec<_>>()
        .join(", ");

    let names: Vec<String> = columns.iter().map(|c| column_sql(&c.name)).collect();
    let insert_values = names
        .iter()
        .map(|n| format!("source.{n}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut statements = Vec::with_capacity(rows.len());
    for row in rows {
        let mut select_list = Vec::with_capacity(columns.len());
        for (col, name) in columns.iter().zip(&names) {
            let value = row
                .get(&col.name)
                .ok_or_else(|| Error::decode(&col.name, "column missing from fetched row"))?;
            select_list.push(format!("{} AS {name}", format_value(value, &col.declared_type)));
        }

        let mut stmt = format!("MERGE INTO {} target\n", table.to_sql());
        stmt.push_str(&format!(
            "USING (SELECT {} FROM dual) source\n",
            select_list.join(", ")
        ));
        stmt.push_str(&format!("ON ({on_clause})\n"));
        if !update_clause.is_empty() {
            stmt.push_str(&format!("WHEN MATCHED THEN UPDATE SET {update_clause}\n"));
        }
        stmt.push_str(&format!(
            "WHEN NOT MATCHED THEN INSERT ({}) VALUES ({insert_values});",
            names.join(", ")
        ));
        statements.push(stmt);
    }

    Ok(statements.join("\n\n"))
}
