#![allow(dead_code)]

//! In-memory [`Session`] for driving the pipelines without a database.
//!
//! Understands exactly the SQL shapes the engine emits: the dictionary query,
//! `SELECT COUNT(*)`, and column-list selects with an optional
//! `COL = literal AND ...` filter, `ROWNUM <= n` and `ORDER BY`.

use oragen::{
    Bind, ColumnSpec, ColumnType, Error, GenResult, Row, Session, TableRef, Value, format_value,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct FakeTable {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Value>>,
}

impl FakeTable {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        assert_eq!(values.len(), self.columns.len());
        self.rows.push(values);
        self
    }
}

#[derive(Clone, Copy)]
pub enum Failure {
    Query,
    Connection,
}

#[derive(Default)]
pub struct FakeSession {
    tables: HashMap<String, FakeTable>,
    failures: Vec<(String, Failure)>,
    queries: Mutex<Vec<String>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, name: &str, table: FakeTable) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    /// Fail every query whose text contains `needle`.
    pub fn fail_on(mut self, needle: &str, failure: Failure) -> Self {
        self.failures.push((needle.to_string(), failure));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn dictionary(&self, binds: &[Bind<'_>]) -> Vec<Row> {
        let bind = |name: &str| {
            binds
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
                .unwrap_or_default()
        };
        let key = format!("{}.{}", bind("owner"), bind("table_name"));
        let Some(table) = self.tables.get(&key) else {
            return Vec::new();
        };

        let names: Arc<[String]> = ["COLUMN_NAME", "DATA_TYPE", "NULLABLE", "COLUMN_ID", "KEY_POSITION"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let data_type = match &c.declared_type {
                    ColumnType::Number => "NUMBER".to_string(),
                    ColumnType::Varchar => "VARCHAR2".to_string(),
                    ColumnType::Date => "DATE".to_string(),
                    ColumnType::Timestamp => "TIMESTAMP(6)".to_string(),
                    ColumnType::Other(name) => name.clone(),
                };
                Row::new(
                    names.clone(),
                    vec![
                        Value::Text(c.name.clone()),
                        Value::Text(data_type),
                        Value::Text(if c.nullable { "Y" } else { "N" }.to_string()),
                        Value::Number((i + 1).to_string()),
                        c.key_position
                            .map(|p| Value::Number(p.to_string()))
                            .unwrap_or(Value::Null),
                    ],
                )
            })
            .collect()
    }

    fn select(&self, sql: &str) -> GenResult<Vec<Row>> {
        let (head, rest) = sql
            .split_once(" FROM ")
            .ok_or_else(|| Error::query(format!("unsupported SQL: {sql}")))?;
        let (table_name, tail) = rest.split_once(' ').unwrap_or((rest, ""));
        let table = self
            .tables
            .get(table_name)
            .ok_or_else(|| Error::query(format!("ORA-00942: table or view does not exist: {table_name}")))?;

        let mut filter = tail.strip_prefix("WHERE ").unwrap_or("");
        if let Some((w, _)) = filter.split_once(" ORDER BY ") {
            filter = w;
        }
        let mut limit = usize::MAX;
        if let Some((w, n)) = filter.rsplit_once("ROWNUM <= ") {
            limit = n.trim().parse().unwrap();
            filter = w.trim_end_matches(" AND ");
        }
        let filter = filter
            .strip_prefix('(')
            .and_then(|f| f.strip_suffix(')'))
            .unwrap_or(filter);

        let matching: Vec<&Vec<Value>> = table
            .rows
            .iter()
            .filter(|row| matches(table, row, filter))
            .take(limit)
            .collect();

        if head.starts_with("SELECT COUNT(*)") {
            let names: Arc<[String]> = vec!["ROW_COUNT".to_string()].into();
            return Ok(vec![Row::new(
                names,
                vec![Value::Number(matching.len().to_string())],
            )]);
        }

        let select_list = head.trim_start_matches("SELECT ");
        let names: Arc<[String]> = select_list.split(", ").map(|s| s.to_string()).collect();
        let positions: Vec<usize> = names
            .iter()
            .map(|n| table.columns.iter().position(|c| c.name == *n).unwrap())
            .collect();
        Ok(matching
            .into_iter()
            .map(|row| {
                Row::new(
                    names.clone(),
                    positions.iter().map(|&i| row[i].clone()).collect(),
                )
            })
            .collect())
    }
}

fn matches(table: &FakeTable, row: &[Value], filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    filter.split(" AND ").all(|cond| {
        let (col, literal) = cond.split_once(" = ").unwrap();
        let i = table.columns.iter().position(|c| c.name == col).unwrap();
        format_value(&row[i], &table.columns[i].declared_type) == literal
    })
}

#[async_trait::async_trait]
impl Session for FakeSession {
    async fn query(&self, sql: &str, binds: &[Bind<'_>]) -> GenResult<Vec<Row>> {
        self.queries.lock().unwrap().push(sql.to_string());

        for (needle, failure) in &self.failures {
            if sql.contains(needle.as_str()) {
                return Err(match failure {
                    Failure::Query => Error::query("ORA-00942: table or view does not exist"),
                    Failure::Connection => {
                        Error::connection("ORA-03113: end-of-file on communication channel")
                    }
                });
            }
        }

        if sql.contains("all_tab_columns") {
            return Ok(self.dictionary(binds));
        }
        self.select(sql.trim())
    }
}

pub fn table(name: &str) -> TableRef {
    TableRef::parse(name).unwrap()
}

pub fn num(n: i64) -> Value {
    Value::Number(n.to_string())
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// `SYSTEM.CLIENTS (CLIENT_ID NUMBER PK, NAME VARCHAR2)` with three rows.
pub fn clients() -> FakeTable {
    FakeTable::new(vec![
        ColumnSpec::new("CLIENT_ID", ColumnType::Number).primary_key(1),
        ColumnSpec::new("NAME", ColumnType::Varchar),
    ])
    .row(vec![num(12345), text("Acme")])
    .row(vec![num(2), text("O'Hara")])
    .row(vec![num(3), Value::Null])
}

/// `SYSTEM.ORDERS (REGION VARCHAR2 PK1, ORDER_NO NUMBER PK2, AMOUNT NUMBER)`.
pub fn orders() -> FakeTable {
    FakeTable::new(vec![
        ColumnSpec::new("ORDER_NO", ColumnType::Number).primary_key(2),
        ColumnSpec::new("REGION", ColumnType::Varchar).primary_key(1),
        ColumnSpec::new("AMOUNT", ColumnType::Number),
    ])
    .row(vec![num(1), text("EU"), num(10)])
    .row(vec![num(2), text("EU"), num(20)])
    .row(vec![num(1), text("US"), num(30)])
}

/// A table without a primary key.
pub fn audit_log() -> FakeTable {
    FakeTable::new(vec![
        ColumnSpec::new("LOGGED_AT", ColumnType::Date),
        ColumnSpec::new("MESSAGE", ColumnType::Varchar),
    ])
}
