//! Export and Delete pipelines.
//!
//! Both pipelines walk the table list in order, one table at a time, through
//! `Introspecting -> CollectingFilters -> [Previewing] -> Building -> Done`.
//! Finished statements are handed to a [`StatementSink`] immediately, so a
//! run aborted halfway keeps everything generated so far.

use crate::collect::{FilterSource, FilterValue, collect_filters};
use crate::error::{Error, GenResult};
use crate::ident::TableRef;
use crate::introspect::{ColumnSpec, get_columns, primary_key_of};
use crate::literal::format_input;
use crate::preview::{preview, render_preview};
use crate::prompt::{Prompter, confirm};
use crate::row::RowExt;
use crate::session::Session;
use crate::shared::SharedValueStore;
use crate::statement::{
    GeneratedStatement, StatementKind, build_delete, build_merge, build_predicate, count_sql,
    select_rows_sql,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Receives finished statements in table order.
pub trait StatementSink {
    /// Accept one statement block. Failures abort the run.
    fn accept(&mut self, statement: &GeneratedStatement) -> GenResult<()>;
}

impl StatementSink for Vec<GeneratedStatement> {
    fn accept(&mut self, statement: &GeneratedStatement) -> GenResult<()> {
        self.push(statement.clone());
        Ok(())
    }
}

impl<K: StatementSink + ?Sized> StatementSink for &mut K {
    fn accept(&mut self, statement: &GeneratedStatement) -> GenResult<()> {
        (**self).accept(statement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Skip the confirmation questions (unfiltered export, delete preview).
    ///
    /// Repeated table entries are still confirmed one by one.
    pub assume_yes: bool,
    /// Offer to add shared values before the first table.
    pub prompt_shared_values: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            assume_yes: false,
            prompt_shared_values: true,
        }
    }
}

/// Where a table is in its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStage {
    Introspecting,
    CollectingFilters,
    Previewing,
    Building,
    Done,
}

impl fmt::Display for TableStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Introspecting => "introspecting",
            Self::CollectingFilters => "collecting filters",
            Self::Previewing => "previewing",
            Self::Building => "building",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    Generated {
        statements: usize,
        matched_rows: Option<u64>,
    },
    Skipped {
        reason: String,
    },
    Failed {
        stage: TableStage,
        reason: String,
    },
}

/// Result for one occurrence in the table list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    pub table: TableRef,
    #[serde(flatten)]
    pub status: TableStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub kind: StatementKind,
    pub outcomes: Vec<TableOutcome>,
}

impl RunSummary {
    fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, table: &TableRef, status: TableStatus) {
        self.outcomes.push(TableOutcome {
            table: table.clone(),
            status,
        });
    }

    pub fn generated(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Generated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Failed { .. }))
    }

    /// Total SQL statements across all generated tables.
    pub fn total_statements(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                TableStatus::Generated { statements, .. } => statements,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&TableStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Show the configured shared values and let the operator add more.
///
/// A blank column name finishes; a blank value skips that entry.
pub fn extend_shared_values<P: Prompter + ?Sized>(
    prompter: &mut P,
    store: &mut SharedValueStore,
) -> GenResult<()> {
    if store.is_empty() {
        prompter.notice("No shared values configured.");
    } else {
        prompter.notice("Shared values from configuration:");
        for (column, value) in store.iter() {
            prompter.notice(&format!("  {column} = {value}"));
        }
    }
    prompter.notice(
        "Add shared values applied to every table with a matching primary key column (ENTER to finish).",
    );

    loop {
        let column = prompter.ask("Shared column name: ")?;
        let column = column.trim();
        if column.is_empty() {
            break;
        }
        let value = prompter.ask(&format!("Value for {}: ", column.to_ascii_uppercase()))?;
        if store.put(column, value.trim()) {
            prompter.notice(&format!(
                "  → Shared value set: {} = {}",
                column.to_ascii_uppercase(),
                value.trim()
            ));
        } else {
            prompter.notice("  → Empty value, nothing stored");
        }
    }

    tracing::debug!(entries = store.len(), "shared values ready");
    Ok(())
}

/// Generate MERGE statements for every table in `tables`.
pub async fn run_export<S, P, K>(
    session: &S,
    prompter: &mut P,
    store: &mut SharedValueStore,
    tables: &[TableRef],
    sink: &mut K,
    options: PipelineOptions,
) -> GenResult<RunSummary>
where
    S: Session + ?Sized,
    P: Prompter + ?Sized,
    K: StatementSink + ?Sized,
{
    run(
        StatementKind::Merge,
        session,
        prompter,
        store,
        tables,
        sink,
        options,
    )
    .await
}

/// Generate DELETE statements for every table in `tables`.
pub async fn run_delete<S, P, K>(
    session: &S,
    prompter: &mut P,
    store: &mut SharedValueStore,
    tables: &[TableRef],
    sink: &mut K,
    options: PipelineOptions,
) -> GenResult<RunSummary>
where
    S: Session + ?Sized,
    P: Prompter + ?Sized,
    K: StatementSink + ?Sized,
{
    run(
        StatementKind::Delete,
        session,
        prompter,
        store,
        tables,
        sink,
        options,
    )
    .await
}

/// What a single table produced, short of an error.
enum TableResult {
    Generated(GeneratedStatement),
    Declined(String),
}

async fn run<S, P, K>(
    kind: StatementKind,
    session: &S,
    prompter: &mut P,
    store: &mut SharedValueStore,
    tables: &[TableRef],
    sink: &mut K,
    options: PipelineOptions,
) -> GenResult<RunSummary>
where
    S: Session + ?Sized,
    P: Prompter + ?Sized,
    K: StatementSink + ?Sized,
{
    if options.prompt_shared_values {
        extend_shared_values(prompter, store)?;
    }

    let mut summary = RunSummary::new(kind);
    let mut seen = HashSet::new();

    for (i, table) in tables.iter().enumerate() {
        prompter.notice(&format!(
            "[{}/{}] {kind} generation for {table}",
            i + 1,
            tables.len()
        ));

        if !seen.insert(table.clone()) {
            prompter.warn(&format!("{table} appears more than once in the table list"));
            if !confirm(prompter, &format!("Process {table} again?"), Some(false))? {
                tracing::info!(table = %table, "duplicate occurrence skipped");
                summary.record(
                    table,
                    TableStatus::Skipped {
                        reason: "duplicate entry declined".to_string(),
                    },
                );
                continue;
            }
        }

        let mut stage = TableStage::Introspecting;
        let result = match kind {
            StatementKind::Merge => {
                export_table(session, prompter, store, table, options, &mut stage).await
            }
            StatementKind::Delete => {
                delete_table(session, prompter, store, table, options, &mut stage).await
            }
        };

        match result {
            Ok(TableResult::Generated(statement)) => {
                sink.accept(&statement)?;
                advance(table, &mut stage, TableStage::Done);
                tracing::info!(
                    table = %table,
                    statements = statement.statement_count,
                    "statement generated"
                );
                prompter.notice(&format!(
                    "  ✓ {} {kind} statement(s) generated for {table}",
                    statement.statement_count
                ));
                summary.record(
                    table,
                    TableStatus::Generated {
                        statements: statement.statement_count,
                        matched_rows: statement.matched_rows,
                    },
                );
            }
            Ok(TableResult::Declined(reason)) => {
                tracing::info!(table = %table, %reason, "table skipped");
                prompter.notice(&format!("  Skipped {table}: {reason}"));
                summary.record(table, TableStatus::Skipped { reason });
            }
            Err(e) if e.is_fatal() => {
                tracing::error!(table = %table, %stage, error = %e, "run aborted");
                return Err(e);
            }
            Err(e) if e.is_schema() => {
                tracing::warn!(table = %table, error = %e, "table skipped");
                prompter.warn(&format!("Skipping {table}: {e}"));
                summary.record(
                    table,
                    TableStatus::Skipped {
                        reason: e.to_string(),
                    },
                );
            }
            Err(e) => {
                tracing::warn!(table = %table, %stage, error = %e, "table failed");
                prompter.warn(&format!("Failed {table} while {stage}: {e}"));
                summary.record(
                    table,
                    TableStatus::Failed {
                        stage,
                        reason: e.to_string(),
                    },
                );
            }
        }
    }

    Ok(summary)
}

fn advance(table: &TableRef, stage: &mut TableStage, next: TableStage) {
    tracing::debug!(table = %table, from = %stage, to = %next, "stage");
    *stage = next;
}

async fn export_table<S, P>(
    session: &S,
    prompter: &mut P,
    store: &SharedValueStore,
    table: &TableRef,
    options: PipelineOptions,
    stage: &mut TableStage,
) -> GenResult<TableResult>
where
    S: Session + ?Sized,
    P: Prompter + ?Sized,
{
    let columns = get_columns(session, table).await?;
    let keys = primary_key_of(table, &columns)?;

    advance(table, stage, TableStage::CollectingFilters);
    if let Some(count) = count_shared_matches(session, table, &keys, store).await? {
        prompter.notice(&format!("  Found {count} row(s) with shared column values"));
    }
    let filters = collect_filters(table, &keys, store, prompter)?;
    let predicate = build_predicate(&filters);

    if predicate.is_none()
        && !options.assume_yes
        && !confirm(
            prompter,
            &format!("Export ALL rows from {table}?"),
            Some(false),
        )?
    {
        return Ok(TableResult::Declined(
            "unfiltered export declined".to_string(),
        ));
    }

    advance(table, stage, TableStage::Building);
    let sql = select_rows_sql(table, &columns, &keys, predicate.as_ref());
    tracing::debug!(table = %table, %sql, "fetching rows");
    let rows = session.query(&sql, &[]).await?;
    if rows.is_empty() {
        prompter.warn(&format!(
            "No rows in {table} match the filters; its export block will be empty"
        ));
    } else {
        prompter.notice(&format!("  Found {} row(s) to export", rows.len()));
    }

    let sql_text = build_merge(table, &columns, &rows)?;
    Ok(TableResult::Generated(GeneratedStatement {
        table: table.clone(),
        kind: StatementKind::Merge,
        sql_text,
        generated_at: chrono::Local::now().naive_local(),
        statement_count: rows.len(),
        matched_rows: Some(rows.len() as u64),
    }))
}

/// Rows of `table` matching the shared values alone, before the operator is
/// asked for the remaining key columns. `None` when no shared value applies.
async fn count_shared_matches<S: Session + ?Sized>(
    session: &S,
    table: &TableRef,
    keys: &[ColumnSpec],
    store: &SharedValueStore,
) -> GenResult<Option<u64>> {
    let shared: Vec<FilterValue> = keys
        .iter()
        .filter_map(|col| {
            let raw = store.lookup(&col.name)?;
            let literal = format_input(raw, &col.declared_type).ok()?;
            Some(FilterValue {
                column: col.name.clone(),
                raw_input: Some(raw.to_string()),
                resolved_literal: Some(literal),
                source: FilterSource::Shared,
            })
        })
        .collect();
    let Some(predicate) = build_predicate(&shared) else {
        return Ok(None);
    };

    let sql = count_sql(table, Some(&predicate));
    tracing::debug!(table = %table, %sql, "counting rows for shared values");
    let count = session.query_one(&sql, &[]).await?.try_i64("ROW_COUNT")?;
    let count = u64::try_from(count).map_err(|e| Error::decode("ROW_COUNT", e.to_string()))?;
    Ok(Some(count))
}

async fn delete_table<S, P>(
    session: &S,
    prompter: &mut P,
    store: &SharedValueStore,
    table: &TableRef,
    options: PipelineOptions,
    stage: &mut TableStage,
) -> GenResult<TableResult>
where
    S: Session + ?Sized,
    P: Prompter + ?Sized,
{
    let columns = get_columns(session, table).await?;
    let keys = primary_key_of(table, &columns)?;

    advance(table, stage, TableStage::CollectingFilters);
    let filters = collect_filters(table, &keys, store, prompter)?;
    let predicate = build_predicate(&filters);

    advance(table, stage, TableStage::Previewing);
    let found = preview(session, table, &columns, predicate.as_ref()).await?;
    prompter.notice(&render_preview(table, &columns, &found));

    if predicate.is_none() {
        prompter.warn(&format!(
            "UNFILTERED DELETE: the statement removes ALL rows of {table}"
        ));
    }
    if found.total_count == 0 {
        prompter.warn(&format!(
            "No rows in {table} match; the DELETE is still generated but matched 0 rows at generation time"
        ));
    }

    if !options.assume_yes
        && !confirm(
            prompter,
            &format!(
                "Generate DELETE for {} rows from {table}?",
                found.total_count
            ),
            None,
        )?
    {
        return Ok(TableResult::Declined("delete declined".to_string()));
    }

    advance(table, stage, TableStage::Building);
    let generated_at = chrono::Local::now().naive_local();
    let sql_text = build_delete(table, predicate.as_ref(), generated_at);
    Ok(TableResult::Generated(GeneratedStatement {
        table: table.clone(),
        kind: StatementKind::Delete,
        sql_text,
        generated_at,
        statement_count: 1,
        matched_rows: Some(found.total_count),
    }))
}
