//! Value Collector: resolves a filter (or "no filter") for each key column.

use crate::error::GenResult;
use crate::ident::TableRef;
use crate::introspect::ColumnSpec;
use crate::literal::format_input;
use crate::prompt::Prompter;
use crate::shared::SharedValueStore;
use serde::Serialize;

/// Where a filter value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSource {
    Shared,
    Operator,
}

/// The resolved filter for one primary-key column.
///
/// `resolved_literal == None` means the column is not filtered (all values
/// match).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterValue {
    pub column: String,
    pub raw_input: Option<String>,
    pub resolved_literal: Option<String>,
    pub source: FilterSource,
}

impl FilterValue {
    /// A column left unfiltered by the operator.
    pub fn skipped(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            raw_input: None,
            resolved_literal: None,
            source: FilterSource::Operator,
        }
    }

    pub fn is_active(&self) -> bool {
        self.resolved_literal.is_some()
    }
}

/// Resolve a filter for every column in `columns`, in order.
///
/// Shared values are applied without prompting. Other columns are prompted
/// for; a blank answer leaves the column unfiltered and input that does not
/// coerce to the column type is asked again.
pub fn collect_filters<P: Prompter + ?Sized>(
    table: &TableRef,
    columns: &[ColumnSpec],
    store: &SharedValueStore,
    prompter: &mut P,
) -> GenResult<Vec<FilterValue>> {
    debug_assert!(columns.iter().all(|c| c.is_primary_key));

    prompter.notice(&format!("Primary key columns for {table}:"));
    for (i, col) in columns.iter().enumerate() {
        prompter.notice(&format!("  {}. {} ({})", i + 1, col.name, col.declared_type));
    }

    let mut filters = Vec::with_capacity(columns.len());
    let mut announced = false;

    for col in columns {
        if let Some(shared) = store.lookup(&col.name) {
            match format_input(shared, &col.declared_type) {
                Ok(literal) => {
                    prompter.notice(&format!("  → Using shared value for {}: {shared}", col.name));
                    tracing::debug!(table = %table, column = %col.name, %literal, "shared value applied");
                    filters.push(FilterValue {
                        column: col.name.clone(),
                        raw_input: Some(shared.to_string()),
                        resolved_literal: Some(literal),
                        source: FilterSource::Shared,
                    });
                    continue;
                }
                Err(e) => {
                    prompter.warn(&format!(
                        "Invalid shared value for {} ({}): {e} - will prompt for input",
                        col.name, col.declared_type
                    ));
                }
            }
        }

        if !announced {
            prompter.notice("Press ENTER to skip a primary key column (targets ALL values for that column).");
            prompter.notice("Date format: YYYY-MM-DD (e.g., 2024-12-25)");
            announced = true;
        }
        filters.push(prompt_column(col, prompter)?);
    }

    show_summary(table, &filters, prompter);
    Ok(filters)
}

fn prompt_column<P: Prompter + ?Sized>(col: &ColumnSpec, prompter: &mut P) -> GenResult<FilterValue> {
    let label = if col.declared_type.is_temporal() {
        format!(
            "Enter value for primary key column {} ({}) [YYYY-MM-DD or ENTER to skip]: ",
            col.name, col.declared_type
        )
    } else {
        format!(
            "Enter value for primary key column {} ({}) [ENTER to skip]: ",
            col.name, col.declared_type
        )
    };

    loop {
        let raw = prompter.ask(&label)?;
        if raw.trim().is_empty() {
            prompter.notice(&format!(
                "  → Skipping {} - will target ALL values for this column",
                col.name
            ));
            return Ok(FilterValue::skipped(col.name.clone()));
        }

        match format_input(&raw, &col.declared_type) {
            Ok(literal) => {
                prompter.notice(&format!("  → Will filter {} = {literal}", col.name));
                return Ok(FilterValue {
                    column: col.name.clone(),
                    raw_input: Some(raw),
                    resolved_literal: Some(literal),
                    source: FilterSource::Operator,
                });
            }
            Err(e) => {
                tracing::debug!(column = %col.name, error = %e, "coercion failed, re-prompting");
                prompter.notice(&format!(
                    "Invalid input for {}: {e}. Please try again.",
                    col.declared_type
                ));
            }
        }
    }
}

fn show_summary<P: Prompter + ?Sized>(table: &TableRef, filters: &[FilterValue], prompter: &mut P) {
    let active: Vec<&FilterValue> = filters.iter().filter(|f| f.is_active()).collect();
    prompter.notice(&format!("Filter summary for {table}:"));
    if active.is_empty() {
        prompter.warn(&format!(
            "NO FILTERS SPECIFIED - the statement will target ALL rows of {table}"
        ));
        return;
    }
    prompter.notice(&format!(
        "  • Will filter on {} primary key column(s)",
        active.len()
    ));
    prompter.notice(&format!(
        "  • Will target ALL values for {} primary key column(s)",
        filters.len() - active.len()
    ));
    for f in active {
        let origin = match f.source {
            FilterSource::Shared => " (shared)",
            FilterSource::Operator => "",
        };
        prompter.notice(&format!(
            "    - {} = {}{origin}",
            f.column,
            f.resolved_literal.as_deref().unwrap_or_default()
        ));
    }
}
