//! Preview Engine: count and sample the rows a DELETE would remove.

use crate::error::{Error, GenResult};
use crate::ident::TableRef;
use crate::introspect::ColumnSpec;
use crate::row::{Row, RowExt};
use crate::session::Session;
use crate::statement::{Predicate, count_sql, sample_sql};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

/// Maximum number of sample rows fetched for a preview.
pub const PREVIEW_SAMPLE_LIMIT: usize = 5;

/// Longest cell shown in a preview before it is cut.
const MAX_CELL_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub total_count: u64,
    pub sample_rows: Vec<Row>,
}

/// Count and sample the rows of `table` matching `predicate`.
///
/// Both queries are built from the same predicate the DELETE will use.
pub async fn preview<S: Session + ?Sized>(
    session: &S,
    table: &TableRef,
    columns: &[ColumnSpec],
    predicate: Option<&Predicate>,
) -> GenResult<Preview> {
    let sql = count_sql(table, predicate);
    tracing::debug!(table = %table, %sql, "counting matching rows");
    let row = session.query_one(&sql, &[]).await?;
    let count = row.try_i64("ROW_COUNT")?;
    let total_count =
        u64::try_from(count).map_err(|e| Error::decode("ROW_COUNT", e.to_string()))?;

    let sample_rows = if total_count == 0 {
        Vec::new()
    } else {
        let sql = sample_sql(table, columns, predicate, PREVIEW_SAMPLE_LIMIT);
        tracing::debug!(table = %table, %sql, "sampling matching rows");
        let mut rows = session.query(&sql, &[]).await?;
        rows.truncate(PREVIEW_SAMPLE_LIMIT);
        rows
    };

    Ok(Preview {
        total_count,
        sample_rows,
    })
}

/// Render a preview for the console.
pub fn render_preview(table: &TableRef, columns: &[ColumnSpec], preview: &Preview) -> String {
    if preview.total_count == 0 {
        return format!("No rows in {table} match the current filters.");
    }

    let mut grid = Table::new();
    grid.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns.iter().map(|c| {
            Cell::new(&c.name)
                .add_attribute(Attribute::Bold)
                .fg(Color::Cyan)
        }));

    for row in &preview.sample_rows {
        grid.add_row(columns.iter().map(|c| match row.get(&c.name) {
            Some(v) if v.is_null() => Cell::new("NULL").fg(Color::DarkGrey),
            Some(v) => Cell::new(truncate_cell(&v.display())),
            None => Cell::new(""),
        }));
    }

    let mut out = format!(
        "Found {} row(s) in {table} to be deleted. Sample:\n{grid}",
        preview.total_count
    );
    let shown = preview.sample_rows.len() as u64;
    if preview.total_count > shown {
        out.push_str(&format!("\n... and {} more rows", preview.total_count - shown));
    }
    out
}

fn truncate_cell(text: &str) -> String {
    if text.chars().count() > MAX_CELL_CHARS {
        let head: String = text.chars().take(MAX_CELL_CHARS - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::ColumnType;
    use crate::row::Value;
    use std::sync::Arc;

    #[test]
    fn long_cells_are_cut() {
        assert_eq!(truncate_cell("short"), "short");
        assert_eq!(truncate_cell("12345678901234567890"), "12345678901234567890");
        assert_eq!(
            truncate_cell("123456789012345678901"),
            "12345678901234567..."
        );
    }

    #[test]
    fn render_reports_remaining_rows() {
        let table = TableRef::parse("SYSTEM.CLIENTS").unwrap();
        let cols = vec![
            ColumnSpec::new("CLIENT_ID", ColumnType::Number).primary_key(1),
            ColumnSpec::new("NAME", ColumnType::Varchar),
        ];
        let names: Arc<[String]> = vec!["CLIENT_ID".to_string(), "NAME".to_string()].into();
        let sample_rows = (1..=5)
            .map(|i| Row::new(names.clone(), vec![Value::Number(i.to_string()), Value::Null]))
            .collect();
        let preview = Preview {
            total_count: 12,
            sample_rows,
        };

        let text = render_preview(&table, &cols, &preview);
        assert!(text.starts_with("Found 12 row(s) in SYSTEM.CLIENTS"));
        assert!(text.contains("NULL"));
        assert!(text.ends_with("... and 7 more rows"));
    }

    #[test]
    fn render_empty_preview() {
        let table = TableRef::parse("SYSTEM.CLIENTS").unwrap();
        let preview = Preview {
            total_count: 0,
            sample_rows: Vec::new(),
        };
        assert!(render_preview(&table, &[], &preview).starts_with("No rows"));
    }
}
