use crate::error::{GenResult, SchemaError};
use crate::ident::TableRef;
use crate::row::RowExt;
use crate::session::Session;
use serde::Serialize;
use std::fmt;

/// Declared column type, reduced to what literal formatting cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Number,
    Varchar,
    Date,
    Timestamp,
    /// Anything else; formatted like VARCHAR.
    Other(String),
}

impl ColumnType {
    /// Map an `ALL_TAB_COLUMNS.DATA_TYPE` value.
    pub fn from_data_type(data_type: &str) -> Self {
        let upper = data_type.trim().to_ascii_uppercase();
        match upper.as_str() {
            "NUMBER" | "FLOAT" | "INTEGER" | "BINARY_FLOAT" | "BINARY_DOUBLE" => Self::Number,
            "VARCHAR2" | "VARCHAR" | "NVARCHAR2" | "CHAR" | "NCHAR" | "CLOB" | "NCLOB"
            | "LONG" => Self::Varchar,
            "DATE" => Self::Date,
            _ if upper.starts_with("TIMESTAMP") => Self::Timestamp,
            _ => Self::Other(upper),
        }
    }

    /// Whether operator input for this type must be a `YYYY-MM-DD` date.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => f.write_str("NUMBER"),
            Self::Varchar => f.write_str("VARCHAR"),
            Self::Date => f.write_str("DATE"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub declared_type: ColumnType,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// `ALL_CONS_COLUMNS.POSITION` for key columns.
    pub key_position: Option<u32>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, declared_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            nullable: true,
            is_primary_key: false,
            key_position: None,
        }
    }

    /// Mark the column as the `position`-th primary-key column (1-based).
    pub fn primary_key(mut self, position: u32) -> Self {
        self.is_primary_key = true;
        self.key_position = Some(position);
        self.nullable = false;
        self
    }
}

const COLUMNS_SQL: &str = r#"
SELECT
  c.column_name AS column_name,
  c.data_type AS data_type,
  c.nullable AS nullable,
  c.column_id AS column_id,
  pk.position AS key_position
FROM all_tab_columns c
LEFT JOIN (
  SELECT cc.column_name, cc.position
  FROM all_constraints con
  JOIN all_cons_columns cc
    ON cc.owner = con.owner
   AND cc.constraint_name = con.constraint_name
   AND cc.table_name = con.table_name
  WHERE con.constraint_type = 'P'
    AND con.owner = :owner
    AND con.table_name = :table_name
) pk ON pk.column_name = c.column_name
WHERE c.owner = :owner
  AND c.table_name = :table_name
ORDER BY c.column_id
"#;

/// Load every column of `table` in `COLUMN_ID` order.
///
/// Fails with [`SchemaError::NotFound`] when the dictionary returns nothing.
pub async fn get_columns<S: Session + ?Sized>(
    session: &S,
    table: &TableRef,
) -> GenResult<Vec<ColumnSpec>> {
    tracing::debug!(table = %table, "introspecting columns");

    let rows = session
        .query(
            COLUMNS_SQL,
            &[
                ("owner", table.owner.as_str()),
                ("table_name", table.name.as_str()),
            ],
        )
        .await?;

    if rows.is_empty() {
        return Err(SchemaError::NotFound {
            table: table.to_string(),
        }
        .into());
    }

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let name = row.try_text("column_name")?.to_string();
        let data_type = row.try_text("data_type")?;
        let nullable = row.try_opt_text("nullable")?.unwrap_or("Y") == "Y";
        let key_position = match row.try_opt_text("key_position")? {
            Some(_) => Some(
                u32::try_from(row.try_i64("key_position")?)
                    .map_err(|e| crate::Error::decode("key_position", e.to_string()))?,
            ),
            None => None,
        };

        columns.push(ColumnSpec {
            name,
            declared_type: ColumnType::from_data_type(data_type),
            nullable,
            is_primary_key: key_position.is_some(),
            key_position,
        });
    }

    tracing::debug!(
        table = %table,
        columns = columns.len(),
        keys = columns.iter().filter(|c| c.is_primary_key).count(),
        nullable = columns.iter().filter(|c| c.nullable).count(),
        "columns loaded"
    );
    Ok(columns)
}

/// Primary-key columns of `columns`, ordered by key position.
///
/// Fails with [`SchemaError::NoPrimaryKey`]; a keyless table would turn into an
/// unfiltered statement with no way to target single rows.
pub fn primary_key_of(table: &TableRef, columns: &[ColumnSpec]) -> GenResult<Vec<ColumnSpec>> {
    let mut keys: Vec<ColumnSpec> = columns
        .iter()
        .filter(|c| c.is_primary_key)
        .cloned()
        .collect();
    if keys.is_empty() {
        return Err(SchemaError::NoPrimaryKey {
            table: table.to_string(),
        }
        .into());
    }
    keys.sort_by_key(|c| c.key_position.unwrap_or(u32::MAX));
    Ok(keys)
}

/// Load the primary-key columns of `table` in declared key order.
pub async fn get_primary_key_columns<S: Session + ?Sized>(
    session: &S,
    table: &TableRef,
) -> GenResult<Vec<ColumnSpec>> {
    let columns = get_columns(session, table).await?;
    primary_key_of(table, &columns)
}
