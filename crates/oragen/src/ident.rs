//! Oracle identifier handling.
//!
//! [`TableRef`] is the validated `OWNER.TABLE` pair every pipeline step works
//! with. Column names come from the data dictionary and are rendered through
//! [`column_sql`], which quotes anything that is not a plain upper-case name.
//!
//! - Unquoted parts are validated against: `[A-Za-z][A-Za-z0-9_$#]*`
//! - Quoted output escapes `"` as `""`

use crate::error::{Error, GenResult};
use serde::{Serialize, Serializer};
use std::fmt;

/// A qualified table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub owner: String,
    pub name: String,
}

impl TableRef {
    /// Parse an `OWNER.TABLE` identifier.
    ///
    /// Exactly one `.` is allowed. Both parts are trimmed, upper-cased and
    /// validated as unquoted Oracle identifiers.
    pub fn parse(raw: &str) -> GenResult<Self> {
        let raw = raw.trim();
        let Some((owner, name)) = raw.split_once('.') else {
            return Err(Error::config(format!(
                "table name must be in OWNER.TABLE format, got: {raw}"
            )));
        };
        if name.contains('.') {
            return Err(Error::config(format!(
                "table name must contain exactly one '.', got: {raw}"
            )));
        }

        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() {
            return Err(Error::config(format!(
                "invalid table name, expected OWNER.TABLE, got: {raw}"
            )));
        }
        validate_part(owner, raw)?;
        validate_part(name, raw)?;

        Ok(Self {
            owner: owner.to_ascii_uppercase(),
            name: name.to_ascii_uppercase(),
        })
    }

    /// Render the qualified name as SQL.
    pub fn to_sql(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

impl Serialize for TableRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn validate_part(part: &str, raw: &str) -> GenResult<()> {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(Error::config(format!(
                "invalid identifier start character '{c}' in {raw}"
            )));
        }
        None => return Err(Error::config(format!("empty identifier segment in {raw}"))),
    }
    for c in chars {
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '#') {
            return Err(Error::config(format!(
                "invalid character '{c}' in identifier {raw}"
            )));
        }
    }
    Ok(())
}

/// Render a column name from the data dictionary as SQL.
///
/// Plain upper-case names are emitted as-is. Anything else (mixed case,
/// special characters, reserved words such as `DATE` or `LEVEL`) is
/// double-quoted so it keeps its exact dictionary spelling.
pub fn column_sql(name: &str) -> String {
    if is_plain_upper(name) && !is_reserved(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out.push('"');
    out
}

/// Oracle SQL reserved words and pseudo-columns (`V$RESERVED_WORDS` with
/// `RESERVED = 'Y'`, plus the names that resolve to pseudo-columns).
const RESERVED_WORDS: &[&str] = &[
    "ACCESS", "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "AUDIT", "BETWEEN", "BY",
    "CHAR", "CHECK", "CLUSTER", "COLUMN", "COLUMN_VALUE", "COMMENT", "COMPRESS", "CONNECT",
    "CREATE", "CURRENT", "DATE", "DECIMAL", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
    "ELSE", "EXCLUSIVE", "EXISTS", "FILE", "FLOAT", "FOR", "FROM", "GRANT", "GROUP",
    "HAVING", "IDENTIFIED", "IMMEDIATE", "IN", "INCREMENT", "INDEX", "INITIAL", "INSERT",
    "INTEGER", "INTERSECT", "INTO", "IS", "LEVEL", "LIKE", "LOCK", "LONG", "MAXEXTENTS",
    "MINUS", "MLSLABEL", "MODE", "MODIFY", "NESTED_TABLE_ID", "NOAUDIT", "NOCOMPRESS", "NOT",
    "NOWAIT", "NULL", "NUMBER", "OF", "OFFLINE", "ON", "ONLINE", "OPTION", "OR", "ORDER",
    "PCTFREE", "PRIOR", "PUBLIC", "RAW", "RENAME", "RESOURCE", "REVOKE", "ROW", "ROWID",
    "ROWNUM", "ROWS", "SELECT", "SESSION", "SET", "SHARE", "SIZE", "SMALLINT", "START",
    "SUCCESSFUL", "SYNONYM", "SYSDATE", "TABLE", "THEN", "TO", "TRIGGER", "UID", "UNION",
    "UNIQUE", "UPDATE", "USER", "VALIDATE", "VALUES", "VARCHAR", "VARCHAR2", "VIEW",
    "WHENEVER", "WHERE", "WITH",
];

fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

fn is_plain_upper(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '_' | '$' | '#'))
}
