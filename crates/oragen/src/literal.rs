//! Oracle literal formatting.
//!
//! Everything here is pure: the same input and column type always produce the
//! same literal text. Dates always carry an explicit format mask so the
//! generated SQL does not depend on the session's NLS settings.

use crate::error::FormatError;
use crate::introspect::ColumnType;
use crate::row::Value;
use chrono::NaiveDate;
use std::sync::OnceLock;

const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format operator input for a column of type `ty`.
///
/// NUMBER must be a signed decimal and DATE/TIMESTAMP a real calendar date
/// written as `YYYY-MM-DD` (surrounding whitespace is ignored for both). Any
/// other type is quoted as a string exactly as typed.
pub fn format_input(raw: &str, ty: &ColumnType) -> Result<String, FormatError> {
    let value = raw.trim();
    match ty {
        ColumnType::Number => {
            if is_signed_decimal(value) {
                Ok(value.to_string())
            } else {
                Err(FormatError::InvalidNumber {
                    input: raw.to_string(),
                })
            }
        }
        ColumnType::Date => {
            let date = parse_input_date(value).ok_or_else(|| FormatError::InvalidDate {
                input: raw.to_string(),
            })?;
            Ok(format!(
                "TO_DATE('{}', 'YYYY-MM-DD')",
                date.format(INPUT_DATE_FORMAT)
            ))
        }
        ColumnType::Timestamp => {
            let date = parse_input_date(value).ok_or_else(|| FormatError::InvalidDate {
                input: raw.to_string(),
            })?;
            Ok(format!(
                "TO_TIMESTAMP('{}', 'YYYY-MM-DD')",
                date.format(INPUT_DATE_FORMAT)
            ))
        }
        ColumnType::Varchar | ColumnType::Other(_) => Ok(quote_string(raw)),
    }
}

/// Format a fetched row value for a column of type `ty`.
pub fn format_value(value: &Value, ty: &ColumnType) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Number(n) => match ty {
            ColumnType::Number => n.clone(),
            _ => quote_string(n),
        },
        Value::Text(s) => match ty {
            // Drivers may hand back NUMBER columns as text; keep them unquoted
            // only when they really are numbers.
            ColumnType::Number if is_signed_decimal(s) => s.clone(),
            _ => quote_string(s),
        },
        Value::Date(dt) => format!(
            "TO_DATE('{}', 'YYYY-MM-DD HH24:MI:SS')",
            dt.format("%Y-%m-%d %H:%M:%S")
        ),
        Value::Timestamp(dt) => format!(
            "TO_TIMESTAMP('{}', 'YYYY-MM-DD HH24:MI:SS.FF')",
            dt.format("%Y-%m-%d %H:%M:%S%.6f")
        ),
    }
}

/// `[+-]digits[.digits]`, also `.5` and `5.`; no exponents or separators.
pub fn is_signed_decimal(s: &str) -> bool {
    static DECIMAL_RE: OnceLock<regex::Regex> = OnceLock::new();
    DECIMAL_RE
        .get_or_init(|| {
            regex::Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$")
                .expect("invalid built-in decimal regex")
        })
        .is_match(s)
}

/// Single-quote `s`, doubling embedded quotes.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

// `%m`/`%d` accept single digits, so the shape is checked separately.
fn parse_input_date(value: &str) -> Option<NaiveDate> {
    let b = value.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, INPUT_DATE_FORMAT).ok()
}
