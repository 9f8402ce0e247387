//! Error types for oragen

use thiserror::Error;

/// Result type alias for oragen operations
pub type GenResult<T> = Result<T, Error>;

/// Error type for statement generation.
///
/// The variants follow the recovery policy of a run: configuration, connection,
/// input and output errors abort the run, schema and query errors skip the
/// current table, and format errors only ever trigger a re-prompt.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// Table metadata problem (missing table, no privilege, no primary key).
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Operator input could not be coerced to the column type.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// A query failed for the current table.
    #[error("Query error: {0}")]
    Query(String),

    /// The database session is unusable.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The operator's input stream is closed.
    #[error("Input error: {0}")]
    Input(String),

    /// The statement sink failed to accept a statement.
    #[error("Output error: {0}")]
    Output(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether this error must terminate the whole run.
    ///
    /// Everything else is scoped to the table being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Connection(_) | Self::Input(_) | Self::Output(_)
        )
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}

/// Table metadata errors. The table is skipped and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The dictionary returned no columns. Oracle does not distinguish a
    /// missing table from one the session cannot see.
    #[error("table {table} not found or no access")]
    NotFound { table: String },

    /// Unfiltered DELETE/MERGE on a keyless table is refused.
    #[error("table {table} has no primary key")]
    NoPrimaryKey { table: String },
}

/// Coercion failure for operator input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("'{input}' is not a valid number")]
    InvalidNumber { input: String },

    #[error("'{input}' is not a valid date; expected YYYY-MM-DD (e.g., 2024-12-25)")]
    InvalidDate { input: String },
}
