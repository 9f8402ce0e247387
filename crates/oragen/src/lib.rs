//! oragen
//!
//! Generates reviewable Oracle SQL (MERGE for export, DELETE for cleanup) from
//! primary-key filters collected interactively per table. Nothing generated
//! here is ever executed: the session is only used for dictionary lookups,
//! `COUNT(*)` and row fetches.
//!
//! # Features
//!
//! - **Schema introspection**: column list and primary key from the data dictionary
//! - **Filter collection**: per-column prompts with type coercion and re-prompting
//! - **Shared values**: one value applied to every table with a matching key column
//! - **Delete preview**: count and sample built from the same predicate as the DELETE
//! - **Statement building**: MERGE per row, DELETE per table, safely quoted literals
//!
//! # Example
//!
//! ```ignore
//! use oragen::{PipelineOptions, ScriptedPrompter, SharedValueStore, TableRef, run_delete};
//!
//! let tables = vec![TableRef::parse("SYSTEM.CLIENTS")?];
//! let mut store = SharedValueStore::from_pairs([("CLIENT_ID", "12345")]);
//! let mut prompter = ScriptedPrompter::new(["yes"]);
//! let mut statements = Vec::new();
//!
//! let summary = run_delete(
//!     &session,
//!     &mut prompter,
//!     &mut store,
//!     &tables,
//!     &mut statements,
//!     PipelineOptions { prompt_shared_values: false, ..Default::default() },
//! )
//! .await?;
//! assert_eq!(summary.generated(), 1);
//! ```

pub mod collect;
pub mod error;
pub mod ident;
pub mod introspect;
pub mod literal;
pub mod pipeline;
pub mod preview;
pub mod prompt;
pub mod row;
pub mod session;
pub mod shared;
pub mod statement;

pub use collect::{FilterSource, FilterValue, collect_filters};
pub use error::{Error, FormatError, GenResult, SchemaError};
pub use ident::{TableRef, column_sql};
pub use introspect::{
    ColumnSpec, ColumnType, get_columns, get_primary_key_columns, primary_key_of,
};
pub use literal::{format_input, format_value, quote_string};
pub use pipeline::{
    PipelineOptions, RunSummary, StatementSink, TableOutcome, TableStage, TableStatus,
    extend_shared_values, run_delete, run_export,
};
pub use preview::{PREVIEW_SAMPLE_LIMIT, Preview, preview, render_preview};
pub use prompt::{Prompter, ScriptedPrompter, confirm};
pub use row::{Row, RowExt, Value};
pub use session::{Bind, Session};
pub use shared::SharedValueStore;
pub use statement::{
    GeneratedStatement, Predicate, StatementKind, build_delete, build_merge, build_predicate,
    count_sql, delete_sql, sample_sql, select_rows_sql,
};
