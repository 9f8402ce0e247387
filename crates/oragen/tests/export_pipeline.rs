mod common;

use chrono::NaiveDate;
use common::{FakeSession, FakeTable, Failure, clients, num, orders, table, text};
use oragen::{
    ColumnSpec, ColumnType, GeneratedStatement, PipelineOptions, ScriptedPrompter,
    SharedValueStore, StatementKind, TableStage, TableStatus, Value, run_export,
};

fn quiet() -> PipelineOptions {
    PipelineOptions {
        assume_yes: false,
        prompt_shared_values: false,
    }
}

#[tokio::test]
async fn filtered_export_merges_matching_row() {
    let session = FakeSession::new().table("SYSTEM.CLIENTS", clients());
    let mut prompter = ScriptedPrompter::new(["2"]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    let summary = run_export(
        &session,
        &mut prompter,
        &mut SharedValueStore::new(),
        &[table("SYSTEM.CLIENTS")],
        &mut sink,
        quiet(),
    )
    .await
    .unwrap();

    assert_eq!(summary.generated(), 1);
    assert_eq!(summary.total_statements(), 1);
    let stmt = &sink[0];
    assert_eq!(stmt.kind, StatementKind::Merge);
    assert_eq!(stmt.statement_count, 1);
    assert_eq!(
        stmt.sql_text,
        "MERGE INTO SYSTEM.CLIENTS target\n\
USING (SELECT 2 AS CLIENT_ID, 'O''Hara' AS NAME FROM dual) source\n\
ON (target.CLIENT_ID = source.CLIENT_ID)\n\
WHEN MATCHED THEN UPDATE SET target.NAME = source.NAME\n\
WHEN NOT MATCHED THEN INSERT (CLIENT_ID, NAME) VALUES (source.CLIENT_ID, source.NAME);"
    );

    let fetch = session
        .queries()
        .into_iter()
        .find(|q| q.starts_with("SELECT CLIENT_ID, NAME"))
        .unwrap();
    assert_eq!(
        fetch,
        "SELECT CLIENT_ID, NAME FROM SYSTEM.CLIENTS WHERE CLIENT_ID = 2 ORDER BY CLIENT_ID"
    );
}

#[tokio::test]
async fn export_without_shared_values_runs_no_count() {
    let session = FakeSession::new().table("SYSTEM.CLIENTS", clients());
    let mut prompter = ScriptedPrompter::new(["2"]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    run_export(
        &session,
        &mut prompter,
        &mut SharedValueStore::new(),
        &[table("SYSTEM.CLIENTS")],
        &mut sink,
        quiet(),
    )
    .await
    .unwrap();

    assert!(!session.queries().iter().any(|q| q.contains("COUNT(*)")));
}

#[tokio::test]
async fn unfiltered_export_defaults_to_no() {
    let session = FakeSession::new().table("SYSTEM.CLIENTS", clients());
    let mut prompter = ScriptedPrompter::new(["", ""]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    let summary = run_export(
        &session,
        &mut prompter,
        &mut SharedValueStore::new(),
        &[table("SYSTEM.CLIENTS")],
        &mut sink,
        quiet(),
    )
    .await
    .unwrap();

    assert!(sink.is_empty());
    assert_eq!(
        prompter.asked[1],
        "Export ALL rows from SYSTEM.CLIENTS? (y/N): "
    );
    assert!(matches!(
        &summary.outcomes[0].status,
        TableStatus::Skipped { reason } if reason == "unfiltered export declined"
    ));
}

#[tokio::test]
async fn unfiltered_export_merges_every_row_in_key_order() {
    let session = FakeSession::new().table("SYSTEM.ORDERS", orders());
    let mut prompter = ScriptedPrompter::new(["", "", "y"]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    run_export(
        &session,
        &mut prompter,
        &mut SharedValueStore::new(),
        &[table("SYSTEM.ORDERS")],
        &mut sink,
        quiet(),
    )
    .await
    .unwrap();

    let stmt = &sink[0];
    assert_eq!(stmt.statement_count, 3);
    assert_eq!(stmt.sql_text.matches("MERGE INTO SYSTEM.ORDERS target").count(), 3);
    assert!(stmt.sql_text.contains(
        "ON (target.REGION = source.REGION AND target.ORDER_NO = source.ORDER_NO)"
    ));
    assert!(
        stmt.sql_text
            .contains("WHEN MATCHED THEN UPDATE SET target.AMOUNT = source.AMOUNT")
    );
    assert!(
        session
            .queries()
            .iter()
            .any(|q| q == "SELECT ORDER_NO, REGION, AMOUNT FROM SYSTEM.ORDERS ORDER BY REGION, ORDER_NO")
    );
}

#[tokio::test]
async fn assume_yes_exports_everything_without_asking() {
    let session = FakeSession::new().table("SYSTEM.CLIENTS", clients());
    let mut prompter = ScriptedPrompter::new([""]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    run_export(
        &session,
        &mut prompter,
        &mut SharedValueStore::new(),
        &[table("SYSTEM.CLIENTS")],
        &mut sink,
        PipelineOptions {
            assume_yes: true,
            prompt_shared_values: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(prompter.asked.len(), 1);
    assert_eq!(sink[0].statement_count, 3);
    assert!(sink[0].sql_text.contains("NULL AS NAME"));
}

#[tokio::test]
async fn zero_rows_produce_an_empty_block() {
    let session = FakeSession::new().table("SYSTEM.CLIENTS", clients());
    let mut prompter = ScriptedPrompter::new(["404"]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    let summary = run_export(
        &session,
        &mut prompter,
        &mut SharedValueStore::new(),
        &[table("SYSTEM.CLIENTS")],
        &mut sink,
        quiet(),
    )
    .await
    .unwrap();

    assert_eq!(summary.generated(), 1);
    assert_eq!(sink[0].statement_count, 0);
    assert_eq!(sink[0].sql_text, "");
    assert!(
        prompter
            .warnings
            .iter()
            .any(|w| w.contains("export block will be empty"))
    );
}

#[tokio::test]
async fn shared_value_applies_across_tables() {
    let invoices = FakeTable::new(vec![
        ColumnSpec::new("CLIENT_ID", ColumnType::Number).primary_key(1),
        ColumnSpec::new("INVOICE_NO", ColumnType::Number).primary_key(2),
        ColumnSpec::new("ISSUED", ColumnType::Date),
    ])
    .row(vec![
        num(2),
        num(1),
        Value::Date(
            NaiveDate::from_ymd_opt(2024, 12, 25)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        ),
    ]);
    let session = FakeSession::new()
        .table("SYSTEM.CLIENTS", clients())
        .table("BILLING.INVOICES", invoices);
    let mut store = SharedValueStore::from_pairs([("CLIENT_ID", "2")]);
    // Only INVOICE_NO is asked for.
    let mut prompter = ScriptedPrompter::new(["1"]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    run_export(
        &session,
        &mut prompter,
        &mut store,
        &[table("SYSTEM.CLIENTS"), table("BILLING.INVOICES")],
        &mut sink,
        quiet(),
    )
    .await
    .unwrap();

    assert_eq!(prompter.asked.len(), 1);
    assert!(prompter.asked[0].contains("INVOICE_NO (NUMBER)"));
    assert_eq!(sink.len(), 2);
    assert!(sink[1].sql_text.contains(
        "TO_DATE('2024-12-25 00:00:00', 'YYYY-MM-DD HH24:MI:SS') AS ISSUED"
    ));
    assert_eq!(
        prompter
            .notices
            .iter()
            .filter(|n| n.contains("Using shared value for CLIENT_ID"))
            .count(),
        2
    );
    // Shared-value matches are reported before the remaining keys are asked.
    assert_eq!(
        prompter
            .notices
            .iter()
            .filter(|n| *n == "  Found 1 row(s) with shared column values")
            .count(),
        2
    );
    assert!(session.queries().iter().any(|q| {
        q == "SELECT COUNT(*) AS ROW_COUNT FROM BILLING.INVOICES WHERE CLIENT_ID = 2"
    }));
}

#[tokio::test]
async fn row_fetch_failure_marks_table_failed() {
    let session = FakeSession::new()
        .table("SYSTEM.CLIENTS", clients())
        .fail_on("FROM SYSTEM.CLIENTS", Failure::Query);
    let mut prompter = ScriptedPrompter::new(["2"]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    let summary = run_export(
        &session,
        &mut prompter,
        &mut SharedValueStore::new(),
        &[table("SYSTEM.CLIENTS")],
        &mut sink,
        quiet(),
    )
    .await
    .unwrap();

    assert!(sink.is_empty());
    assert!(matches!(
        &summary.outcomes[0].status,
        TableStatus::Failed { stage: TableStage::Building, .. }
    ));
    assert!(
        prompter
            .warnings
            .iter()
            .any(|w| w.starts_with("Failed SYSTEM.CLIENTS while building"))
    );
}

#[tokio::test]
async fn varchar_keys_are_quoted_in_the_fetch() {
    let session = FakeSession::new().table(
        "SYSTEM.REGIONS",
        FakeTable::new(vec![
            ColumnSpec::new("CODE", ColumnType::Varchar).primary_key(1),
            ColumnSpec::new("LABEL", ColumnType::Varchar),
        ])
        .row(vec![text("EU"), text("Europe")])
        .row(vec![text("X'Y"), text("odd")]),
    );
    let mut prompter = ScriptedPrompter::new(["X'Y"]);
    let mut sink: Vec<GeneratedStatement> = Vec::new();

    run_export(
        &session,
        &mut prompter,
        &mut SharedValueStore::new(),
        &[table("SYSTEM.REGIONS")],
        &mut sink,
        quiet(),
    )
    .await
    .unwrap();

    assert_eq!(sink[0].statement_count, 1);
    assert!(sink[0].sql_text.contains("SELECT 'X''Y' AS CODE, 'odd' AS LABEL FROM dual"));
}
