use chrono::NaiveDateTime;
use oragen::{Error, GeneratedStatement, GenResult, RunSummary, StatementKind, StatementSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// What goes into the file header.
#[derive(Debug, Clone)]
pub struct FileHeader<'a> {
    pub kind: StatementKind,
    pub config_path: &'a Path,
    pub generated_at: NaiveDateTime,
    pub tables: usize,
}

/// Writes statement blocks to a SQL file as they are generated.
///
/// The file is overwritten on creation and flushed after every block, so a
/// run that aborts keeps whatever was generated before the failure.
pub struct SqlFileWriter {
    path: PathBuf,
    out: BufWriter<File>,
    blocks: usize,
}

impl SqlFileWriter {
    pub fn create(path: &Path, header: &FileHeader<'_>) -> GenResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::output(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let file = File::create(path)
            .map_err(|e| Error::output(format!("failed to create {}: {e}", path.display())))?;

        let mut writer = Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            blocks: 0,
        };
        writer.write_flushed(&render_header(header))?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the footer and close the file.
    pub fn finish(mut self, summary: &RunSummary) -> GenResult<PathBuf> {
        let footer = render_footer(summary);
        self.write_flushed(&footer)?;
        tracing::debug!(path = %self.path.display(), blocks = self.blocks, "output closed");
        Ok(self.path)
    }

    fn write_flushed(&mut self, text: &str) -> GenResult<()> {
        self.out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| Error::output(format!("failed to write {}: {e}", self.path.display())))
    }
}

impl StatementSink for SqlFileWriter {
    fn accept(&mut self, statement: &GeneratedStatement) -> GenResult<()> {
        let block = render_block(statement);
        self.write_flushed(&block)?;
        self.blocks += 1;
        Ok(())
    }
}

fn render_header(header: &FileHeader<'_>) -> String {
    let title = match header.kind {
        StatementKind::Merge => "Oracle MERGE export",
        StatementKind::Delete => "Oracle DELETE statements",
    };
    let mut out = format!(
        "-- {title}\n-- Generated on {}\n-- Config: {}\n-- Tables: {}\n",
        header.generated_at.format("%Y-%m-%d %H:%M:%S"),
        header.config_path.display(),
        header.tables
    );
    match header.kind {
        StatementKind::Merge => {
            out.push_str("-- Review the statements before running them against the target.\n");
        }
        StatementKind::Delete => {
            out.push_str("-- WARNING: these DELETE statements have NOT been executed.\n");
            out.push_str("-- Review every statement and its row count before running.\n");
            out.push_str("-- No COMMIT is included; finish the transaction manually.\n");
        }
    }
    out.push_str("\nSET DEFINE OFF;\n\n");
    out
}

fn render_block(statement: &GeneratedStatement) -> String {
    let table = &statement.table;
    match statement.kind {
        StatementKind::Merge => {
            let mut out = format!("-- MERGE statements for {table}\n");
            if statement.statement_count == 0 {
                out.push_str("-- No rows matched the filters\n");
            } else {
                out.push_str(&statement.sql_text);
                out.push('\n');
            }
            out.push_str(&format!(
                "-- {} rows exported for {table}\n\n",
                statement.statement_count
            ));
            out
        }
        StatementKind::Delete => {
            let mut out = statement.sql_text.clone();
            out.push('\n');
            match statement.matched_rows {
                Some(0) => out.push_str("-- matched 0 rows at generation time\n"),
                Some(n) => out.push_str(&format!("-- {n} row(s) matched at generation time\n")),
                None => {}
            }
            out.push('\n');
            out
        }
    }
}

fn render_footer(summary: &RunSummary) -> String {
    let mut out = format!(
        "-- Summary: {} table(s) generated, {} skipped, {} failed; {} statement(s)\n",
        summary.generated(),
        summary.skipped(),
        summary.failed(),
        summary.total_statements()
    );
    out.push_str("-- After review, finish the transaction manually:\n");
    out.push_str("-- COMMIT;\n");
    out.push_str("-- ROLLBACK;\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use oragen::{PipelineOptions, ScriptedPrompter, SharedValueStore, TableRef};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_temp_dir() -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("oragen-write-test-{nonce}"));
        std::fs::create_dir_all(&dir).expect("mkdir");
        dir
    }

    fn at() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 12, 25)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn delete_stmt(table: &str, matched: u64) -> GeneratedStatement {
        let table = TableRef::parse(table).unwrap();
        GeneratedStatement {
            sql_text: oragen::build_delete(&table, None, at()),
            table,
            kind: StatementKind::Delete,
            generated_at: at(),
            statement_count: 1,
            matched_rows: Some(matched),
        }
    }

    #[test]
    fn creates_parent_dirs_and_flushes_each_block() {
        let dir = make_temp_dir();
        let path = dir.join("nested/out/delete.sql");
        let header = FileHeader {
            kind: StatementKind::Delete,
            config_path: Path::new("oragen.toml"),
            generated_at: at(),
            tables: 2,
        };

        let mut writer = SqlFileWriter::create(&path, &header).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        assert!(before.starts_with("-- Oracle DELETE statements\n"));
        assert!(before.ends_with("SET DEFINE OFF;\n\n"));

        writer.accept(&delete_stmt("SYSTEM.CLIENTS", 0)).unwrap();
        // Visible on disk before the writer is finished.
        let mid = std::fs::read_to_string(&path).unwrap();
        assert!(mid.contains("DELETE FROM SYSTEM.CLIENTS;\n-- matched 0 rows at generation time"));

        drop(writer);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn set_define_off_precedes_first_statement() {
        let header = FileHeader {
            kind: StatementKind::Merge,
            config_path: Path::new("oragen.toml"),
            generated_at: at(),
            tables: 1,
        };
        let text = render_header(&header);
        assert!(text.contains("-- Generated on 2024-12-25 10:00:00"));
        assert!(text.trim_end().ends_with("SET DEFINE OFF;"));
    }

    #[test]
    fn merge_block_reports_row_count() {
        let table = TableRef::parse("SYSTEM.CLIENTS").unwrap();
        let stmt = GeneratedStatement {
            table: table.clone(),
            kind: StatementKind::Merge,
            sql_text: String::new(),
            generated_at: at(),
            statement_count: 0,
            matched_rows: Some(0),
        };
        let block = render_block(&stmt);
        assert_eq!(
            block,
            "-- MERGE statements for SYSTEM.CLIENTS\n\
             -- No rows matched the filters\n\
             -- 0 rows exported for SYSTEM.CLIENTS\n\n"
        );
    }

    #[tokio::test]
    async fn footer_has_commented_transaction_control() {
        // An empty run still produces a well-formed file.
        let dir = make_temp_dir();
        let path = dir.join("export.sql");
        let header = FileHeader {
            kind: StatementKind::Merge,
            config_path: Path::new("oragen.toml"),
            generated_at: at(),
            tables: 0,
        };
        let mut writer = SqlFileWriter::create(&path, &header).unwrap();

        struct NoSession;
        #[async_trait::async_trait]
        impl oragen::Session for NoSession {
            async fn query(
                &self,
                sql: &str,
                _binds: &[oragen::Bind<'_>],
            ) -> GenResult<Vec<oragen::Row>> {
                panic!("unexpected query: {sql}");
            }
        }

        let summary = oragen::run_export(
            &NoSession,
            &mut ScriptedPrompter::default(),
            &mut SharedValueStore::new(),
            &[],
            &mut writer,
            PipelineOptions {
                assume_yes: false,
                prompt_shared_values: false,
            },
        )
        .await
        .unwrap();
        let written = writer.finish(&summary).unwrap();

        let text = std::fs::read_to_string(&written).unwrap();
        assert!(text.ends_with("-- COMMIT;\n-- ROLLBACK;\n"));
        assert!(!text.lines().any(|l| l.trim() == "COMMIT;"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
