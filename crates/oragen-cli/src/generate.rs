use crate::cli::RunArgs;
use crate::config::ProjectConfig;
use crate::console::{StdinPrompter, print_header};
use crate::logging::init_logging;
use crate::session::OracleSession;
use crate::write::{FileHeader, SqlFileWriter};
use colored::Colorize;
use oragen::{PipelineOptions, RunSummary, StatementKind, TableStatus, run_delete, run_export};
use std::path::Path;

pub async fn run(kind: StatementKind, args: RunArgs) -> anyhow::Result<()> {
    init_logging(args.debug)?;

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => anyhow::bail!("failed to load .env: {e}"),
    }

    let cfg = ProjectConfig::load(args.config.clone())?;
    let mut store = cfg.shared_values();
    let output = cfg.output_path(kind, args.output.as_deref());
    let options = PipelineOptions {
        assume_yes: args.assume_yes,
        prompt_shared_values: args.prompt_shared_values,
    };

    print_header(match kind {
        StatementKind::Merge => "Oracle MERGE export",
        StatementKind::Delete => "Oracle DELETE statement generator",
    });
    println!("Config:  {}", cfg.config_path.display());
    println!("Target:  {}@{}", cfg.file.database.username, cfg.file.database.dsn);
    println!("Tables:  {}", cfg.tables.len());
    println!("Output:  {}", output.display());

    let session = OracleSession::connect(&cfg.file.database).await?;
    println!("{}", "Connected.".green());

    let header = FileHeader {
        kind,
        config_path: &cfg.config_path,
        generated_at: chrono::Local::now().naive_local(),
        tables: cfg.tables.len(),
    };
    let mut writer = SqlFileWriter::create(&output, &header)?;
    let mut prompter = StdinPrompter::stdin();

    let result = match kind {
        StatementKind::Merge => {
            run_export(
                &session,
                &mut prompter,
                &mut store,
                &cfg.tables,
                &mut writer,
                options,
            )
            .await
        }
        StatementKind::Delete => {
            run_delete(
                &session,
                &mut prompter,
                &mut store,
                &cfg.tables,
                &mut writer,
                options,
            )
            .await
        }
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            let partial = writer.path().display().to_string();
            if let Err(close) = session.close().await {
                tracing::debug!(error = %close, "close after failure");
            }
            return Err(anyhow::anyhow!(e).context(format!(
                "run aborted; statements generated so far are in {partial}"
            )));
        }
    };

    let written = writer.finish(&summary)?;
    session.close().await?;

    print_summary(&summary, &written);
    if let Some(path) = &args.summary_json {
        write_summary_json(path, &summary)?;
        println!("Summary JSON: {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, output: &Path) {
    print_header("Summary");
    for outcome in &summary.outcomes {
        match &outcome.status {
            TableStatus::Generated {
                statements,
                matched_rows,
            } => {
                let rows = matched_rows
                    .map(|n| format!(", {n} row(s) matched"))
                    .unwrap_or_default();
                println!(
                    "  {} {}: {statements} statement(s){rows}",
                    "✓".green().bold(),
                    outcome.table
                );
            }
            TableStatus::Skipped { reason } => {
                println!("  {} {}: skipped ({reason})", "⚠".yellow().bold(), outcome.table);
            }
            TableStatus::Failed { stage, reason } => {
                println!(
                    "  {} {}: failed while {stage} ({reason})",
                    "✗".red().bold(),
                    outcome.table
                );
            }
        }
    }
    println!();
    println!(
        "{} generated, {} skipped, {} failed; {} statement(s) written to {}",
        summary.generated(),
        summary.skipped(),
        summary.failed(),
        summary.total_statements(),
        output.display()
    );
    if summary.kind == StatementKind::Delete && summary.generated() > 0 {
        println!(
            "{}",
            "Nothing was executed. Review the file, run it manually, then COMMIT or ROLLBACK."
                .yellow()
        );
    }
}

fn write_summary_json(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create directory {}: {e}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}
