use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Export,
    Delete,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Export(RunArgs),
    Delete(RunArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    pub config: PathBuf,
    pub output: Option<PathBuf>,
    pub assume_yes: bool,
    pub prompt_shared_values: bool,
    pub summary_json: Option<PathBuf>,
    pub debug: bool,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "export" => parse_run(HelpTopic::Export, it.map(|s| s.as_str())),
        "delete" => parse_run(HelpTopic::Delete, it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_run<'a>(
    topic: HelpTopic,
    mut it: impl Iterator<Item = &'a str>,
) -> anyhow::Result<Command> {
    let mut config = PathBuf::from("oragen.toml");
    let mut output: Option<PathBuf> = None;
    let mut summary_json: Option<PathBuf> = None;
    let mut assume_yes = false;
    let mut prompt_shared_values = true;
    let mut debug = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(topic)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--output" | "-o" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--output requires a value");
                };
                output = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--output=") => {
                output = Some(PathBuf::from(token.trim_start_matches("--output=")));
            }
            "--summary-json" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--summary-json requires a value");
                };
                summary_json = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--summary-json=") => {
                summary_json = Some(PathBuf::from(token.trim_start_matches("--summary-json=")));
            }
            "--yes" | "-y" => assume_yes = true,
            "--no-shared-prompt" => prompt_shared_values = false,
            "--debug" => debug = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let args = RunArgs {
        config,
        output,
        assume_yes,
        prompt_shared_values,
        summary_json,
        debug,
    };
    Ok(match topic {
        HelpTopic::Delete => Command::Delete(args),
        _ => Command::Export(args),
    })
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
oragen - generate reviewable Oracle MERGE/DELETE scripts

USAGE:
  oragen <COMMAND> [OPTIONS]

COMMANDS:
  export        Write MERGE statements for the filtered rows of each table
  delete        Write DELETE statements after previewing the matching rows

Nothing is executed against the database: the output is a SQL file to review
and run by hand.

Run `oragen <command> --help` for more."
            );
        }
        HelpTopic::Export => {
            println!(
                "\
USAGE:
  oragen export [OPTIONS]

OPTIONS:
  --config <FILE>         Config file path (default: oragen.toml)
  -o, --output <FILE>     Output file (default: ./oracle_merge_exports/merge_export.sql)
  -y, --yes               Do not ask before exporting a table without filters
  --no-shared-prompt      Do not offer to add shared values at start
  --summary-json <FILE>   Also write the run summary as JSON
  --debug                 Verbose logging on stderr
  -h, --help              Print help"
            );
        }
        HelpTopic::Delete => {
            println!(
                "\
USAGE:
  oragen delete [OPTIONS]

OPTIONS:
  --config <FILE>         Config file path (default: oragen.toml)
  -o, --output <FILE>     Output file (default: ./oracle_delete_statements/delete_statements.sql)
  -y, --yes               Do not ask for confirmation after each preview
  --no-shared-prompt      Do not offer to add shared values at start
  --summary-json <FILE>   Also write the run summary as JSON
  --debug                 Verbose logging on stderr
  -h, --help              Print help

Generated DELETE statements are never committed; the file ends with a
commented COMMIT/ROLLBACK pair."
            );
        }
    }
}
