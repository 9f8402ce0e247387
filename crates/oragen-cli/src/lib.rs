mod cli;
mod config;
mod console;
mod generate;
mod logging;
mod session;
mod write;

use oragen::StatementKind;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Export(args) => generate::run(StatementKind::Merge, args).await,
        cli::Command::Delete(args) => generate::run(StatementKind::Delete, args).await,
    }
}
