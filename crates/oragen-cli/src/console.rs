//! Terminal [`Prompter`].

use colored::Colorize;
use oragen::{Error, GenResult, Prompter};
use std::io::{BufRead, Write};

pub struct StdinPrompter<R> {
    input: R,
}

impl StdinPrompter<std::io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: std::io::stdin().lock(),
        }
    }
}

impl<R: BufRead> Prompter for StdinPrompter<R> {
    fn ask(&mut self, label: &str) -> GenResult<String> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", label.bold())
            .and_then(|_| stdout.flush())
            .map_err(|e| Error::output(format!("failed to write prompt: {e}")))?;

        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .map_err(|e| Error::input(format!("failed to read input: {e}")))?;
        if n == 0 {
            return Err(Error::input("input closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn notice(&mut self, message: &str) {
        if message.trim_start().starts_with('✓') {
            println!("{}", message.green());
        } else {
            println!("{message}");
        }
    }

    fn warn(&mut self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }
}

/// Section header, in the same style as the rest of the console output.
pub fn print_header(title: &str) {
    println!();
    println!("{}", "─".repeat(70).bright_black());
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(70).bright_black());
}
