//! Operator interaction.
//!
//! The pipelines never touch a terminal directly. Everything they ask or show
//! goes through [`Prompter`], so tests can drive a run with scripted answers.

use crate::error::{Error, GenResult};
use std::collections::VecDeque;

/// Blocking request/response boundary to the operator.
pub trait Prompter {
    /// Show `label` and block until the operator answers. The answer may be
    /// blank. Fails only when input is closed.
    fn ask(&mut self, label: &str) -> GenResult<String>;

    /// Display an informational line.
    fn notice(&mut self, message: &str);

    /// Display a warning line.
    fn warn(&mut self, message: &str) {
        self.notice(&format!("WARNING: {message}"));
    }
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask(&mut self, label: &str) -> GenResult<String> {
        (**self).ask(label)
    }

    fn notice(&mut self, message: &str) {
        (**self).notice(message)
    }

    fn warn(&mut self, message: &str) {
        (**self).warn(message)
    }
}

/// Ask a yes/no question until it gets a recognizable answer.
///
/// With `default` set, a blank answer returns it (`y/N` style); without one,
/// blank answers are asked again.
pub fn confirm<P: Prompter + ?Sized>(
    prompter: &mut P,
    question: &str,
    default: Option<bool>,
) -> GenResult<bool> {
    let hint = match default {
        Some(true) => "(Y/n)",
        Some(false) => "(y/N)",
        None => "(yes/no)",
    };
    loop {
        let answer = prompter.ask(&format!("{question} {hint}: "))?;
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "" => {
                if let Some(d) = default {
                    return Ok(d);
                }
            }
            _ => {}
        }
        prompter.notice("Please enter 'yes' or 'no'");
    }
}

/// A [`Prompter`] that replays canned answers and records everything shown.
///
/// Running out of answers behaves like closed input.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Labels passed to [`Prompter::ask`], in order.
    pub asked: Vec<String>,
    /// Lines passed to [`Prompter::notice`], in order.
    pub notices: Vec<String>,
    /// Lines passed to [`Prompter::warn`], in order.
    pub warnings: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, label: &str) -> GenResult<String> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| Error::input(format!("no scripted answer for: {label}")))
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}
