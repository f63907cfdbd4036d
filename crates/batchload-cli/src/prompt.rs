//! Terminal prompts backed by `inquire`

use batchload_core::{IngestError, IngestResult, Prompter};
use colored::Colorize;
use inquire::{InquireError, Select, Text};
use std::io::{self, Write};

/// [`Prompter`] reading from the terminal
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl InquirePrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for InquirePrompter {
    fn choose_one(&mut self, prompt: &str, options: &[String]) -> IngestResult<String> {
        Select::new(prompt, options.to_vec())
            .with_page_size(15)
            .prompt()
            .map_err(prompt_error)
    }

    fn read_text(&mut self, prompt: &str) -> IngestResult<String> {
        Text::new(prompt).prompt().map_err(prompt_error)
    }

    fn notify(&mut self, message: &str) {
        let _ = write_notice(&mut io::stderr().lock(), message);
    }
}

/// Notices go to stderr so `--json` output on stdout stays parseable.
pub(crate) fn write_notice<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "{}", message.bold())
}

/// Esc and Ctrl-C end the run like any other prompt failure.
pub(crate) fn prompt_error(err: InquireError) -> IngestError {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            IngestError::prompt("cancelled by operator")
        },
        other => IngestError::prompt(other.to_string()),
    }
}
