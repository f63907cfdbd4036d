//! Interactive collaborators
//!
//! The ingestion core never talks to a terminal directly. It asks a
//! [`Prompter`] for choices and free text and a [`FilePicker`] for the input
//! file. The CLI backs these with `inquire`; tests use the scripted doubles
//! in [`crate::testing`].

use crate::error::IngestResult;
use std::path::{Path, PathBuf};

/// Choice and text input from the operator
pub trait Prompter {
    /// Ask the operator to pick one of `options`; returns the chosen label.
    fn choose_one(&mut self, prompt: &str, options: &[String]) -> IngestResult<String>;

    /// Ask for a line of free text.
    fn read_text(&mut self, prompt: &str) -> IngestResult<String>;

    /// Show an informational message (re-prompt hints, confirmations).
    fn notify(&mut self, message: &str);
}

/// Selection of the file to ingest
pub trait FilePicker {
    /// `Ok(None)` means the operator declined to pick a file.
    fn pick_file(&self, filter: &FileFilter) -> IngestResult<Option<PathBuf>>;
}

/// Which files a picker should offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub label: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn csv() -> Self {
        Self {
            label: "CSV Files".to_string(),
            extensions: vec!["csv".to_string()],
        }
    }

    /// Case-insensitive extension match
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// A picker that always returns a path fixed up front (`--file`).
#[derive(Debug, Clone)]
pub struct FixedFilePicker(pub Option<PathBuf>);

impl FilePicker for FixedFilePicker {
    fn pick_file(&self, _filter: &FileFilter) -> IngestResult<Option<PathBuf>> {
        Ok(self.0.clone())
    }
}
