//! Input file selection
//!
//! Lists matching files under a root directory and lets the operator pick
//! one. Choosing "Cancel" (or pressing Esc) means no file was selected.

use crate::prompt::prompt_error;
use batchload_core::prompt::{FileFilter, FilePicker};
use batchload_core::IngestResult;
use inquire::{InquireError, Select};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const CANCEL: &str = "Cancel";

/// How deep below the root to look for candidates
const DEFAULT_MAX_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct InquireFilePicker {
    root: PathBuf,
    max_depth: usize,
}

impl InquireFilePicker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Files under the root accepted by `filter`, sorted by path
    pub fn candidates(&self, filter: &FileFilter) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| filter.matches(path))
            .collect()
    }

    fn label(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

impl FilePicker for InquireFilePicker {
    fn pick_file(&self, filter: &FileFilter) -> IngestResult<Option<PathBuf>> {
        let candidates = self.candidates(filter);
        debug!(root = %self.root.display(), found = candidates.len(), "Scanned for input files");

        let mut options: Vec<String> = candidates.iter().map(|p| self.label(p)).collect();
        options.push(CANCEL.to_string());

        let prompt = format!("Select a file ({}):", filter.label);
        let choice = match Select::new(&prompt, options.clone()).with_page_size(15).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled) => return Ok(None),
            Err(e) => return Err(prompt_error(e)),
        };

        Ok(options
            .iter()
            .position(|o| *o == choice)
            .and_then(|idx| candidates.get(idx).cloned()))
    }
}
