//! Running the engine over files on disk
//!
//! Every file is read, downgraded and compared on a `rayon` worker. A file
//! is only ever written when its text actually changed, and always in one
//! piece: nothing is written for files that fail to parse or hit an
//! unsupported construct.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DownlevelConfig;
use crate::diagnostics::Diagnostic;
use crate::discovery::DiscoveredFiles;
use crate::engine::{Downgrader, Outcome};
use crate::error::DownlevelError;
use crate::result::{Result, ResultExt};

/// Whether changes reach the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Write,
    /// Compute everything, write nothing
    Check,
}

/// How one file ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FileStatus {
    Changed,
    Unchanged,
    ParseFailed { errors: Vec<String> },
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
    pub diagnostics: Vec<Diagnostic>,
    /// Original and rewritten text of a changed file
    #[serde(skip)]
    pub change: Option<(String, String)>,
}

impl FileReport {
    fn new(path: &Path, status: FileStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            status,
            diagnostics: Vec::new(),
            change: None,
        }
    }

    fn failed(path: &Path, err: &DownlevelError) -> Self {
        Self::new(
            path,
            FileStatus::Failed {
                message: err.to_string(),
            },
        )
    }
}

/// Totals over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    pub scanned: usize,
    pub skipped: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub parse_failures: usize,
    pub errors: usize,
    pub diagnostics: usize,
    pub warnings: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ProcessSummary {
    pub fn has_failures(&self) -> bool {
        self.parse_failures > 0 || self.errors > 0
    }
}

/// Reports for every processed file, in discovery order, and their totals
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub files: Vec<FileReport>,
    pub summary: ProcessSummary,
}

/// Applies a [`Downgrader`] to files
#[derive(Debug, Clone)]
pub struct Processor {
    downgrader: Downgrader,
    mode: Mode,
    /// Suffix of the copy written before a file is overwritten
    backup_suffix: Option<String>,
}

impl Processor {
    pub fn new(downgrader: Downgrader, mode: Mode) -> Self {
        Self {
            downgrader,
            mode,
            backup_suffix: None,
        }
    }

    pub fn from_config(config: &DownlevelConfig, mode: Mode) -> Self {
        let processor = Self::new(Downgrader::from_config(config), mode);
        if config.backup() {
            processor.with_backup(config.backup_suffix())
        } else {
            processor
        }
    }

    pub fn with_backup(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = Some(suffix.into());
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Process every discovered file in parallel
    pub fn run(&self, discovered: &DiscoveredFiles) -> ProcessResult {
        let start = Instant::now();
        let files: Vec<FileReport> = discovered
            .files
            .par_iter()
            .map(|path| self.process_file(path))
            .collect();

        let mut summary = ProcessSummary {
            scanned: discovered.files.len() + discovered.skipped.len(),
            skipped: discovered.skipped.len(),
            ..ProcessSummary::default()
        };
        for report in &files {
            match report.status {
                FileStatus::Changed => summary.changed += 1,
                FileStatus::Unchanged => summary.unchanged += 1,
                FileStatus::ParseFailed { .. } => summary.parse_failures += 1,
                FileStatus::Failed { .. } => summary.errors += 1,
            }
            summary.diagnostics += report.diagnostics.len();
            summary.warnings += report.diagnostics.iter().filter(|d| d.is_warning()).count();
        }
        summary.elapsed = start.elapsed();

        info!(
            changed = summary.changed,
            unchanged = summary.unchanged,
            failed = summary.parse_failures + summary.errors,
            "Processed {} files in {:?}",
            files.len(),
            summary.elapsed
        );
        ProcessResult { files, summary }
    }

    /// Read, downgrade and, in write mode, store one file
    pub fn process_file(&self, path: &Path) -> FileReport {
        let original = match fs::read_to_string(path)
            .map_err(|e| DownlevelError::io_error(path, e))
            .log_for_file(path)
        {
            Ok(text) => text,
            Err(err) => return FileReport::failed(path, &err),
        };

        let outcome = match self.downgrader.downgrade(&original).log_for_file(path) {
            Ok(outcome) => outcome,
            Err(err) => return FileReport::failed(path, &err),
        };

        match outcome {
            Outcome::ParseFailed { errors } => {
                warn!(file = %path.display(), errors = errors.len(), "Parse failed, file left untouched");
                FileReport::new(
                    path,
                    FileStatus::ParseFailed {
                        errors: errors.iter().map(ToString::to_string).collect(),
                    },
                )
            }
            Outcome::Unchanged { diagnostics } => FileReport {
                diagnostics,
                ..FileReport::new(path, FileStatus::Unchanged)
            },
            Outcome::Rewritten { text, diagnostics } => {
                if self.mode == Mode::Write
                    && let Err(err) = self.store(path, &original, &text).log_for_file(path)
                {
                    return FileReport {
                        diagnostics,
                        ..FileReport::failed(path, &err)
                    };
                }
                info!(file = %path.display(), "Downgraded");
                FileReport {
                    diagnostics,
                    change: Some((original, text)),
                    ..FileReport::new(path, FileStatus::Changed)
                }
            }
        }
    }

    fn store(&self, path: &Path, original: &str, text: &str) -> Result<()> {
        if let Some(suffix) = &self.backup_suffix {
            let backup = backup_path(path, suffix);
            fs::write(&backup, original).map_err(|e| DownlevelError::io_error(&backup, e))?;
        }
        fs::write(path, text).map_err(|e| DownlevelError::io_error(path, e))
    }
}

/// `Foo.cs` with suffix `.bak` is backed up as `Foo.cs.bak`
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
