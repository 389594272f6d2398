//! Per-file lines, diffs and the final summary

use std::path::Path;

use colored::*;
use downlevel_core::{FileReport, FileStatus, Mode, ProcessSummary, Severity};
use similar::TextDiff;

/// Prints processing results for humans
pub struct Reporter {
    mode: Mode,
    diff: bool,
    verbose: bool,
}

impl Reporter {
    pub fn new(mode: Mode, diff: bool, verbose: bool) -> Self {
        Self {
            mode,
            diff,
            verbose,
        }
    }

    pub fn print_file(&self, report: &FileReport) {
        let path = report.path.display();
        match &report.status {
            FileStatus::Changed => {
                if self.diff
                    && let Some((original, modified)) = &report.change
                {
                    print!("{}", render_diff(&report.path, original, modified));
                } else if self.mode == Mode::Check {
                    println!("{} {path}", "Would downgrade".yellow());
                } else {
                    println!("{} {path}", "Downgraded".green());
                }
            }
            FileStatus::Unchanged => {
                if self.verbose {
                    println!("{} {path}", "Unchanged".dimmed());
                }
            }
            FileStatus::ParseFailed { errors } => {
                eprintln!("{} {path}: parse failed, file left untouched", "error:".red().bold());
                for error in errors {
                    eprintln!("    {error}");
                }
            }
            FileStatus::Failed { message } => {
                eprintln!("{} {path}: {message}", "error:".red().bold());
            }
        }

        for diagnostic in &report.diagnostics {
            match diagnostic.severity {
                Severity::Warning => eprintln!(
                    "{} {path} [{}]: {}",
                    "warning:".yellow().bold(),
                    diagnostic.pass,
                    diagnostic.message
                ),
                Severity::Info if self.verbose => eprintln!(
                    "{} {path} [{}]: {}",
                    "info:".blue(),
                    diagnostic.pass,
                    diagnostic.message
                ),
                Severity::Info => {}
            }
        }
    }

    pub fn print_summary(&self, summary: &ProcessSummary) {
        println!("\n{}", "Summary:".bold());
        println!("  Files scanned: {}", summary.scanned);
        if summary.skipped > 0 {
            println!("  Generated files skipped: {}", summary.skipped);
        }

        let changed_label = match self.mode {
            Mode::Write => "Downgraded",
            Mode::Check => "Would downgrade",
        };
        if summary.changed > 0 {
            println!("  {changed_label}: {}", summary.changed.to_string().green());
        } else {
            println!("  {changed_label}: 0");
        }
        println!("  Unchanged: {}", summary.unchanged);
        if summary.warnings > 0 {
            println!("  Warnings: {}", summary.warnings.to_string().yellow());
        }
        if summary.parse_failures > 0 {
            println!("  Parse failures: {}", summary.parse_failures.to_string().red());
        }
        if summary.errors > 0 {
            println!("  Errors: {}", summary.errors.to_string().red());
        }
        println!("  Time: {:.2?}", summary.elapsed);
    }
}

/// Unified diff of one file, colored line by line
pub fn render_diff(path: &Path, original: &str, modified: &str) -> String {
    let name = path.display().to_string();
    let diff = TextDiff::from_lines(original, modified);
    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header(&name, &name)
        .to_string();

    let mut output = String::with_capacity(unified.len());
    for line in unified.lines() {
        let colored = if line.starts_with("---") || line.starts_with("+++") {
            line.bold().to_string()
        } else if line.starts_with("@@") {
            line.cyan().to_string()
        } else if line.starts_with('+') {
            line.green().to_string()
        } else if line.starts_with('-') {
            line.red().to_string()
        } else {
            line.to_string()
        };
        output.push_str(&colored);
        output.push('\n');
    }
    output
}
