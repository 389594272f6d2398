//! Command implementations

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use downlevel_core::{ConfigLoader, DownlevelConfig, FileDiscovery, Mode, Processor};
use tracing::debug;

use crate::output::Reporter;

/// Options of the default rewrite command
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub paths: Vec<PathBuf>,
    pub check: bool,
    pub diff: bool,
    pub backup: bool,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Downgrade the given paths
///
/// Exit code 1 means `--check` found files to change, 2 means some file
/// failed to parse or could not be rewritten.
pub fn run_command(options: RunOptions) -> Result<ExitCode> {
    let paths = if options.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        options.paths
    };
    if let Some(missing) = paths.iter().find(|path| !path.exists()) {
        bail!("Path does not exist: {}", missing.display());
    }

    let config = ConfigLoader::load(options.config.as_deref(), paths.first().map(PathBuf::as_path))
        .context("Failed to load configuration")?;
    debug!("Loaded configuration: {:?}", config);

    let mode = if options.check || options.diff {
        Mode::Check
    } else {
        Mode::Write
    };
    let processor = processor(&config, mode, options.backup);

    let discovered = FileDiscovery::from_config(&config)?
        .discover(&paths)
        .context("Failed to discover files")?;
    let result = processor.run(&discovered);

    let reporter = Reporter::new(mode, options.diff, options.verbose);
    for report in &result.files {
        reporter.print_file(report);
    }
    reporter.print_summary(&result.summary);

    let code = if result.summary.has_failures() {
        ExitCode::from(2)
    } else if options.check && result.summary.changed > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    };
    Ok(code)
}

fn processor(config: &DownlevelConfig, mode: Mode, backup: bool) -> Processor {
    let processor = Processor::from_config(config, mode);
    if backup {
        processor.with_backup(config.backup_suffix())
    } else {
        processor
    }
}

/// Print the configuration JSON Schema
pub fn schema_command() -> Result<()> {
    let schema = DownlevelConfig::json_schema();
    println!(
        "{}",
        serde_json::to_string_pretty(&schema).context("Failed to render schema")?
    );
    Ok(())
}
