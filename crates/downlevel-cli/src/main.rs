//! downlevel CLI
//!
//! Rewrites modern C# sources into an older dialect, in place

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use downlevel_core::init_tracing;
use tracing::error;

use crate::commands::RunOptions;

#[derive(Parser)]
#[command(name = "downlevel")]
#[command(about = "downlevel: lower modern C# to an older language version, keeping every comment and space")]
#[command(version = downlevel_core::VERSION)]
#[command(args_conflicts_with_subcommands = true)]
#[command(
    long_about = "downlevel rewrites records, init accessors, nullable annotations, pattern\n\
bindings, global usings, file-scoped namespaces, expression bodies and property\n\
initializers into code an older C# compiler accepts. Untouched text is kept byte for byte.\n\
\n\
Examples:\n  \
downlevel src/               # Rewrite every .cs file under src/\n  \
downlevel --check .          # List files that would change, exit 1 if any\n  \
downlevel --diff Foo.cs      # Show the rewrite without writing it\n  \
downlevel schema             # Print the configuration JSON Schema"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Files or directories to rewrite
    #[arg(value_name = "PATHS", help = "Files or directories (default: current directory)")]
    paths: Vec<PathBuf>,

    /// Report files that would change without writing them
    #[arg(long)]
    check: bool,

    /// Print a unified diff per changed file without writing
    #[arg(long, conflicts_with = "check")]
    diff: bool,

    /// Copy each file before overwriting it
    #[arg(long)]
    backup: bool,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.downlevelrc.json/.downlevelrc.toml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the JSON Schema of the configuration file
    Schema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if std::env::var("RUST_LOG").is_err() {
        let log_level = match cli.verbose {
            0 => "downlevel_core=warn",
            1 => "downlevel_core=info",
            2 => "downlevel_core=debug",
            _ => "downlevel_core=trace",
        };
        unsafe {
            std::env::set_var("RUST_LOG", log_level);
        }
    }
    init_tracing();

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        return ExitCode::from(2);
    }

    let result = match cli.command {
        Some(Commands::Schema) => commands::schema_command().map(|()| ExitCode::SUCCESS),
        None => commands::run_command(RunOptions {
            paths: cli.paths,
            check: cli.check,
            diff: cli.diff,
            backup: cli.backup,
            config: cli.config,
            verbose: cli.verbose > 0,
        }),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}
