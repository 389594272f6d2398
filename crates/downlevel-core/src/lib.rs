//! Downlevel Core
//!
//! Lossless rewriting engine that lowers modern C# (records, init
//! accessors, nullable annotations, pattern bindings, global usings and
//! friends) into an older dialect while keeping every untouched byte of
//! the source as it was.

pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod diagnostics;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod pretransform;
pub mod processor;
pub mod result;
pub mod rewrite;

// Re-export commonly used types
pub use config::{ConfigLoader, DownlevelConfig};
pub use diagnostics::{Diagnostic, Severity};
pub use discovery::{DiscoveredFiles, FileDiscovery};
pub use engine::{Downgrader, Outcome};
pub use error::{DownlevelError, ErrorKind};
pub use processor::{FileReport, FileStatus, Mode, ProcessResult, ProcessSummary, Processor};
pub use result::{Result, ResultExt};
pub use rewrite::{PassKind, Pipeline, RewriteOptions, TransformOutput};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("downlevel_core=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
