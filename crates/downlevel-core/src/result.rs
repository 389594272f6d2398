//! Result type alias for downgrading operations

use std::path::Path;

use tracing::{error, warn};

use crate::error::DownlevelError;

/// Standard Result type for downgrading operations
pub type Result<T> = std::result::Result<T, DownlevelError>;

/// Per-file error reporting
pub trait ResultExt<T> {
    /// Log an error against the file it aborted and pass it on
    ///
    /// Recoverable errors only cost that file and are logged as warnings;
    /// anything else points at a bug and is logged as an error.
    fn log_for_file(self, path: &Path) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn log_for_file(self, path: &Path) -> Result<T> {
        if let Err(err) = &self {
            let file = path.display();
            if err.is_recoverable() {
                warn!(%file, kind = ?err.kind(), "File skipped: {err}");
            } else {
                error!(%file, kind = ?err.kind(), "File aborted: {err}");
            }
        }
        self
    }
}
