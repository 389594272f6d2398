//! Error types for downgrading operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for downgrading operations
///
/// Parse failures of input files are not errors: the engine reports them as
/// an outcome and leaves the file alone. The variants here abort the file
/// (or the run) they occur in.
#[derive(Debug, Error)]
pub enum DownlevelError {
    /// A lowering met a construct variant it has no rule for
    #[error("Unsupported construct in pass '{pass}': {construct}")]
    Unsupported {
        pass: &'static str,
        construct: String,
    },

    /// Code generated by a lowering did not parse back
    #[error("Generated code for '{construct}' failed to parse: {message}")]
    GeneratedCode { construct: String, message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File discovery errors (bad glob, unreadable directory)
    #[error("Discovery error: {message}")]
    DiscoveryError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unsupported,
    GeneratedCode,
    Config,
    Discovery,
    Io,
    Internal,
}

impl DownlevelError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DownlevelError::Unsupported { .. } => ErrorKind::Unsupported,
            DownlevelError::GeneratedCode { .. } => ErrorKind::GeneratedCode,
            DownlevelError::ConfigError { .. } => ErrorKind::Config,
            DownlevelError::DiscoveryError { .. } => ErrorKind::Discovery,
            DownlevelError::IoError { .. } => ErrorKind::Io,
            DownlevelError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unsupported | ErrorKind::GeneratedCode | ErrorKind::Io
        )
    }

    /// Create an unsupported-construct error
    pub fn unsupported(pass: &'static str, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            pass,
            construct: construct.into(),
        }
    }

    /// Create an error for generated code that does not parse
    pub fn generated_code(construct: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GeneratedCode {
            construct: construct.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a discovery error
    pub fn discovery_error(message: impl Into<String>) -> Self {
        Self::DiscoveryError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for DownlevelError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_recoverability() {
        let unsupported = DownlevelError::unsupported("property-initializers", "initializer");
        assert_eq!(unsupported.kind(), ErrorKind::Unsupported);
        assert!(unsupported.is_recoverable());

        let config = DownlevelError::config_error("bad key");
        assert_eq!(config.kind(), ErrorKind::Config);
        assert!(!config.is_recoverable());

        let io: DownlevelError = std::io::Error::other("disk").into();
        assert_eq!(io.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_display() {
        let err = DownlevelError::unsupported("records", "record without name");
        assert_eq!(
            err.to_string(),
            "Unsupported construct in pass 'records': record without name"
        );
    }
}
