//! CLI-specific error types and exit code mapping

use xray_core::{ConfigError, DiscoveryError, ScanError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-facing message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration validation failure.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image discovery failure (kubernetes, helm, yaml).
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Scan batch failure, including cancellation.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                  |
    /// |------|--------------------------|
    /// | 0    | Success                  |
    /// | 1    | General / command error  |
    /// | 2    | Configuration error      |
    /// | 3    | Image discovery failure  |
    /// | 4    | Scan failure / cancelled |
    /// | 10   | IO error                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Discovery(_) => 3,
            Self::Scan(_) => 4,
            Self::Io(_) => 10,
            Self::Command(_) => 1,
        }
    }
}
