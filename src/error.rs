//! Error types for filter construction and installation.

use std::io;
use thiserror::Error;

/// Result type for sysfence operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is reported synchronously by the call that hit it. None
/// of them are retried.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown syscall '{0}' for this architecture")]
    UnknownSyscall(String),

    #[error("seccomp filtering not available: {0}")]
    UnsupportedFeature(String),

    #[error("Invalid filter program: {0}")]
    InvalidProgram(String),

    #[error("Failed to set PR_SET_NO_NEW_PRIVS: {0}")]
    PermissionNarrowingFailed(#[source] nix::Error),

    #[error("Failed to register SIGSYS reporter: {0}")]
    HandlerRegistrationFailed(#[source] nix::Error),

    #[error("Installer steps out of order: {0}")]
    OutOfOrder(String),

    #[error("Invalid policy: {0}")]
    Policy(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
