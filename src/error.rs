//! Error types for the Hydra render engine
//!
//! This module defines the error taxonomy used throughout the engine:
//! material variable contract violations, shader compilation failures,
//! missing named resources and device-level faults.

use std::fmt;

/// Result type for Hydra engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Hydra engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A material variable was re-set with a different type than first established
    TypeMismatch(String),

    /// A material variable was re-set with a different byte size than first established
    SizeMismatch(String),

    /// A shader stage (or a whole technique) failed to compile
    CompileFailure(String),

    /// A render target, sampler or texture-layout channel looked up by name was not found
    MissingResource(String),

    /// Backend/device-specific error
    BackendError(String),

    /// Initialization failed (stage construction, device setup)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            Error::SizeMismatch(msg) => write!(f, "Size mismatch: {}", msg),
            Error::CompileFailure(msg) => write!(f, "Compile failure: {}", msg),
            Error::MissingResource(msg) => write!(f, "Missing resource: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Build a logged `Error::BackendError` without returning
///
/// Logs the message through the engine logger and evaluates to the error
/// value, for use inside `ok_or_else` / `map_err` closures.
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $crate::engine_error!($source, "{}", msg);
        $crate::hydra::Error::BackendError(msg)
    }};
}

/// Log and return early with an `Error::BackendError`
///
/// The `bail` counterpart of `engine_err!` for functions returning
/// `crate::error::Result`.
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
