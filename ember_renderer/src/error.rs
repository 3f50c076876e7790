//! Error types for the Ember renderer.
//!
//! Construction-time failures (shader builds, texture uploads) are fatal to
//! the failed operation and surfaced immediately through [`Error`].
//! Per-frame uniform failures use the lighter
//! [`UniformError`](crate::shader::UniformError) codes instead, so a draw
//! loop can skip one call and keep going.

use std::fmt;

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Renderer errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid shader/mesh/texture/light handle
    ResourceNotFound(String),

    /// Descriptor or uniform validation failed at creation time
    Validation(String),

    /// Shader stage compilation or program link failed (carries the driver log)
    CompileOrLink(String),

    /// Geometry buffer append would overflow the preallocated capacity
    CapacityExceeded(String),

    /// Backend/device failure
    Backend(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ResourceNotFound(msg) => write!(f, "Resource not found: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::CompileOrLink(msg) => write!(f, "Shader build error: {}", msg),
            Error::CapacityExceeded(msg) => write!(f, "Capacity exceeded: {}", msg),
            Error::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Build an [`Error`] of the given kind and log it at ERROR severity.
///
/// # Example
///
/// ```ignore
/// return Err(render_err!("ember::Renderer", Validation, "bad stride {}", stride));
/// ```
#[macro_export]
macro_rules! render_err {
    ($source:expr, $kind:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::render_error!($source, "{}", message);
        $crate::Error::$kind(message)
    }};
}

/// Log an [`Error`] of the given kind and return it from the enclosing function.
#[macro_export]
macro_rules! render_bail {
    ($source:expr, $kind:ident, $($arg:tt)*) => {
        return Err($crate::render_err!($source, $kind, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
