//! Error types for host metrics collection.
//!
//! Collection is best-effort telemetry: there is exactly one error kind, and
//! it is always recoverable. A failed read leaves the previously cached
//! sample in place; it never aborts the host process.

use thiserror::Error;

/// Host metrics error type.
#[derive(Debug, Error)]
pub enum StatError {
    /// The underlying OS facility could not supply fresh data
    /// (file missing, parse mismatch, stat library error).
    #[error("stat read failed: {0}")]
    ReadFailure(String),
}

/// Result type alias using `StatError`
pub type Result<T> = std::result::Result<T, StatError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        let err = StatError::ReadFailure("/proc/stat: permission denied".to_string());
        assert_eq!(
            format!("{err}"),
            "stat read failed: /proc/stat: permission denied"
        );
    }
}
