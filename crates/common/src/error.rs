//! Error types shared across Clipcast crates.

/// Top-level error type for Clipcast operations that are not edit or
/// export failures (configuration, I/O, missing tooling).
#[derive(Debug, thiserror::Error)]
pub enum ClipcastError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ClipcastError.
pub type ClipcastResult<T> = Result<T, ClipcastError>;

impl ClipcastError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}

/// The external transcoding engine rejected or failed a job.
///
/// `diagnostic` is the engine's own output, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Transcode failed{}: {diagnostic}", status.map(|s| format!(" (exit status {s})")).unwrap_or_default())]
pub struct TranscodeError {
    /// Engine diagnostic text, verbatim.
    pub diagnostic: String,
    /// Process exit status when the engine is a child process.
    pub status: Option<i32>,
}

impl TranscodeError {
    pub fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
            status: None,
        }
    }

    pub fn with_status(diagnostic: impl Into<String>, status: Option<i32>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
            status,
        }
    }
}

/// A second export was requested while one is still in flight for the
/// same timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("An export is already in progress for this timeline")]
pub struct ConcurrentExportError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_error_keeps_diagnostic_verbatim() {
        let diag = "[Parsed_crop_1 @ 0x55] Invalid too big or non positive size for width '0'";
        let err = TranscodeError::with_status(diag, Some(1));
        assert_eq!(err.diagnostic, diag);
        let rendered = err.to_string();
        assert!(rendered.contains("exit status 1"));
        assert!(rendered.ends_with(diag));
    }

    #[test]
    fn test_transcode_error_without_status() {
        let err = TranscodeError::new("engine crashed");
        assert_eq!(err.to_string(), "Transcode failed: engine crashed");
    }
}
