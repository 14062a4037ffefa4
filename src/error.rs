use std::path::{Path, PathBuf};

/// Errors raised while auditing a directory of binaries.
///
/// Every variant is fatal for the operation that produced it: a dependency
/// report built from partially understood input is never returned.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The dump text does not follow the expected preamble/section layout.
    #[error("malformed dump of {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    /// The inspection tool could not be run or exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    /// A node reappeared on its own ancestor path while rendering.
    #[error("dependency cycle: {0}")]
    Cycle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuditError {
    pub fn format(path: &Path, message: impl Into<String>) -> Self {
        AuditError::Format {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        AuditError::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
