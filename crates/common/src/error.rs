//! Error types shared across Dailies crates.

use std::path::PathBuf;

/// Top-level error type for Dailies operations.
#[derive(Debug, thiserror::Error)]
pub enum DailiesError {
    #[error("No frames found on disk for sequence: {pattern}")]
    SequenceNotFound { pattern: String },

    #[error("Temporary directory unavailable: environment variable {variable} is not set")]
    TempDirUnavailable { variable: String },

    #[error("Slate field '{key}' is missing; populate every field before building a slate")]
    ConfigMissingKey { key: String },

    #[error("{stage} render failed (exit code {code:?}): {stderr}")]
    RenderFailed {
        stage: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{stage} render timed out after {timeout_secs:.1}s")]
    RenderTimeout { stage: String, timeout_secs: f64 },

    #[error("{stage} render was cancelled")]
    RenderCancelled { stage: String },

    #[error("Media engine not found: {program}")]
    EngineNotFound { program: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using DailiesError.
pub type DailiesResult<T> = Result<T, DailiesError>;

impl DailiesError {
    pub fn sequence_not_found(pattern: impl Into<String>) -> Self {
        Self::SequenceNotFound {
            pattern: pattern.into(),
        }
    }

    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::ConfigMissingKey { key: key.into() }
    }

    pub fn render_failed(
        stage: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::RenderFailed {
            stage: stage.into(),
            code,
            stderr: stderr.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_names_the_field() {
        let err = DailiesError::missing_key("shot_name");
        assert!(err.to_string().contains("'shot_name'"));
    }

    #[test]
    fn test_render_failed_names_stage_and_code() {
        let err = DailiesError::render_failed("slate", Some(1), "No such filter: 'drawtxt'");
        let message = err.to_string();
        assert!(message.starts_with("slate render failed"));
        assert!(message.contains("Some(1)"));
        assert!(message.contains("drawtxt"));
    }
}
