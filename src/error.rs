//! Unified error types for chatmood.
//!
//! This module provides a single [`ChatmoodError`] enum that covers every
//! failure the pipeline can report.
//!
//! # What is *not* an error
//!
//! - A message container without a text element is skipped during extraction.
//! - A timestamp that does not parse as a date lands in the
//!   [`DateBucket::Unparsed`](crate::aggregate::DateBucket::Unparsed) bucket.
//! - An empty export flows through to empty aggregates and blank charts.
//!
//! Model loading failures ([`ChatmoodError::ResourceInit`]) are fatal: the
//! pipeline stops before writing any artifact.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chatmood operations.
///
/// # Example
///
/// ```rust
/// use chatmood::error::Result;
/// use chatmood::Message;
///
/// fn my_function() -> Result<Vec<Message>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatmoodError>;

/// The error type for all chatmood operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatmoodError {
    /// An I/O error occurred.
    ///
    /// This typically happens when:
    /// - The export file doesn't exist
    /// - Permission denied on the chart or export directory
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// CSV writing error (tabular export).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error (chart specs, model configs).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or unreadable configuration.
    #[error("Invalid configuration{}: {message}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Config {
        /// The config file, if the error came from one
        path: Option<PathBuf>,
        /// Description of what's wrong
        message: String,
    },

    /// A classifier resource (model weights, tokenizer) could not be loaded.
    ///
    /// Fatal for the pipeline; there is no fallback classification.
    #[error("Failed to initialize {resource}: {message}")]
    ResourceInit {
        /// Which resource failed, e.g. "sentiment model"
        resource: &'static str,
        /// Underlying cause
        message: String,
    },

    /// A loaded model failed while scoring a text.
    #[error("Inference failed: {message}")]
    Inference {
        /// Underlying cause
        message: String,
    },

    /// The model produced a class index that the label table doesn't cover.
    #[error("Class index {index} is outside the sentiment label table ({labels} labels)")]
    UnknownClassIndex {
        /// Arg-max index returned by the model
        index: usize,
        /// Number of configured labels
        labels: usize,
    },

    /// Topic classification was requested with no candidate topics.
    #[error("Topic classification requires at least one candidate topic")]
    NoCandidates,
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatmoodError {
    /// Creates a resource initialization error.
    pub fn resource_init(resource: &'static str, message: impl Into<String>) -> Self {
        ChatmoodError::ResourceInit {
            resource,
            message: message.into(),
        }
    }

    /// Creates an inference error.
    pub fn inference(message: impl Into<String>) -> Self {
        ChatmoodError::Inference {
            message: message.into(),
        }
    }

    /// Creates a configuration error not tied to a file.
    pub fn config(message: impl Into<String>) -> Self {
        ChatmoodError::Config {
            path: None,
            message: message.into(),
        }
    }

    /// Creates a configuration error for a specific file.
    pub fn config_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ChatmoodError::Config {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatmoodError::Io(_))
    }

    /// Returns `true` if this is a resource initialization error.
    pub fn is_resource_init(&self) -> bool {
        matches!(self, ChatmoodError::ResourceInit { .. })
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, ChatmoodError::Config { .. })
    }
}

#[cfg(feature = "candle")]
impl From<candle_core::Error> for ChatmoodError {
    fn from(err: candle_core::Error) -> Self {
        ChatmoodError::inference(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
