//! Error types for SwitchTester

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using SwitchTester Error
pub type Result<T> = std::result::Result<T, Error>;

/// SwitchTester error types
///
/// None of these are recovered from inside the library. Every variant ends
/// the run that produced it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// One or more required keys are absent from a config, target or profile.
    #[error("{context}: Missing necessary keys: {}", missing.join(", "))]
    Configuration {
        context: String,
        missing: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{kind} {} not found", path.display())]
    NotFound { kind: String, path: PathBuf },

    /// Raw tester output that does not follow the expected line grammar.
    #[error("Malformed report at line {line}: {reason}: {content:?}")]
    MalformedReport {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("External process error: {0}")]
    ExternalProcess(String),
}

impl Error {
    pub fn configuration(context: impl Into<String>, missing: Vec<String>) -> Self {
        Error::Configuration {
            context: context.into(),
            missing,
        }
    }

    pub fn not_found(kind: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            path: path.into(),
        }
    }

    pub fn malformed(line: usize, content: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedReport {
            line,
            content: content.into(),
            reason: reason.into(),
        }
    }
}
