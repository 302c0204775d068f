//! Error types for the phase tracer
//!
//! The tracer is a pass-through layer: failures of the wrapped work are
//! carried unchanged, and tagging failures are reported separately so the
//! caller can tell the two apart.

use thiserror::Error;

use crate::phase::Phase;

/// Failure of a traced phase.
#[derive(Error, Debug)]
pub enum PhaseError<E> {
    /// The wrapped work failed. The engine's error is carried unchanged.
    #[error("{0}")]
    Work(E),

    /// A tag policy failed while preparing the span. The work did not run.
    #[error("tagging {phase} span failed: {source}")]
    Tagging {
        phase: Phase,
        #[source]
        source: TagError,
    },
}

impl<E> PhaseError<E> {
    /// The engine's error, if the work itself failed.
    pub fn into_work(self) -> Option<E> {
        match self {
            PhaseError::Work(err) => Some(err),
            PhaseError::Tagging { .. } => None,
        }
    }

    pub fn work(&self) -> Option<&E> {
        match self {
            PhaseError::Work(err) => Some(err),
            PhaseError::Tagging { .. } => None,
        }
    }

    pub fn is_tagging(&self) -> bool {
        matches!(self, PhaseError::Tagging { .. })
    }
}

impl<E> From<E> for PhaseError<E> {
    fn from(err: E) -> Self {
        PhaseError::Work(err)
    }
}

/// A tag policy or callback failed.
#[derive(Error, Debug)]
#[error("tag policy `{policy}` failed: {source}")]
pub struct TagError {
    pub policy: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl TagError {
    pub fn new(
        policy: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            policy: policy.into(),
            source: source.into(),
        }
    }
}

/// Result type for tag policies
pub type TagResult<T> = Result<T, TagError>;

/// Configuration loading or validation error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No span recorder configured")]
    MissingRecorder,
}

/// A multiplex must contain at least one operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("multiplex must contain at least one operation")]
pub struct EmptyMultiplex;
