use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single failed attempt to load a model artifact.
#[derive(Debug, Clone)]
pub struct LoadAttempt {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for LoadAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

#[derive(Debug, Error)]
pub enum NowcastError {
    /// The request did not carry a usable reading.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Every candidate model path failed to load.
    #[error("no model could be loaded ({})", summarize(.attempts))]
    ModelLoad { attempts: Vec<LoadAttempt> },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn summarize(attempts: &[LoadAttempt]) -> String {
    if attempts.is_empty() {
        return "no candidate paths configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
