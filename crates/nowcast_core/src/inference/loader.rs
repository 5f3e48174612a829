use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::onnx::OnnxForecaster;
use crate::error::{LoadAttempt, NowcastError};

/// Model locations tried when nothing is configured. Relative paths differ
/// depending on whether the service is started from the repo root or a
/// subdirectory, so both are searched.
pub const DEFAULT_CANDIDATES: [&str; 2] = [
    "../models/02-hour_min-sigmoid.onnx",
    "./models/02-hour_min-sigmoid.onnx",
];

pub fn default_candidates() -> Vec<PathBuf> {
    DEFAULT_CANDIDATES.iter().map(PathBuf::from).collect()
}

/// Tries `load` on each candidate in order and returns the first success
/// together with the (absolute, when resolvable) path it came from.
pub fn load_first<T, F>(candidates: &[PathBuf], mut load: F) -> Result<(PathBuf, T), NowcastError>
where
    F: FnMut(&Path) -> anyhow::Result<T>,
{
    let mut attempts = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let path = std::path::absolute(candidate).unwrap_or_else(|_| candidate.clone());
        match load(&path) {
            Ok(model) => {
                info!(path = %path.display(), "Model loaded");
                return Ok((path, model));
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(path = %path.display(), error = %reason, "Model candidate failed");
                attempts.push(LoadAttempt { path, reason });
            }
        }
    }

    Err(NowcastError::ModelLoad { attempts })
}

/// Loads the first candidate that parses as an ONNX model.
pub fn resolve_model(candidates: &[PathBuf]) -> Result<(PathBuf, OnnxForecaster), NowcastError> {
    load_first(candidates, |path| OnnxForecaster::load(path))
}
