//! Core of the nowcast prediction service.
//!
//! Readings are recorded as [`Sample`]s in an append-only [`History`]. Once the
//! history holds [`LOOKBACK`] samples, the newest ones form a [`LookbackWindow`]
//! which a [`Forecaster`] turns into a single scalar prediction.

pub mod error;
pub mod history;
pub mod inference;
pub mod sample;
pub mod window;

pub use error::{LoadAttempt, NowcastError};
pub use history::History;
pub use inference::loader::{default_candidates, load_first, resolve_model};
pub use inference::onnx::OnnxForecaster;
pub use inference::Forecaster;
pub use sample::Sample;
pub use window::LookbackWindow;

/// Number of most recent samples fed to the model.
pub const LOOKBACK: usize = 50;

/// Features recorded per sample: value, hour, minute.
pub const FEATURES: usize = 3;
