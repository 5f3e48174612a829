pub mod loader;
pub mod onnx;

use crate::error::NowcastError;
use crate::window::LookbackWindow;

/// Anything that can turn a lookback window into a scalar forecast.
///
/// Implementations are shared read-only between request handlers, so they
/// must not need `&mut self` to predict.
pub trait Forecaster: Send + Sync {
    fn forecast(&self, window: &LookbackWindow) -> Result<f64, NowcastError>;
}
