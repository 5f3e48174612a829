use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::Forecaster;
use crate::error::NowcastError;
use crate::window::LookbackWindow;

/// Sequence model executed with tract.
///
/// The model takes a `[1, LOOKBACK, FEATURES]` f32 tensor and its first
/// output element is the prediction.
pub struct OnnxForecaster {
    #[allow(clippy::type_complexity)]
    model: tract_onnx::prelude::SimplePlan<
        tract_onnx::prelude::TypedFact,
        Box<dyn tract_onnx::prelude::TypedOp>,
        tract_onnx::prelude::Graph<
            tract_onnx::prelude::TypedFact,
            Box<dyn tract_onnx::prelude::TypedOp>,
        >,
    >,
    path: PathBuf,
}

impl OnnxForecaster {
    /// Loads and optimizes an ONNX model, pinning its input to the window shape.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        use tract_onnx::prelude::*;

        let path = path.as_ref();
        anyhow::ensure!(path.is_file(), "model file not found");

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .context("Failed to load ONNX model")?
            .with_input_fact(0, f32::fact(LookbackWindow::SHAPE).into())
            .context("Failed to set input fact")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;

        Ok(Self {
            model,
            path: path.to_path_buf(),
        })
    }

    /// Where the model was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, window: &LookbackWindow) -> Result<f64> {
        use tract_onnx::prelude::*;

        let [batch, steps, features] = LookbackWindow::SHAPE;
        let input =
            tract_ndarray::Array3::from_shape_vec((batch, steps, features), window.to_input())
                .context("Failed to create input array")?;
        let input_tensor: Tensor = input.into();

        let result = self
            .model
            .run(tvec![input_tensor.into()])
            .context("Failed to run inference")?;

        let output = result
            .first()
            .context("Model produced no outputs")?
            .cast_to::<f32>()
            .context("Failed to read output as f32")?;
        let value = output
            .as_slice::<f32>()
            .context("Failed to extract output")?
            .first()
            .copied()
            .context("Model output is empty")?;

        Ok(value as f64)
    }
}

impl Forecaster for OnnxForecaster {
    fn forecast(&self, window: &LookbackWindow) -> Result<f64, NowcastError> {
        self.run(window)
            .map_err(|e| NowcastError::Inference(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::LOOKBACK;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    #[test]
    fn test_missing_file() {
        let err = OnnxForecaster::load("definitely/not/here.onnx").err().unwrap();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_rejects_garbage_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"this is not a protobuf model")?;
        assert!(OnnxForecaster::load(file.path()).is_err());
        Ok(())
    }

    fn window_at(hour: u32, minute: u32, value: impl Fn(usize) -> f64) -> LookbackWindow {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap();
        let samples = (0..LOOKBACK).map(|i| Sample::at(value(i), at)).collect();
        LookbackWindow::new(samples).unwrap()
    }

    fn fixture() -> PathBuf {
        // ReduceMean over the time axis: [1, 50, 3] -> [1, 1, 3]
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push("assets/lookback_mean.onnx");
        d
    }

    #[test]
    fn test_inference() -> Result<()> {
        let forecaster = OnnxForecaster::load(fixture())?;
        assert_eq!(forecaster.path(), fixture().as_path());

        // First output element is the mean of the value feature, not hour or minute
        let prediction = forecaster.forecast(&window_at(10, 20, |i| i as f64))?;
        assert!((prediction - 24.5).abs() < 1e-4, "got {prediction}");

        let prediction = forecaster.forecast(&window_at(7, 45, |_| 3.0))?;
        assert!((prediction - 3.0).abs() < 1e-4, "got {prediction}");

        Ok(())
    }

    #[test]
    fn test_resolve_falls_back_to_loadable_model() {
        let candidates = vec![PathBuf::from("missing/primary.onnx"), fixture()];
        let (path, forecaster) = crate::resolve_model(&candidates).unwrap();

        assert_eq!(path, fixture());
        let prediction = forecaster.forecast(&window_at(0, 0, |i| (i % 2) as f64)).unwrap();
        assert!((prediction - 0.5).abs() < 1e-4, "got {prediction}");
    }
}
