//! ONNX classifier loader

use crate::error::ContractViolation;
use crate::models::inference::{Classifier, ClassifierOutput};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Loader for ONNX classifiers
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a classifier exported from scikit-learn
    pub fn load_classifier<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<OnnxClassifier> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        // Class polarity depends on the training labels; log what was bound
        // so a swapped artifact is visible at startup.
        info!(
            model = %name,
            input = %input_name,
            label = ?label_output,
            probabilities = %probability_output,
            "Model loaded, class 0 = fake, class 1 = authentic"
        );

        Ok(OnnxClassifier {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}

/// Classifier backed by an ONNX Runtime session.
pub struct OnnxClassifier {
    name: String,
    /// Running a session needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    label_output: Option<String>,
    probability_output: String,
}

impl OnnxClassifier {
    fn run(&self, features: &[f32]) -> Result<ClassifierOutput> {
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let probabilidades = self.extract_probabilities(&outputs)?;
        let classe = match self.extract_label(&outputs) {
            Some(label) => label,
            None => {
                // No label output: take the most likely class
                if probabilidades[0] > probabilidades[1] {
                    0
                } else {
                    1
                }
            }
        };

        debug!(model = %self.name, classe, p0 = probabilidades[0], p1 = probabilidades[1], "ONNX inference complete");

        Ok(ClassifierOutput {
            classe,
            probabilidades,
        })
    }

    /// Read the predicted label, if the model exports one
    fn extract_label(&self, outputs: &SessionOutputs) -> Option<i64> {
        let output = outputs.get(self.label_output.as_deref()?)?;
        match output.try_extract_tensor::<i64>() {
            Ok((_, data)) => data.first().copied(),
            Err(e) => {
                warn!(model = %self.name, error = %e, "Label output is not an int64 tensor");
                None
            }
        }
    }

    /// Read `[P(class 0), P(class 1)]` from tensor or seq(map) outputs
    fn extract_probabilities(&self, outputs: &SessionOutputs) -> Result<[f64; 2]> {
        let output = outputs
            .get(self.probability_output.as_str())
            .ok_or_else(|| anyhow::anyhow!("Output '{}' missing", self.probability_output))?;

        let dtype = output.dtype();

        // Tensor format: [1, 2] or [2]
        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            if data.len() >= 2 {
                return Ok([data[0] as f64, data[1] as f64]);
            }
            anyhow::bail!("Probability tensor has {} values, expected 2", data.len());
        }

        // ZipMap format: seq(map(int64, float))
        if DynSequenceValueType::can_downcast(&dtype) {
            return self.extract_from_sequence_map(output);
        }

        anyhow::bail!("Unsupported probability output type: {:?}", dtype)
    }

    /// Extract class probabilities from seq(map(int64, float))
    fn extract_from_sequence_map(&self, output: &DynValue) -> Result<[f64; 2]> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        let map_value = maps
            .first()
            .ok_or_else(|| anyhow::anyhow!("Empty sequence"))?;

        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        let probability_of = |class: i64| {
            kv_pairs
                .iter()
                .find(|(class_id, _)| *class_id == class)
                .map(|(_, prob)| *prob as f64)
        };

        match (probability_of(0), probability_of(1)) {
            (Some(p0), Some(p1)) => Ok([p0, p1]),
            (Some(p0), None) => Ok([p0, 1.0 - p0]),
            (None, Some(p1)) => Ok([1.0 - p1, p1]),
            (None, None) => Err(anyhow::anyhow!("No probability found in map")),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, features: &[f32]) -> Result<ClassifierOutput, ContractViolation> {
        self.run(features).map_err(|e| ContractViolation::Scorer {
            model: self.name.clone(),
            message: format!("{:#}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let loader = ModelLoader::default();
        let result = loader.load_classifier("does/not/exist.onnx", "missing");
        assert!(result.is_err());
    }
}
