//! Classifier inference and score fusion components

pub mod fusion;
pub mod inference;
#[cfg(feature = "onnx")]
pub mod loader;

pub use fusion::ScoreFusion;
pub use inference::{Classifier, ClassifierOutput, InferenceEngine};
#[cfg(feature = "onnx")]
pub use loader::{ModelLoader, OnnxClassifier};
