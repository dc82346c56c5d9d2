//! Classifier boundary for boleto fraud detection
//!
//! The classifier is an external artifact consumed as a scoring function:
//! seven features in, predicted class and class probabilities out. Class 0
//! means the boleto is fake and class 1 that it is authentic.

use crate::error::ContractViolation;
use crate::feature_prep::{FeaturePrep, FEATURE_COUNT};
use crate::types::boleto::ExtractedFields;
use crate::types::verdict::{ClassifierVerdict, Probabilities};
use std::sync::Arc;
use tracing::{debug, info};

/// Raw answer of a classifier for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOutput {
    /// Predicted class: 0 = fake, 1 = authentic
    pub classe: i64,
    /// `[P(class 0), P(class 1)]`
    pub probabilidades: [f64; 2],
}

/// A loaded classifier.
///
/// Implementations are loaded once per process and shared read-only
/// between concurrent pipeline invocations.
pub trait Classifier: Send + Sync {
    /// Model name reported in explanations
    fn name(&self) -> &str;

    /// Score one feature vector.
    fn score(&self, features: &[f32]) -> Result<ClassifierOutput, ContractViolation>;
}

impl ClassifierVerdict {
    /// Build a verdict from a classifier output, enforcing the output contract.
    pub fn from_output(
        modelo: &str,
        output: ClassifierOutput,
        features_usadas: Vec<(String, f32)>,
    ) -> Result<Self, ContractViolation> {
        let classe_predita = match output.classe {
            0 => 0u8,
            1 => 1u8,
            other => return Err(ContractViolation::UnknownClass(other)),
        };

        for (class, &value) in output.probabilidades.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ContractViolation::InvalidProbability { class, value });
            }
        }

        let [falso, verdadeiro] = output.probabilidades;

        Ok(Self {
            modelo: modelo.to_string(),
            is_fraudulento: classe_predita == 0,
            classe_predita,
            score_fraude: (falso * 100.0).round() as u8,
            confianca: falso.max(verdadeiro),
            probabilidades: Probabilities { falso, verdadeiro },
            features_usadas,
        })
    }
}

/// Runs the injected classifier over extracted boleto fields.
pub struct InferenceEngine {
    /// Shared classifier handle
    classifier: Arc<dyn Classifier>,
    /// Feature preparation for the classifier input
    feature_prep: FeaturePrep,
}

impl InferenceEngine {
    /// Create an inference engine around a loaded classifier
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        info!(model = %classifier.name(), "Inference engine initialized");
        Self {
            classifier,
            feature_prep: FeaturePrep::new(),
        }
    }

    /// Name of the wrapped classifier
    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    /// Prepare features for the fields and score them
    pub fn predict(&self, fields: &ExtractedFields) -> Result<ClassifierVerdict, ContractViolation> {
        let features = self.feature_prep.prepare(fields);
        self.predict_features(&features)
    }

    /// Score an already prepared feature vector
    pub fn predict_features(&self, features: &[f32]) -> Result<ClassifierVerdict, ContractViolation> {
        if features.len() != FEATURE_COUNT {
            return Err(ContractViolation::FeatureLength {
                expected: FEATURE_COUNT,
                actual: features.len(),
            });
        }

        let output = self.classifier.score(features)?;
        let verdict = ClassifierVerdict::from_output(
            self.classifier.name(),
            output,
            self.feature_prep.named(features),
        )?;

        debug!(
            model = %verdict.modelo,
            classe = verdict.classe_predita,
            score_fraude = verdict.score_fraude,
            confianca = verdict.confianca,
            "Classifier verdict"
        );

        Ok(verdict)
    }
}

/// Classifier returning a fixed answer, for tests.
#[cfg(test)]
pub(crate) struct StubClassifier {
    pub output: ClassifierOutput,
}

#[cfg(test)]
impl StubClassifier {
    pub fn new(classe: i64, p_falso: f64, p_verdadeiro: f64) -> Self {
        Self {
            output: ClassifierOutput {
                classe,
                probabilidades: [p_falso, p_verdadeiro],
            },
        }
    }
}

#[cfg(test)]
impl Classifier for StubClassifier {
    fn name(&self) -> &str {
        "stub"
    }

    fn score(&self, features: &[f32]) -> Result<ClassifierOutput, ContractViolation> {
        assert_eq!(features.len(), FEATURE_COUNT);
        Ok(self.output)
    }
}
