//! Fusion of FEBRABAN validation with the classifier verdict

use crate::types::verdict::{ClassifierVerdict, DetectionMethod, FusedVerdict, ValidationResult};
use std::collections::BTreeSet;
use tracing::info;

/// Combines the deterministic validation with the classifier.
///
/// A boleto is fraudulent when either signal says so. Score and confidence
/// always come from the classifier.
pub struct ScoreFusion;

impl ScoreFusion {
    /// Create a new fusion stage.
    pub fn new() -> Self {
        Self
    }

    /// Fuse a validation result with a classifier verdict.
    pub fn fuse(&self, validation: &ValidationResult, modelo: ClassifierVerdict) -> FusedVerdict {
        let mut metodos = BTreeSet::new();
        if !validation.valido {
            metodos.insert(DetectionMethod::ValidacaoFebraban);
        }
        if modelo.is_fraudulento {
            metodos.insert(DetectionMethod::ModeloMl);
        }

        let motivos = if validation.valido {
            Vec::new()
        } else {
            validation.erros.clone()
        };

        let fused = FusedVerdict {
            is_fraudulento: !metodos.is_empty(),
            score: modelo.score_fraude,
            confianca: modelo.confianca,
            metodos,
            motivos,
            modelo,
        };

        info!(
            is_fraudulento = fused.is_fraudulento,
            score = fused.score,
            confianca = fused.confianca,
            metodos = ?fused.metodos.iter().map(DetectionMethod::as_str).collect::<Vec<_>>(),
            "Fraud verdict"
        );

        fused
    }
}

impl Default for ScoreFusion {
    fn default() -> Self {
        Self::new()
    }
}
