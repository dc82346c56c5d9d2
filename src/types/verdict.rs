//! Validation and fraud verdict data structures

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one field check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub valido: bool,
    pub erros: Vec<String>,
}

impl FieldCheck {
    /// A passing check.
    pub fn ok() -> Self {
        Self {
            valido: true,
            erros: Vec::new(),
        }
    }

    /// Build a check from the errors it produced.
    pub fn from_errors(erros: Vec<String>) -> Self {
        Self {
            valido: erros.is_empty(),
            erros,
        }
    }

    /// A check failed with a single error.
    pub fn failed(erro: impl Into<String>) -> Self {
        Self::from_errors(vec![erro.into()])
    }
}

/// Result of FEBRABAN validation over a set of extracted fields.
///
/// `valido` is always `erros.is_empty()`; errors keep the order in which the
/// checks ran and are never deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valido: bool,
    pub erros: Vec<String>,
    /// Per-field check detail, keyed by field name
    #[serde(default)]
    pub detalhes: BTreeMap<String, FieldCheck>,
}

impl ValidationResult {
    /// Fold an ordered sequence of checks into one result.
    ///
    /// Entries without a field name only contribute errors (missing fields).
    pub fn combine<I>(checks: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'static str>, FieldCheck)>,
    {
        let (erros, detalhes) = checks.into_iter().fold(
            (Vec::new(), BTreeMap::new()),
            |(mut erros, mut detalhes), (field, check)| {
                erros.extend(check.erros.iter().cloned());
                if let Some(field) = field {
                    detalhes.insert(field.to_string(), check);
                }
                (erros, detalhes)
            },
        );

        Self {
            valido: erros.is_empty(),
            erros,
            detalhes,
        }
    }
}

/// Class probabilities reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    /// P(class 0): the boleto is fake
    pub falso: f64,
    /// P(class 1): the boleto is authentic
    pub verdadeiro: f64,
}

/// Verdict of the external classifier after the contract checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    /// Name of the model that produced the verdict
    pub modelo: String,
    /// True iff the predicted class is 0
    pub is_fraudulento: bool,
    pub classe_predita: u8,
    /// `round(P(class 0) * 100)`
    pub score_fraude: u8,
    /// `max(P0, P1)`
    pub confianca: f64,
    pub probabilidades: Probabilities,
    /// Feature values the model was scored on, in model order
    pub features_usadas: Vec<(String, f32)>,
}

impl ClassifierVerdict {
    /// Fraud probability on a 0..1 scale.
    pub fn fraud_probability(&self) -> f64 {
        f64::from(self.score_fraude) / 100.0
    }
}

/// Signal that flagged a boleto as fraudulent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ValidacaoFebraban,
    ModeloMl,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::ValidacaoFebraban => "validacao_febraban",
            DetectionMethod::ModeloMl => "modelo_ml",
        }
    }
}

/// Fraud determination combining FEBRABAN validation with the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedVerdict {
    pub is_fraudulento: bool,
    /// Fraud score 0..100
    pub score: u8,
    pub confianca: f64,
    pub metodos: BTreeSet<DetectionMethod>,
    /// Validation errors when the boleto failed validation
    pub motivos: Vec<String>,
    /// Classifier verdict the fusion was computed from
    pub modelo: ClassifierVerdict,
}

impl FusedVerdict {
    /// Fraud probability on a 0..1 scale.
    pub fn fraud_probability(&self) -> f64 {
        f64::from(self.score) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_keeps_order_and_duplicates() {
        let result = ValidationResult::combine(vec![
            (Some("linha_digitavel"), FieldCheck::failed("DV1 inválido")),
            (None, FieldCheck::failed("Valor não encontrado")),
            (Some("cnpj"), FieldCheck::failed("DV1 inválido")),
            (Some("banco"), FieldCheck::ok()),
        ]);

        assert!(!result.valido);
        assert_eq!(
            result.erros,
            vec!["DV1 inválido", "Valor não encontrado", "DV1 inválido"]
        );
        assert_eq!(result.detalhes.len(), 3);
        assert!(result.detalhes["banco"].valido);
    }

    #[test]
    fn test_combine_empty_is_valid() {
        let result = ValidationResult::combine(Vec::new());
        assert!(result.valido);
        assert!(result.erros.is_empty());
    }

    #[test]
    fn test_detection_method_serialization() {
        let methods: BTreeSet<_> = [DetectionMethod::ModeloMl, DetectionMethod::ValidacaoFebraban]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&methods).unwrap();
        assert_eq!(json, r#"["validacao_febraban","modelo_ml"]"#);
    }
}
