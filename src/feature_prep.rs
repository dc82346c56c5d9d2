//! Feature preparation for boleto classifier inference.
//!
//! This module builds the feature vector the classifier was trained on
//! from the extracted boleto fields.

use crate::types::boleto::ExtractedFields;

/// Number of features the classifier expects.
pub const FEATURE_COUNT: usize = 7;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "banco",
    "codigoBanco",
    "agencia",
    "valor",
    "linha_codBanco",
    "linha_moeda",
    "linha_valor",
];

/// Turns extracted fields into classifier input features.
///
/// Features are produced in the exact order expected by the model. Missing
/// or unparseable fields contribute 0.
pub struct FeaturePrep;

impl FeaturePrep {
    /// Create a new feature preparer.
    pub fn new() -> Self {
        Self
    }

    /// Build the feature vector for a boleto.
    pub fn prepare(&self, fields: &ExtractedFields) -> Vec<f32> {
        let mut features = Vec::with_capacity(FEATURE_COUNT);

        // Bank code is fed twice: the training set carried it as both
        // `banco` and `codigoBanco`.
        let banco = fields
            .codigo_banco
            .as_deref()
            .and_then(|code| code.parse::<u32>().ok())
            .unwrap_or(0) as f32;
        features.push(banco);
        features.push(banco);

        features.push(parse_agencia(fields.agencia.as_deref()) as f32);

        features.push(fields.valor.unwrap_or(0.0) as f32);

        // Linha digitável derived features
        let linha = fields.linha_digits().unwrap_or_default();
        features.push(digits_to_u64(linha.get(0..3)) as f32);
        features.push(digits_to_u64(linha.get(3..4)) as f32);
        // Last 10 digits: amount in cents
        features.push(digits_to_u64(linha.get(37..47)) as f32);

        features
    }

    /// Pair each feature with its name.
    pub fn named(&self, features: &[f32]) -> Vec<(String, f32)> {
        FEATURE_NAMES
            .iter()
            .zip(features)
            .map(|(name, &value)| (name.to_string(), value))
            .collect()
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names (matching training order).
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

impl Default for FeaturePrep {
    fn default() -> Self {
        Self::new()
    }
}

/// Agency number before any check-digit hyphen (`1234-5` -> 1234).
fn parse_agencia(agencia: Option<&str>) -> u32 {
    agencia
        .and_then(|raw| raw.split('-').next())
        .and_then(|number| number.trim().parse().ok())
        .unwrap_or(0)
}

fn digits_to_u64(digits: Option<&str>) -> u64 {
    digits.and_then(|d| d.parse().ok()).unwrap_or(0)
}
