//! Explanation bundle data structures

use crate::types::verdict::{DetectionMethod, Probabilities};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Severity of an explanation reason.
///
/// Variant order gives `Critica > Alta > Media > Baixa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Baixa,
    Media,
    Alta,
    Critica,
}

impl Severity {
    /// Impact score shown for this severity
    pub fn impact(&self) -> u8 {
        match self {
            Severity::Critica => 95,
            Severity::Alta => 80,
            Severity::Media => 60,
            Severity::Baixa => 30,
        }
    }

    /// UI color for this severity
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Critica => "danger",
            Severity::Alta => "warning",
            Severity::Media => "medium",
            Severity::Baixa => "primary",
        }
    }

    /// Classify a validation error message by keyword.
    pub fn from_error(erro: &str) -> Self {
        let erro = erro.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| erro.contains(w));

        if contains_any(&["inválido", "incorreto", "falha crítica"]) {
            Severity::Critica
        } else if contains_any(&["dígito verificador", "código de barras"]) {
            Severity::Alta
        } else if contains_any(&["formato", "incompleto"]) {
            Severity::Media
        } else {
            Severity::Baixa
        }
    }
}

/// Confidence band (inclusive lower bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceBand {
    Baixa,
    Media,
    Alta,
    MuitoAlta,
}

impl ConfidenceBand {
    pub fn from_confidence(confianca: f64) -> Self {
        if confianca >= 0.9 {
            ConfidenceBand::MuitoAlta
        } else if confianca >= 0.75 {
            ConfidenceBand::Alta
        } else if confianca >= 0.6 {
            ConfidenceBand::Media
        } else {
            ConfidenceBand::Baixa
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::MuitoAlta => "Muito Alta",
            ConfidenceBand::Alta => "Alta",
            ConfidenceBand::Media => "Média",
            ConfidenceBand::Baixa => "Baixa",
        }
    }
}

/// Risk tier of the final recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "ALTO")]
    Alto,
    #[serde(rename = "MÉDIO-ALTO")]
    MedioAlto,
    #[serde(rename = "MÉDIO")]
    Medio,
    #[serde(rename = "BAIXO")]
    Baixo,
    #[serde(rename = "BAIXO-MÉDIO")]
    BaixoMedio,
    #[serde(rename = "INCERTO")]
    Incerto,
}

impl RiskTier {
    /// Look up the tier for a verdict and its confidence.
    pub fn classify(is_fraudulento: bool, confianca: f64) -> Self {
        match (is_fraudulento, confianca) {
            (true, c) if c >= 0.85 => RiskTier::Alto,
            (true, c) if c >= 0.65 => RiskTier::MedioAlto,
            (true, _) => RiskTier::Medio,
            (false, c) if c >= 0.85 => RiskTier::Baixo,
            (false, c) if c >= 0.65 => RiskTier::BaixoMedio,
            (false, _) => RiskTier::Incerto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Alto => "ALTO",
            RiskTier::MedioAlto => "MÉDIO-ALTO",
            RiskTier::Medio => "MÉDIO",
            RiskTier::Baixo => "BAIXO",
            RiskTier::BaixoMedio => "BAIXO-MÉDIO",
            RiskTier::Incerto => "INCERTO",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a reason came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    ValidacaoTecnica,
    MachineLearning,
    Valor,
    Geral,
}

impl ReasonCategory {
    /// Display name of the category
    pub fn display_name(&self) -> &'static str {
        match self {
            ReasonCategory::ValidacaoTecnica => "Validação Técnica",
            ReasonCategory::MachineLearning => "Análise de Padrões",
            ReasonCategory::Valor => "Análise de Valor",
            ReasonCategory::Geral => "Análise Geral",
        }
    }
}

/// One ranked reason behind the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub gravidade: Severity,
    pub categoria: ReasonCategory,
    pub categoria_nome: String,
    pub cor: String,
    pub titulo: String,
    pub descricao_simples: String,
    pub descricao_avancada: String,
    pub impacto: u8,
    pub fonte: String,
}

/// Explanation for non-technical readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleExplanation {
    pub status: String,
    /// Confidence band label
    pub confianca: String,
    pub resumo: String,
    pub principal_motivo: String,
    pub acao_recomendada: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    pub modelo_ml: String,
    /// Fraud score in percent
    pub score_fraude: f64,
    pub confianca_percentual: f64,
    pub probabilidades: Probabilities,
    pub limiar_decisao: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetrics {
    pub features_analisadas: usize,
    pub validacoes_tecnicas: usize,
    pub metodos: BTreeSet<DetectionMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    pub nome: String,
    pub valor: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDetails {
    /// True when FEBRABAN validation failed
    pub validacao_febraban: bool,
    pub erros_encontrados: Vec<String>,
    pub features_usadas: Vec<FeatureValue>,
}

/// Explanation for technical readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedExplanation {
    pub analise_tecnica: TechnicalAnalysis,
    pub metricas: AnalysisMetrics,
    pub detalhes_tecnicos: TechnicalDetails,
}

/// Final recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub nivel_risco: RiskTier,
    pub cor: String,
    pub acao_principal: String,
    pub mensagem: String,
    pub proximos_passos: Vec<String>,
}

/// Complete explanation of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationBundle {
    pub simples: SimpleExplanation,
    pub avancado: AdvancedExplanation,
    pub razoes: Vec<Reason>,
    pub recomendacao: Recommendation,
    pub gerado_em: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critica > Severity::Alta);
        assert!(Severity::Alta > Severity::Media);
        assert!(Severity::Media > Severity::Baixa);
    }

    #[test]
    fn test_severity_from_error() {
        assert_eq!(
            Severity::from_error("DV1 inválido (esperado: 3, encontrado: 4)"),
            Severity::Critica
        );
        assert_eq!(
            Severity::from_error("Primeiro dígito verificador do CNPJ inválido"),
            Severity::Critica
        );
        assert_eq!(
            Severity::from_error("Código de barras deve ter 44 dígitos (tem 40)"),
            Severity::Alta
        );
        assert_eq!(Severity::from_error("Formato inesperado"), Severity::Media);
        assert_eq!(Severity::from_error("Valor não encontrado"), Severity::Baixa);
    }

    #[test]
    fn test_severity_impact_and_color() {
        assert_eq!(Severity::Critica.impact(), 95);
        assert_eq!(Severity::Baixa.impact(), 30);
        assert_eq!(Severity::Alta.color(), "warning");
        assert_eq!(Severity::Media.color(), "medium");
    }

    #[test]
    fn test_confidence_band_bounds() {
        assert_eq!(ConfidenceBand::from_confidence(0.9), ConfidenceBand::MuitoAlta);
        assert_eq!(ConfidenceBand::from_confidence(0.75), ConfidenceBand::Alta);
        assert_eq!(ConfidenceBand::from_confidence(0.6), ConfidenceBand::Media);
        assert_eq!(ConfidenceBand::from_confidence(0.59), ConfidenceBand::Baixa);
    }

    #[test]
    fn test_risk_tier_lookup() {
        assert_eq!(RiskTier::classify(true, 0.9), RiskTier::Alto);
        assert_eq!(RiskTier::classify(true, 0.7), RiskTier::MedioAlto);
        assert_eq!(RiskTier::classify(true, 0.5), RiskTier::Medio);
        assert_eq!(RiskTier::classify(false, 0.85), RiskTier::Baixo);
        assert_eq!(RiskTier::classify(false, 0.65), RiskTier::BaixoMedio);
        assert_eq!(RiskTier::classify(false, 0.64), RiskTier::Incerto);
    }

    #[test]
    fn test_risk_tier_serializes_label() {
        let json = serde_json::to_string(&RiskTier::MedioAlto).unwrap();
        assert_eq!(json, "\"MÉDIO-ALTO\"");
        assert_eq!(RiskTier::BaixoMedio.to_string(), "BAIXO-MÉDIO");
    }
}
