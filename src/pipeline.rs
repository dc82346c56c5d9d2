//! End-to-end boleto analysis
//!
//! Runs extraction, FEBRABAN validation, classifier scoring, fusion and
//! explanation over one OCR text. Every stage is synchronous and pure apart
//! from the classifier call, so one pipeline can be shared across tasks.

use crate::config::PolicyConfig;
use crate::error::Result;
use crate::explainer::ExplanationEngine;
use crate::extractor::FieldExtractor;
use crate::models::fusion::ScoreFusion;
use crate::models::inference::{Classifier, InferenceEngine};
use crate::types::report::AnalysisReport;
use crate::validator::FebrabanValidator;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Boleto fraud analysis pipeline.
pub struct BoletoPipeline {
    extractor: FieldExtractor,
    validator: FebrabanValidator,
    inference: InferenceEngine,
    fusion: ScoreFusion,
    explainer: ExplanationEngine,
}

impl BoletoPipeline {
    /// Build a pipeline around a loaded classifier.
    pub fn new(classifier: Arc<dyn Classifier>, policy: PolicyConfig) -> Self {
        Self {
            extractor: FieldExtractor::new(),
            validator: FebrabanValidator::new(policy.clone()),
            inference: InferenceEngine::new(classifier),
            fusion: ScoreFusion::new(),
            explainer: ExplanationEngine::new(policy),
        }
    }

    /// Name of the classifier in use
    pub fn model_name(&self) -> &str {
        self.inference.model_name()
    }

    /// Analyze one OCR text against today's local date.
    pub fn analyze(&self, text: &str) -> Result<AnalysisReport> {
        self.analyze_on(text, Local::now().date_naive())
    }

    /// Analyze one OCR text with `today` as the reference date.
    pub fn analyze_on(&self, text: &str, today: NaiveDate) -> Result<AnalysisReport> {
        let start = Instant::now();

        let fields = self.extractor.extract(text);
        let validation = self.validator.validate_on(&fields, today);
        let verdict = self.inference.predict(&fields)?;
        let fused = self.fusion.fuse(&validation, verdict);
        let explicacao = self.explainer.explain(&fields, &validation, &fused);

        let tempo_processamento_us = start.elapsed().as_micros() as u64;

        info!(
            is_fraudulento = fused.is_fraudulento,
            score = fused.score,
            nivel_risco = %explicacao.recomendacao.nivel_risco,
            latency_us = tempo_processamento_us,
            "Boleto analyzed"
        );

        Ok(AnalysisReport {
            dados_extraidos: fields,
            validacao_tecnica: validation,
            fraude_analise: fused,
            explicacao,
            tempo_processamento_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContractViolation, PipelineError};
    use crate::models::inference::StubClassifier;
    use crate::types::explanation::{RiskTier, Severity};
    use crate::types::verdict::DetectionMethod;
    use crate::validator::fixtures::valid_linha;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn pipeline(classe: i64, p0: f64, p1: f64) -> BoletoPipeline {
        BoletoPipeline::new(
            Arc::new(StubClassifier::new(classe, p0, p1)),
            PolicyConfig::default(),
        )
    }

    fn boleto_text(linha: &str) -> String {
        let vencimento = (today() + Duration::days(30)).format("%d/%m/%Y");
        format!(
            "BANCO DO BRASIL\nLinha digitável: {}\nValor do documento: R$ 150,00\nVencimento: {}\n",
            linha, vencimento
        )
    }

    #[test]
    fn test_authentic_boleto_end_to_end() {
        let text = boleto_text(&valid_linha("001", 15000));
        let report = pipeline(1, 0.05, 0.95).analyze_on(&text, today()).unwrap();

        assert_eq!(report.dados_extraidos.codigo_banco.as_deref(), Some("001"));
        assert_eq!(report.dados_extraidos.valor, Some(150.0));
        assert_eq!(report.dados_extraidos.vencimento.as_deref(), Some("01/07/2025"));
        assert!(report.validacao_tecnica.valido, "{:?}", report.validacao_tecnica.erros);

        assert!(!report.fraude_analise.is_fraudulento);
        assert!(report.fraude_analise.metodos.is_empty());

        let explicacao = &report.explicacao;
        assert_eq!(explicacao.recomendacao.nivel_risco, RiskTier::Baixo);
        assert!(explicacao
            .razoes
            .iter()
            .all(|r| r.gravidade < Severity::Alta));
    }

    #[test]
    fn test_tampered_linha_is_flagged_by_validation() {
        let linha = valid_linha("001", 15000);
        // Flip the first block check digit (position 10 in "XXXXX.XXXXD")
        let mut chars: Vec<char> = linha.chars().collect();
        chars[10] = if chars[10] == '0' { '1' } else { '0' };
        let tampered: String = chars.into_iter().collect();

        let report = pipeline(1, 0.05, 0.95)
            .analyze_on(&boleto_text(&tampered), today())
            .unwrap();

        assert!(!report.validacao_tecnica.valido);
        assert!(report.fraude_analise.is_fraudulento);
        assert!(report
            .fraude_analise
            .metodos
            .contains(&DetectionMethod::ValidacaoFebraban));
        assert_eq!(report.explicacao.simples.status, "POSSIVELMENTE FALSO");
        assert!(report
            .explicacao
            .simples
            .principal_motivo
            .starts_with("Possível irregularidade detectada: DV1 inválido"));
    }

    #[test]
    fn test_empty_text() {
        let report = pipeline(0, 0.6, 0.4).analyze_on("", today()).unwrap();

        assert_eq!(report.dados_extraidos.found_count(), 0);
        assert_eq!(
            report.validacao_tecnica.erros,
            vec![
                "Linha digitável não encontrada",
                "Valor não encontrado",
                "Vencimento não encontrado",
                "Código do banco não encontrado",
            ]
        );
        assert!(report.fraude_analise.is_fraudulento);
        assert_eq!(report.fraude_analise.metodos.len(), 2);
    }

    #[test]
    fn test_contract_violation_is_an_error() {
        let result = pipeline(3, 0.5, 0.5).analyze_on("", today());
        assert!(matches!(
            result,
            Err(PipelineError::Classifier(ContractViolation::UnknownClass(3)))
        ));
    }
}
