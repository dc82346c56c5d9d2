//! Human readable explanations of a fraud verdict
//!
//! Turns the extracted fields, the validation result and the fused verdict
//! into a layered explanation: a short summary for lay users, a technical
//! breakdown, ranked reasons and a recommendation tier. Wording is hedged:
//! the engine never states that a boleto is definitely fake or authentic.

use crate::config::PolicyConfig;
use crate::locale::format_brl;
use crate::types::boleto::ExtractedFields;
use crate::types::explanation::{
    AdvancedExplanation, AnalysisMetrics, ConfidenceBand, ExplanationBundle, FeatureValue, Reason,
    ReasonCategory, Recommendation, RiskTier, Severity, SimpleExplanation, TechnicalAnalysis,
    TechnicalDetails,
};
use crate::types::verdict::{FusedVerdict, ValidationResult};
use chrono::Utc;
use tracing::debug;

/// Classifier decision threshold reported in the technical analysis
const DECISION_THRESHOLD: f64 = 0.5;

/// Builds explanation bundles for fused verdicts.
pub struct ExplanationEngine {
    policy: PolicyConfig,
}

impl ExplanationEngine {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    /// Explain a verdict.
    ///
    /// Fraud-probability thresholds are applied to `score / 100`.
    pub fn explain(
        &self,
        fields: &ExtractedFields,
        validation: &ValidationResult,
        fused: &FusedVerdict,
    ) -> ExplanationBundle {
        let simples = self.simple_explanation(validation, fused);
        let avancado = self.advanced_explanation(validation, fused);
        let razoes = self.reasons(fields, validation, fused);
        let recomendacao = recommendation(RiskTier::classify(fused.is_fraudulento, fused.confianca));

        debug!(
            status = %simples.status,
            nivel_risco = %recomendacao.nivel_risco,
            razoes = razoes.len(),
            "Explanation generated"
        );

        ExplanationBundle {
            simples,
            avancado,
            razoes,
            recomendacao,
            gerado_em: Utc::now(),
        }
    }

    fn simple_explanation(&self, validation: &ValidationResult, fused: &FusedVerdict) -> SimpleExplanation {
        let (status, resumo, acao_recomendada) = if fused.is_fraudulento {
            (
                "POSSIVELMENTE FALSO",
                "Este boleto apresenta características suspeitas que sugerem possível falsificação.",
                "Recomendamos NÃO efetuar o pagamento sem verificação adicional",
            )
        } else {
            (
                "POSSIVELMENTE AUTÊNTICO",
                "Este boleto aparenta ser autêntico, mas sempre confira os dados com o emissor.",
                "Você pode prosseguir com cautela, mas sempre verifique os dados",
            )
        };

        SimpleExplanation {
            status: status.to_string(),
            confianca: ConfidenceBand::from_confidence(fused.confianca)
                .label()
                .to_string(),
            resumo: resumo.to_string(),
            principal_motivo: principal_reason(&validation.erros, fused.fraud_probability()),
            acao_recomendada: acao_recomendada.to_string(),
        }
    }

    fn advanced_explanation(&self, validation: &ValidationResult, fused: &FusedVerdict) -> AdvancedExplanation {
        let modelo = &fused.modelo;

        AdvancedExplanation {
            analise_tecnica: TechnicalAnalysis {
                modelo_ml: modelo.modelo.clone(),
                score_fraude: round2(fused.fraud_probability() * 100.0),
                confianca_percentual: round2(fused.confianca * 100.0),
                probabilidades: modelo.probabilidades,
                limiar_decisao: DECISION_THRESHOLD,
            },
            metricas: AnalysisMetrics {
                features_analisadas: modelo.features_usadas.len(),
                validacoes_tecnicas: validation.erros.len(),
                metodos: fused.metodos.clone(),
            },
            detalhes_tecnicos: TechnicalDetails {
                validacao_febraban: !validation.valido,
                erros_encontrados: validation.erros.clone(),
                features_usadas: modelo
                    .features_usadas
                    .iter()
                    .map(|(nome, valor)| FeatureValue {
                        nome: nome.clone(),
                        valor: *valor,
                    })
                    .collect(),
            },
        }
    }

    /// Ordered reasons: validation errors, classifier, amount, then a
    /// generic entry if nothing else applied.
    fn reasons(&self, fields: &ExtractedFields, validation: &ValidationResult, fused: &FusedVerdict) -> Vec<Reason> {
        let mut razoes: Vec<Reason> = validation.erros.iter().map(|erro| validation_reason(erro)).collect();

        let p = fused.fraud_probability();
        if p > 0.7 {
            razoes.push(Reason {
                gravidade: Severity::Alta,
                categoria: ReasonCategory::MachineLearning,
                categoria_nome: ReasonCategory::MachineLearning.display_name().to_string(),
                cor: "danger".to_string(),
                titulo: "Padrão Suspeito Identificado".to_string(),
                descricao_simples: format!(
                    "O modelo de IA identificou características que sugerem possível fraude (confiança: {:.0}%)",
                    p * 100.0
                ),
                descricao_avancada: format!(
                    "Score de fraude: {:.2}. O modelo {}, treinado com milhares de boletos reais e falsos, identificou padrões estatísticos atípicos que podem indicar falsificação.",
                    p, fused.modelo.modelo
                ),
                impacto: 85,
                fonte: "Machine Learning".to_string(),
            });
        } else if p < 0.3 {
            razoes.push(Reason {
                gravidade: Severity::Baixa,
                categoria: ReasonCategory::MachineLearning,
                categoria_nome: ReasonCategory::MachineLearning.display_name().to_string(),
                cor: "success".to_string(),
                titulo: "Padrão Aparentemente Normal".to_string(),
                descricao_simples: format!(
                    "O modelo de IA não identificou características suspeitas significativas (confiança: {:.0}%)",
                    (1.0 - p) * 100.0
                ),
                descricao_avancada: format!(
                    "Score de autenticidade: {:.2}. As características analisadas sugerem conformidade com padrões de boletos legítimos.",
                    1.0 - p
                ),
                impacto: 15,
                fonte: "Machine Learning".to_string(),
            });
        }

        if let Some(valor) = fields.valor.filter(|v| *v > self.policy.elevated_value_threshold) {
            razoes.push(Reason {
                gravidade: Severity::Media,
                categoria: ReasonCategory::Valor,
                categoria_nome: ReasonCategory::Valor.display_name().to_string(),
                cor: "warning".to_string(),
                titulo: "Valor Elevado".to_string(),
                descricao_simples: format!(
                    "O valor do boleto é elevado ({}). Recomenda-se verificação adicional.",
                    format_brl(valor)
                ),
                descricao_avancada: format!(
                    "Boletos com valores acima de {} merecem atenção extra. Em caso de fraude, o prejuízo seria significativo.",
                    format_brl(self.policy.elevated_value_threshold)
                ),
                impacto: 60,
                fonte: "Análise de Risco".to_string(),
            });
        }

        if razoes.is_empty() {
            razoes.push(Reason {
                gravidade: Severity::Baixa,
                categoria: ReasonCategory::Geral,
                categoria_nome: ReasonCategory::Geral.display_name().to_string(),
                cor: "primary".to_string(),
                titulo: "Análise Completa Realizada".to_string(),
                descricao_simples: "Todas as verificações de segurança foram executadas.".to_string(),
                descricao_avancada: "O boleto passou por validação FEBRABAN, análise de Machine Learning e verificações de padrões suspeitos.".to_string(),
                impacto: 30,
                fonte: "Sistema DetectaBB".to_string(),
            });
        }

        razoes
    }
}

impl Default for ExplanationEngine {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

/// Pick the main reason; the first matching rule wins.
fn principal_reason(erros: &[String], p: f64) -> String {
    let critical = erros.iter().find(|erro| {
        let erro = erro.to_lowercase();
        erro.contains("inválido") || erro.contains("incorreto")
    });

    if let Some(erro) = critical {
        return format!("Possível irregularidade detectada: {}", erro);
    }
    if let Some(erro) = erros.first() {
        return format!("Inconsistência identificada: {}", erro);
    }

    let motivo = if p > 0.8 {
        "Modelo de ML identificou padrão suspeito com alta confiança"
    } else if p > 0.6 {
        "Modelo de ML identificou características atípicas"
    } else if p < 0.3 {
        "Todas as verificações sugerem autenticidade"
    } else {
        "Análise inconclusiva - recomenda-se verificação manual"
    };
    motivo.to_string()
}

fn validation_reason(erro: &str) -> Reason {
    let gravidade = Severity::from_error(erro);
    Reason {
        gravidade,
        categoria: ReasonCategory::ValidacaoTecnica,
        categoria_nome: ReasonCategory::ValidacaoTecnica.display_name().to_string(),
        cor: gravidade.color().to_string(),
        titulo: "Possível Inconsistência Técnica".to_string(),
        descricao_simples: format!("Foi identificada uma possível irregularidade: {}", erro),
        descricao_avancada: format!(
            "Validação FEBRABAN: {}. Isso pode indicar adulteração ou erro na geração do boleto.",
            erro
        ),
        impacto: gravidade.impact(),
        fonte: "Validação FEBRABAN".to_string(),
    }
}

fn recommendation(nivel_risco: RiskTier) -> Recommendation {
    let (cor, acao_principal, mensagem, proximos_passos): (&str, &str, &str, &[&str]) = match nivel_risco {
        RiskTier::Alto => (
            "danger",
            "NÃO PAGAR (Alta Probabilidade de Fraude)",
            "Este boleto apresenta FORTES indícios de falsificação. Recomendamos fortemente não efetuar o pagamento.",
            &[
                "NÃO efetue o pagamento deste boleto",
                "Entre em contato DIRETAMENTE com a empresa emissora pelos canais oficiais",
                "Reporte este possível boleto falso às autoridades competentes",
                "Solicite um novo boleto através de canais seguros e oficiais",
                "Verifique se o e-mail/site de origem é legítimo",
            ],
        ),
        RiskTier::MedioAlto => (
            "warning",
            "VERIFICAR ANTES DE PAGAR",
            "Este boleto apresenta características suspeitas. É necessária verificação adicional antes do pagamento.",
            &[
                "Aguarde! Não pague ainda",
                "Confirme os dados com a empresa emissora pelos canais oficiais",
                "Verifique se os dados bancários correspondem aos oficiais",
                "Confirme a autenticidade do e-mail/site de origem",
                "Solicite nova via por canal seguro, se necessário",
            ],
        ),
        RiskTier::Medio => (
            "warning",
            "PROCEDER COM CAUTELA",
            "Algumas irregularidades foram detectadas. Recomendamos verificação antes do pagamento.",
            &[
                "Confira cuidadosamente todos os dados do boleto",
                "Em caso de dúvida, contate a empresa emissora",
                "Verifique se o valor e vencimento estão corretos",
                "Confirme se o banco é o esperado para este tipo de cobrança",
            ],
        ),
        RiskTier::Baixo => (
            "success",
            "PODE PAGAR (Com Verificação)",
            "Este boleto aparenta ser autêntico. Mesmo assim, sempre confira os dados antes do pagamento.",
            &[
                "Boleto aparenta ser legítimo",
                "Confira os dados: valor, vencimento e beneficiário",
                "Verifique se o banco corresponde ao esperado",
                "Em caso de qualquer dúvida, contate o emissor",
                "Proceda com o pagamento normalmente",
            ],
        ),
        RiskTier::BaixoMedio => (
            "success",
            "PROVÁVEL AUTENTICIDADE",
            "O boleto passou nas verificações básicas, mas sempre confirme os dados importantes.",
            &[
                "Verificações de segurança aprovadas",
                "Confira valor e vencimento",
                "Em caso de dúvida, confirme com o emissor",
                "Você pode prosseguir com o pagamento",
            ],
        ),
        RiskTier::Incerto => (
            "medium",
            "VERIFICAR MANUALMENTE",
            "Não foi possível determinar com certeza. Recomendamos verificação manual cuidadosa.",
            &[
                "Analise cuidadosamente todos os dados",
                "Confirme a autenticidade com o emissor",
                "Verifique os dados bancários",
                "Proceda somente após confirmação",
            ],
        ),
    };

    Recommendation {
        nivel_risco,
        cor: cor.to_string(),
        acao_principal: acao_principal.to_string(),
        mensagem: mensagem.to_string(),
        proximos_passos: proximos_passos.iter().map(|s| s.to_string()).collect(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fusion::ScoreFusion;
    use crate::models::inference::ClassifierOutput;
    use crate::types::verdict::{ClassifierVerdict, FieldCheck};

    fn fused(validation: &ValidationResult, classe: i64, p0: f64, p1: f64) -> FusedVerdict {
        let verdict = ClassifierVerdict::from_output(
            "Random Forest Classifier",
            ClassifierOutput {
                classe,
                probabilidades: [p0, p1],
            },
            vec![("banco".to_string(), 1.0), ("valor".to_string(), 150.0)],
        )
        .unwrap();
        ScoreFusion::new().fuse(validation, verdict)
    }

    fn valid() -> ValidationResult {
        ValidationResult::combine(vec![(Some("linha_digitavel"), FieldCheck::ok())])
    }

    fn invalid(erros: &[&str]) -> ValidationResult {
        ValidationResult::combine(
            erros
                .iter()
                .map(|e| (None, FieldCheck::failed(*e)))
                .collect::<Vec<_>>(),
        )
    }

    fn fields(valor: f64) -> ExtractedFields {
        ExtractedFields {
            valor: Some(valor),
            ..Default::default()
        }
    }

    #[test]
    fn test_authentic_explanation() {
        let validation = valid();
        let verdict = fused(&validation, 1, 0.05, 0.95);
        let bundle = ExplanationEngine::default().explain(&fields(150.0), &validation, &verdict);

        assert_eq!(bundle.simples.status, "POSSIVELMENTE AUTÊNTICO");
        assert_eq!(bundle.simples.confianca, "Muito Alta");
        assert_eq!(
            bundle.simples.principal_motivo,
            "Todas as verificações sugerem autenticidade"
        );
        assert_eq!(bundle.recomendacao.nivel_risco, RiskTier::Baixo);
        assert_eq!(bundle.recomendacao.proximos_passos.len(), 5);

        assert_eq!(bundle.razoes.len(), 1);
        assert_eq!(bundle.razoes[0].gravidade, Severity::Baixa);
        assert_eq!(bundle.razoes[0].impacto, 15);
        assert_eq!(bundle.razoes[0].cor, "success");
        assert!(bundle.razoes[0].descricao_simples.contains("95%"));
    }

    #[test]
    fn test_principal_reason_prefers_invalid_errors() {
        let erros = vec![
            "Valor não encontrado".to_string(),
            "DV2 inválido (esperado: 1, encontrado: 2)".to_string(),
        ];
        assert_eq!(
            principal_reason(&erros, 0.1),
            "Possível irregularidade detectada: DV2 inválido (esperado: 1, encontrado: 2)"
        );

        let erros = vec!["Valor não encontrado".to_string()];
        assert_eq!(
            principal_reason(&erros, 0.9),
            "Inconsistência identificada: Valor não encontrado"
        );
    }

    #[test]
    fn test_principal_reason_by_probability() {
        assert_eq!(
            principal_reason(&[], 0.81),
            "Modelo de ML identificou padrão suspeito com alta confiança"
        );
        assert_eq!(
            principal_reason(&[], 0.8),
            "Modelo de ML identificou características atípicas"
        );
        assert_eq!(
            principal_reason(&[], 0.5),
            "Análise inconclusiva - recomenda-se verificação manual"
        );
        assert_eq!(
            principal_reason(&[], 0.3),
            "Análise inconclusiva - recomenda-se verificação manual"
        );
    }

    #[test]
    fn test_validation_errors_become_reasons_in_order() {
        let validation = invalid(&[
            "DV1 inválido (esperado: 9, encontrado: 0)",
            "Código de barras deve ter 44 dígitos (tem 40)",
            "Vencimento não encontrado",
        ]);
        let verdict = fused(&validation, 0, 0.9, 0.1);
        let bundle = ExplanationEngine::default().explain(&fields(150.0), &validation, &verdict);

        let severities: Vec<_> = bundle.razoes.iter().map(|r| r.gravidade).collect();
        assert_eq!(
            severities,
            vec![Severity::Critica, Severity::Alta, Severity::Baixa, Severity::Alta]
        );
        assert_eq!(bundle.razoes[0].impacto, 95);
        assert_eq!(bundle.razoes[0].cor, "danger");
        assert_eq!(bundle.razoes[3].categoria, ReasonCategory::MachineLearning);
        assert_eq!(bundle.razoes[3].impacto, 85);

        assert_eq!(bundle.simples.status, "POSSIVELMENTE FALSO");
        assert_eq!(bundle.recomendacao.nivel_risco, RiskTier::Alto);
        assert!(bundle.avancado.detalhes_tecnicos.validacao_febraban);
        assert_eq!(bundle.avancado.metricas.validacoes_tecnicas, 3);
        assert_eq!(bundle.avancado.metricas.metodos.len(), 2);
    }

    #[test]
    fn test_elevated_value_reason() {
        let validation = valid();
        let verdict = fused(&validation, 1, 0.5, 0.5);
        let bundle = ExplanationEngine::default().explain(&fields(12_345.0), &validation, &verdict);

        assert_eq!(bundle.razoes.len(), 1);
        let reason = &bundle.razoes[0];
        assert_eq!(reason.titulo, "Valor Elevado");
        assert_eq!(reason.gravidade, Severity::Media);
        assert_eq!(reason.impacto, 60);
        assert!(reason.descricao_simples.contains("R$ 12.345,00"));
        assert!(reason.descricao_avancada.contains("R$ 10.000,00"));
    }

    #[test]
    fn test_generic_reason_when_nothing_applies() {
        let validation = valid();
        let verdict = fused(&validation, 1, 0.4, 0.6);
        let bundle = ExplanationEngine::default().explain(&fields(10_000.0), &validation, &verdict);

        assert_eq!(bundle.razoes.len(), 1);
        assert_eq!(bundle.razoes[0].categoria, ReasonCategory::Geral);
        assert_eq!(bundle.razoes[0].impacto, 30);
        assert_eq!(bundle.recomendacao.nivel_risco, RiskTier::Incerto);
        assert_eq!(bundle.simples.confianca, "Média");
    }

    #[test]
    fn test_invalid_boleto_with_authentic_classifier() {
        let validation = invalid(&["Valor não encontrado"]);
        let verdict = fused(&validation, 1, 0.2, 0.8);
        let bundle = ExplanationEngine::default().explain(&ExtractedFields::default(), &validation, &verdict);

        // Fused verdict drives status and tier
        assert_eq!(bundle.simples.status, "POSSIVELMENTE FALSO");
        assert_eq!(bundle.recomendacao.nivel_risco, RiskTier::MedioAlto);
        assert_eq!(bundle.recomendacao.acao_principal, "VERIFICAR ANTES DE PAGAR");
    }

    #[test]
    fn test_technical_analysis() {
        let validation = valid();
        let verdict = fused(&validation, 0, 0.826, 0.174);
        let bundle = ExplanationEngine::default().explain(&fields(150.0), &validation, &verdict);
        let tecnica = &bundle.avancado.analise_tecnica;

        assert_eq!(tecnica.modelo_ml, "Random Forest Classifier");
        assert_eq!(tecnica.score_fraude, 83.0);
        assert_eq!(tecnica.confianca_percentual, 82.6);
        assert_eq!(tecnica.limiar_decisao, 0.5);
        assert_eq!(bundle.avancado.metricas.features_analisadas, 2);
        assert_eq!(bundle.avancado.detalhes_tecnicos.features_usadas[1].nome, "valor");
        assert!(!bundle.avancado.detalhes_tecnicos.validacao_febraban);
    }

    #[test]
    fn test_bundle_serializes() {
        let validation = valid();
        let verdict = fused(&validation, 1, 0.05, 0.95);
        let bundle = ExplanationEngine::default().explain(&fields(150.0), &validation, &verdict);

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["recomendacao"]["nivel_risco"], "BAIXO");
        assert_eq!(json["razoes"][0]["gravidade"], "baixa");
        assert_eq!(json["razoes"][0]["categoria"], "machine_learning");
    }
}
