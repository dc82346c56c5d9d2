//! Analysis report and queue outcome structures

use crate::types::boleto::ExtractedFields;
use crate::types::explanation::ExplanationBundle;
use crate::types::verdict::{FusedVerdict, ValidationResult};
use serde::{Deserialize, Serialize};

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub dados_extraidos: ExtractedFields,
    pub validacao_tecnica: ValidationResult,
    pub fraude_analise: FusedVerdict,
    pub explicacao: ExplanationBundle,
    /// Wall time spent in the pipeline, in microseconds
    pub tempo_processamento_us: u64,
}

/// Message published for every consumed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Completed {
        analise_id: String,
        relatorio: Box<AnalysisReport>,
    },
    Failed {
        analise_id: String,
        erro: String,
    },
}

impl JobOutcome {
    pub fn analise_id(&self) -> &str {
        match self {
            JobOutcome::Completed { analise_id, .. } | JobOutcome::Failed { analise_id, .. } => {
                analise_id
            }
        }
    }
}
