//! Boleto data structures extracted from OCR text

use serde::{Deserialize, Serialize};

/// Fields read from the OCR text of a boleto.
///
/// Every member is independently optional: a field the extractor could not
/// find is `None`, and the record as a whole is always produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Linha digitável in canonical form
    /// (`AAAAA.AAAAA BBBBB.BBBBBB CCCCC.CCCCCC D EEEEEEEEEEEEEE`, 47 digits)
    pub linha_digitavel: Option<String>,

    /// Código de barras (44 bare digits)
    pub codigo_barras: Option<String>,

    /// Amount in reais
    pub valor: Option<f64>,

    /// Due date as `dd/mm/yyyy`
    pub vencimento: Option<String>,

    /// Beneficiary CNPJ as `XX.XXX.XXX/XXXX-XX`
    #[serde(alias = "beneficiario_cnpj")]
    pub cnpj: Option<String>,

    /// Three-digit bank code (taken from the linha digitável)
    pub codigo_banco: Option<String>,

    /// Bank display name
    pub banco_nome: Option<String>,

    /// Agency as printed (e.g. `1234-5`)
    pub agencia: Option<String>,
}

impl ExtractedFields {
    /// Digits of the linha digitável with formatting stripped.
    pub fn linha_digits(&self) -> Option<String> {
        self.linha_digitavel
            .as_deref()
            .map(|linha| linha.chars().filter(|c| c.is_ascii_digit()).collect())
    }

    /// Number of fields that were found.
    pub fn found_count(&self) -> usize {
        [
            self.linha_digitavel.is_some(),
            self.codigo_barras.is_some(),
            self.valor.is_some(),
            self.vencimento.is_some(),
            self.cnpj.is_some(),
            self.codigo_banco.is_some(),
            self.banco_nome.is_some(),
            self.agencia.is_some(),
        ]
        .iter()
        .filter(|&&found| found)
        .count()
    }
}

/// Analysis job consumed from the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoletoJob {
    /// Analysis identifier assigned upstream
    #[serde(alias = "id")]
    pub analise_id: String,

    /// Text produced by the OCR collaborator
    pub texto_ocr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linha_digits_strips_formatting() {
        let fields = ExtractedFields {
            linha_digitavel: Some("00190.00009 01234.567896 12345.678901 2 12340000015000".into()),
            ..Default::default()
        };

        let digits = fields.linha_digits().unwrap();
        assert_eq!(digits.len(), 47);
        assert!(digits.starts_with("001900000901234"));
    }

    #[test]
    fn test_job_accepts_id_alias() {
        let job: BoletoJob =
            serde_json::from_str(r#"{"id": "a1", "texto_ocr": "Valor: R$ 10,00"}"#).unwrap();
        assert_eq!(job.analise_id, "a1");
    }

    #[test]
    fn test_cnpj_alias_and_found_count() {
        let fields: ExtractedFields = serde_json::from_str(
            r#"{"beneficiario_cnpj": "11.222.333/0001-81", "valor": 10.5}"#,
        )
        .unwrap();
        assert_eq!(fields.cnpj.as_deref(), Some("11.222.333/0001-81"));
        assert_eq!(fields.found_count(), 2);
    }
}
