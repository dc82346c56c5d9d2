//! FEBRABAN validation of extracted boleto fields.
//!
//! Every applicable check runs on every boleto and all errors are kept, in
//! check order: linha digitável, código de barras, valor, vencimento, CNPJ,
//! código do banco. Each check returns its own [`FieldCheck`]; the results
//! are folded into one [`ValidationResult`] at the end.

pub mod checksum;

use crate::banks;
use crate::config::PolicyConfig;
use crate::locale::{format_brl, parse_br_date};
use crate::types::boleto::ExtractedFields;
use crate::types::verdict::{FieldCheck, ValidationResult};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

/// Validates boletos against FEBRABAN rules.
pub struct FebrabanValidator {
    policy: PolicyConfig,
}

impl FebrabanValidator {
    /// Create a validator with the given policy.
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    /// Validate against today's local date.
    pub fn validate(&self, fields: &ExtractedFields) -> ValidationResult {
        self.validate_on(fields, Local::now().date_naive())
    }

    /// Validate with `today` as the reference date for the due date window.
    pub fn validate_on(&self, fields: &ExtractedFields, today: NaiveDate) -> ValidationResult {
        let checks = vec![
            match fields.linha_digitavel.as_deref() {
                Some(linha) => (Some("linha_digitavel"), check_linha_digitavel(linha)),
                None => (None, FieldCheck::failed("Linha digitável não encontrada")),
            },
            match fields.codigo_barras.as_deref() {
                Some(codigo) => (Some("codigo_barras"), check_codigo_barras(codigo)),
                None => (None, FieldCheck::ok()),
            },
            match fields.valor {
                Some(valor) => (Some("valor"), check_valor(valor, self.policy.max_valor)),
                None => (None, FieldCheck::failed("Valor não encontrado")),
            },
            match fields.vencimento.as_deref() {
                Some(vencimento) => (
                    Some("vencimento"),
                    check_vencimento(vencimento, today, &self.policy),
                ),
                None => (None, FieldCheck::failed("Vencimento não encontrado")),
            },
            match fields.cnpj.as_deref() {
                Some(cnpj) => (Some("cnpj"), check_cnpj(cnpj)),
                None => (None, FieldCheck::ok()),
            },
            match fields.codigo_banco.as_deref() {
                Some(codigo) => (Some("banco"), check_codigo_banco(codigo)),
                None => (None, FieldCheck::failed("Código do banco não encontrado")),
            },
        ];

        let result = ValidationResult::combine(checks);

        if result.valido {
            info!("Boleto valid under FEBRABAN rules");
        } else {
            warn!(
                errors = result.erros.len(),
                first_error = %result.erros[0],
                "Boleto failed FEBRABAN validation"
            );
        }

        result
    }
}

impl Default for FebrabanValidator {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn digit_at(digits: &str, index: usize) -> u32 {
    digits[index..=index].parse().unwrap_or_default()
}

/// Check the three modulo-10 block digits of a linha digitável.
pub fn check_linha_digitavel(linha: &str) -> FieldCheck {
    let digits = strip_non_digits(linha);
    if digits.len() != 47 {
        return FieldCheck::failed(format!(
            "Linha digitável deve ter 47 dígitos (tem {})",
            digits.len()
        ));
    }

    // (block number, body, check digit index)
    let blocks = [(1, 0..9, 9), (2, 10..20, 20), (3, 21..31, 31)];

    let erros = blocks
        .into_iter()
        .filter_map(|(block, body, dv_index)| {
            let expected = checksum::modulo10(&digits[body])?;
            let found = digit_at(&digits, dv_index);
            (expected != found).then(|| {
                format!(
                    "DV{} inválido (esperado: {}, encontrado: {})",
                    block, expected, found
                )
            })
        })
        .collect();

    FieldCheck::from_errors(erros)
}

/// Check the modulo-11 digit at index 4 of a código de barras.
pub fn check_codigo_barras(codigo: &str) -> FieldCheck {
    let digits = strip_non_digits(codigo);
    if digits.len() != 44 {
        return FieldCheck::failed(format!(
            "Código de barras deve ter 44 dígitos (tem {})",
            digits.len()
        ));
    }

    let body = format!("{}{}", &digits[..4], &digits[5..]);
    let found = digit_at(&digits, 4);
    match checksum::modulo11(&body) {
        Some(expected) if expected != found => FieldCheck::failed(format!(
            "DV do código de barras inválido (esperado: {}, encontrado: {})",
            expected, found
        )),
        _ => FieldCheck::ok(),
    }
}

/// Check that the amount is positive and under the ceiling.
pub fn check_valor(valor: f64, max_valor: f64) -> FieldCheck {
    let mut erros = Vec::new();
    if valor.is_nan() || valor <= 0.0 {
        erros.push("Valor deve ser maior que zero".to_string());
    }
    if valor > max_valor {
        erros.push(format!(
            "Valor excede limite máximo ({})",
            format_brl(max_valor)
        ));
    }
    FieldCheck::from_errors(erros)
}

/// Check that the due date parses and sits inside the accepted window.
pub fn check_vencimento(vencimento: &str, today: NaiveDate, policy: &PolicyConfig) -> FieldCheck {
    let Some(date) = parse_br_date(vencimento) else {
        return FieldCheck::failed(format!("Data de vencimento inválida: {}", vencimento));
    };

    let mut erros = Vec::new();
    if (today - date).num_days() > i64::from(policy.max_past_years) * 365 {
        erros.push(format!(
            "Boleto com vencimento muito antigo ({})",
            vencimento
        ));
    }
    if (date - today).num_days() > i64::from(policy.max_future_years) * 365 {
        erros.push(format!(
            "Boleto com vencimento muito distante ({})",
            vencimento
        ));
    }
    FieldCheck::from_errors(erros)
}

/// Check the two CNPJ check digits.
pub fn check_cnpj(cnpj: &str) -> FieldCheck {
    let digits = strip_non_digits(cnpj);
    if digits.len() != 14 {
        return FieldCheck::failed("CNPJ deve ter 14 dígitos");
    }
    if digits.chars().all(|c| Some(c) == digits.chars().next()) {
        return FieldCheck::failed("CNPJ inválido (sequência repetida)");
    }

    let Some((first, second)) = checksum::cnpj_check_digits(&digits[..12]) else {
        return FieldCheck::failed("CNPJ deve ter 14 dígitos");
    };

    let mut erros = Vec::new();
    let found_first = digit_at(&digits, 12);
    if found_first != first {
        erros.push(format!(
            "Primeiro dígito verificador do CNPJ inválido (esperado: {}, encontrado: {})",
            first, found_first
        ));
    }
    let found_second = digit_at(&digits, 13);
    if found_second != second {
        erros.push(format!(
            "Segundo dígito verificador do CNPJ inválido (esperado: {}, encontrado: {})",
            second, found_second
        ));
    }
    FieldCheck::from_errors(erros)
}

/// Check the bank code against the known set.
pub fn check_codigo_banco(codigo: &str) -> FieldCheck {
    if banks::is_known_bank(codigo) {
        FieldCheck::ok()
    } else {
        FieldCheck::failed(format!("Código de banco desconhecido: {}", codigo))
    }
}


#[cfg(test)]
mod tests {
    use super::checksum::modulo11;
    use super::fixtures::valid_linha;
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn valid_fields() -> ExtractedFields {
        ExtractedFields {
            linha_digitavel: Some(valid_linha("001", 15000)),
            valor: Some(150.0),
            vencimento: Some("01/07/2025".to_string()),
            codigo_banco: Some("001".to_string()),
            banco_nome: Some("Banco do Brasil".to_string()),
            ..Default::default()
        }
    }

    fn with_digit(s: &str, index: usize, digit: u32) -> String {
        let mut chars: Vec<char> = s.chars().collect();
        chars[index] = char::from_digit(digit, 10).unwrap();
        chars.into_iter().collect()
    }

    #[test]
    fn test_valid_boleto() {
        let result = FebrabanValidator::default().validate_on(&valid_fields(), today());
        assert!(result.valido, "unexpected errors: {:?}", result.erros);
        assert!(result.erros.is_empty());
        assert!(result.detalhes["linha_digitavel"].valido);
    }

    #[test]
    fn test_linha_block_round_trip() {
        for bank in ["001", "237", "341", "999"] {
            let check = check_linha_digitavel(&valid_linha(bank, 123));
            assert!(check.valido, "bank {}: {:?}", bank, check.erros);
        }
    }

    #[test]
    fn test_linha_each_block_reported() {
        let digits = strip_non_digits(&valid_linha("001", 15000));
        let dv1 = digit_at(&digits, 9);
        let dv3 = digit_at(&digits, 31);
        let tampered = with_digit(&with_digit(&digits, 9, (dv1 + 1) % 10), 31, (dv3 + 1) % 10);

        let check = check_linha_digitavel(&tampered);
        assert_eq!(check.erros.len(), 2);
        assert_eq!(
            check.erros[0],
            format!(
                "DV1 inválido (esperado: {}, encontrado: {})",
                dv1,
                (dv1 + 1) % 10
            )
        );
        assert!(check.erros[1].starts_with("DV3 inválido"));
    }

    #[test]
    fn test_linha_wrong_length() {
        let check = check_linha_digitavel("00190.00009");
        assert_eq!(check.erros, vec!["Linha digitável deve ter 47 dígitos (tem 10)"]);
    }

    #[test]
    fn test_barcode_round_trip() {
        let raw = "23790000000000000000012345678901234567890123";
        let body = format!("{}{}", &raw[..4], &raw[5..]);
        let dv = modulo11(&body).unwrap();
        let barcode = with_digit(raw, 4, dv);

        assert!(check_codigo_barras(&barcode).valido);

        let wrong = with_digit(&barcode, 4, (dv % 9) + 1);
        let check = check_codigo_barras(&wrong);
        assert_eq!(check.erros.len(), 1);
        assert!(check.erros[0].starts_with("DV do código de barras inválido"));
    }

    #[test]
    fn test_barcode_wrong_length() {
        let check = check_codigo_barras("1234");
        assert_eq!(check.erros, vec!["Código de barras deve ter 44 dígitos (tem 4)"]);
    }

    #[test]
    fn test_valor_bounds() {
        assert!(check_valor(0.01, 9_999_999.99).valido);
        assert!(check_valor(9_999_999.99, 9_999_999.99).valido);
        assert_eq!(
            check_valor(0.0, 9_999_999.99).erros,
            vec!["Valor deve ser maior que zero"]
        );
        assert_eq!(
            check_valor(10_000_000.0, 9_999_999.99).erros,
            vec!["Valor excede limite máximo (R$ 9.999.999,99)"]
        );
    }

    #[test]
    fn test_vencimento_window() {
        let policy = PolicyConfig::default();
        assert!(check_vencimento("01/07/2025", today(), &policy).valido);
        assert!(check_vencimento("01/06/2021", today(), &policy).valido);

        let old = check_vencimento("01/01/2020", today(), &policy);
        assert_eq!(old.erros, vec!["Boleto com vencimento muito antigo (01/01/2020)"]);

        let far = check_vencimento("01/01/2028", today(), &policy);
        assert_eq!(far.erros, vec!["Boleto com vencimento muito distante (01/01/2028)"]);

        let malformed = check_vencimento("31/13/2025", today(), &policy);
        assert_eq!(malformed.erros, vec!["Data de vencimento inválida: 31/13/2025"]);
    }

    #[test]
    fn test_vencimento_window_follows_policy() {
        let policy = PolicyConfig {
            max_future_years: 10,
            ..Default::default()
        };
        assert!(check_vencimento("01/01/2028", today(), &policy).valido);
    }

    #[test]
    fn test_cnpj_valid() {
        assert!(check_cnpj("11.222.333/0001-81").valido);
        assert!(check_cnpj("11222333000181").valido);
    }

    #[test]
    fn test_cnpj_flipped_digits() {
        let first = check_cnpj("11.222.333/0001-91");
        assert_eq!(first.erros.len(), 1);
        assert!(first.erros[0].starts_with("Primeiro dígito verificador do CNPJ inválido"));

        let second = check_cnpj("11.222.333/0001-82");
        assert_eq!(second.erros.len(), 1);
        assert!(second.erros[0].starts_with("Segundo dígito verificador do CNPJ inválido"));
    }

    #[test]
    fn test_cnpj_repeated_digits() {
        for d in 0..10 {
            let cnpj = d.to_string().repeat(14);
            assert_eq!(
                check_cnpj(&cnpj).erros,
                vec!["CNPJ inválido (sequência repetida)"]
            );
        }
    }

    #[test]
    fn test_unknown_bank() {
        assert!(check_codigo_banco("104").valido);
        assert_eq!(
            check_codigo_banco("999").erros,
            vec!["Código de banco desconhecido: 999"]
        );
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let result =
            FebrabanValidator::default().validate_on(&ExtractedFields::default(), today());

        assert!(!result.valido);
        assert_eq!(
            result.erros,
            vec![
                "Linha digitável não encontrada",
                "Valor não encontrado",
                "Vencimento não encontrado",
                "Código do banco não encontrado",
            ]
        );
        assert!(result.detalhes.is_empty());
    }

    #[test]
    fn test_all_failures_accumulate() {
        let digits = strip_non_digits(&valid_linha("999", 100));
        let dv2 = digit_at(&digits, 20);
        let fields = ExtractedFields {
            linha_digitavel: Some(with_digit(&digits, 20, (dv2 + 1) % 10)),
            codigo_barras: Some("1234".to_string()),
            valor: Some(-5.0),
            vencimento: Some("01/01/2010".to_string()),
            cnpj: Some("11.111.111/1111-11".to_string()),
            codigo_banco: Some("999".to_string()),
            ..Default::default()
        };

        let result = FebrabanValidator::default().validate_on(&fields, today());
        assert!(!result.valido);
        assert_eq!(result.erros.len(), 6);
        assert!(result.erros[0].starts_with("DV2 inválido"));
        assert!(result.erros[1].starts_with("Código de barras deve ter"));
        assert_eq!(result.erros[2], "Valor deve ser maior que zero");
        assert!(result.erros[3].contains("muito antigo"));
        assert_eq!(result.erros[4], "CNPJ inválido (sequência repetida)");
        assert_eq!(result.erros[5], "Código de banco desconhecido: 999");
        assert_eq!(result.detalhes.len(), 6);
    }
}
