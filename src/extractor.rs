//! Field extraction from boleto OCR text.
//!
//! OCR output is noisy: groups of the linha digitável may lose their dots,
//! line breaks land in the middle of fields and amounts come in Brazilian
//! locale. Every pattern here is tried in a fixed order and the first match
//! that survives normalization wins. A field that cannot be read is `None`.

use crate::banks;
use crate::types::boleto::ExtractedFields;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use tracing::debug;

// Linha digitável: AAAAA.AAAAA BBBBB.BBBBBB CCCCC.CCCCCC D EEEEEEEEEEEEEE
static RE_LINHA_FORMATTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([0-9]{5})[.\s]?([0-9]{5})\s?([0-9]{5})[.\s]?([0-9]{6})\s?([0-9]{5})[.\s]?([0-9]{6})\s?([0-9])\s?([0-9]{14})",
    )
    .expect("valid linha digitavel regex")
});
static RE_LINHA_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-9]{47})\b").expect("valid bare linha regex"));

static RE_BARCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-9]{44})\b").expect("valid barcode regex"));

// Amounts: R$ 1.234,56 / Valor: 1.234,56 / 1.234,56
static RE_VALOR: Lazy<[Regex; 3]> = Lazy::new(|| {
    const AMOUNT: &str = r"([0-9]{1,3}(?:[.,][0-9]{3})*[.,][0-9]{2})";
    [
        Regex::new(&format!(r"(?i)R\$?\s?{}", AMOUNT)).expect("valid R$ amount regex"),
        Regex::new(&format!(r"(?i)Valor[:\s]+R\$?\s?{}", AMOUNT))
            .expect("valid labeled amount regex"),
        Regex::new(AMOUNT).expect("valid bare amount regex"),
    ]
});

static RE_VENCIMENTO: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)Vencimento[:\s]+([0-9]{2})/([0-9]{2})/([0-9]{4})")
            .expect("valid labeled date regex"),
        Regex::new(r"([0-9]{2})/([0-9]{2})/([0-9]{4})").expect("valid date regex"),
        Regex::new(r"([0-9]{2})/([0-9]{2})/([0-9]{2})").expect("valid short date regex"),
    ]
});

static RE_CNPJ: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"([0-9]{2}[.\s]?[0-9]{3}[.\s]?[0-9]{3}[/\s]?[0-9]{4}[-\s]?[0-9]{2})")
            .expect("valid formatted cnpj regex"),
        Regex::new(r"\b([0-9]{14})\b").expect("valid bare cnpj regex"),
    ]
});

static RE_AGENCIA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bAg(?:ência|encia|\.)[^0-9\n]{0,40}?([0-9]{3,5}(?:-[0-9xX])?)\b")
        .expect("valid agencia regex")
});

/// Extracts boleto fields from OCR text.
pub struct FieldExtractor;

impl FieldExtractor {
    /// Create a new field extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract every field the text carries.
    ///
    /// Never fails: fields that cannot be read are left as `None`.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        // Folding line breaks keeps byte offsets stable across passes.
        let text = text.replace(['\n', '\r'], " ");
        let mut fields = ExtractedFields::default();
        let mut consumed: Vec<Range<usize>> = Vec::new();

        if let Some((linha, span)) = extract_linha_digitavel(&text) {
            debug!(linha_digitavel = %linha, "Linha digitável extracted");
            fields.codigo_banco = Some(linha[..3].to_string());
            fields.linha_digitavel = Some(linha);
            consumed.push(span);
        }

        if let Some((codigo, span)) = extract_codigo_barras(&text) {
            debug!(codigo_barras = %codigo, "Código de barras extracted");
            fields.codigo_barras = Some(codigo);
            consumed.push(span);
        }

        fields.valor = extract_valor(&text);
        if let Some(valor) = fields.valor {
            debug!(valor, "Valor extracted");
        }

        fields.vencimento = extract_vencimento(&text);
        if let Some(vencimento) = &fields.vencimento {
            debug!(vencimento = %vencimento, "Vencimento extracted");
        }

        fields.cnpj = extract_cnpj(&mask_spans(&text, &consumed));
        if let Some(cnpj) = &fields.cnpj {
            debug!(cnpj = %cnpj, "CNPJ extracted");
        }

        fields.agencia = extract_agencia(&text);

        fields.banco_nome = fields.codigo_banco.as_deref().map(banks::bank_name);

        debug!(found = fields.found_count(), "Field extraction complete");
        fields
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the linha digitável and return it in canonical form with its span.
pub fn extract_linha_digitavel(text: &str) -> Option<(String, Range<usize>)> {
    if let Some(caps) = RE_LINHA_FORMATTED.captures(text) {
        let digits: String = (1..=8).map(|i| &caps[i]).collect();
        let span = caps.get(0).map(|m| m.range())?;
        return Some((format_linha_digitavel(&digits), span));
    }

    RE_LINHA_BARE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| (format_linha_digitavel(m.as_str()), m.range()))
}

/// Format 47 bare digits as `AAAAA.AAAAA BBBBB.BBBBBB CCCCC.CCCCCC D EEEEEEEEEEEEEE`.
pub fn format_linha_digitavel(digits: &str) -> String {
    format!(
        "{}.{} {}.{} {}.{} {} {}",
        &digits[0..5],
        &digits[5..10],
        &digits[10..15],
        &digits[15..21],
        &digits[21..26],
        &digits[26..32],
        &digits[32..33],
        &digits[33..47]
    )
}

/// Find a bare 44-digit código de barras.
pub fn extract_codigo_barras(text: &str) -> Option<(String, Range<usize>)> {
    RE_BARCODE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| (m.as_str().to_string(), m.range()))
}

/// Find the boleto amount; the first pattern that parses wins.
pub fn extract_valor(text: &str) -> Option<f64> {
    RE_VALOR.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| parse_brl_amount(&caps[1]))
    })
}

/// Parse a Brazilian-locale amount (`1.234,56`) into a number.
pub fn parse_brl_amount(raw: &str) -> Option<f64> {
    raw.replace('.', "").replace(',', ".").parse::<f64>().ok()
}

/// Find the due date, normalized to `dd/mm/yyyy`.
pub fn extract_vencimento(text: &str) -> Option<String> {
    RE_VENCIMENTO.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = match caps[3].len() {
            2 => expand_two_digit_year(caps[3].parse().ok()?),
            _ => caps[3].parse().ok()?,
        };

        NaiveDate::from_ymd_opt(year, month, day)
            .map(|date| format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year()))
    })
}

/// POSIX century pivot: 69–99 map to 19xx, 00–68 to 20xx.
pub fn expand_two_digit_year(yy: i32) -> i32 {
    if yy >= 69 {
        1900 + yy
    } else {
        2000 + yy
    }
}

/// Find the beneficiary CNPJ, formatted as `XX.XXX.XXX/XXXX-XX`.
pub fn extract_cnpj(text: &str) -> Option<String> {
    RE_CNPJ.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
        (digits.len() == 14).then(|| format_cnpj(&digits))
    })
}

/// Format 14 bare digits as a CNPJ.
pub fn format_cnpj(digits: &str) -> String {
    format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    )
}

/// Find the agency number as printed.
pub fn extract_agencia(text: &str) -> Option<String> {
    RE_AGENCIA
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Blank out byte ranges already claimed by another field.
fn mask_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut masked = text.to_string();
    for span in spans {
        masked.replace_range(span.clone(), &" ".repeat(span.len()));
    }
    masked
}
