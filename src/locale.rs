//! Brazilian Portuguese number and date formats.

use chrono::NaiveDate;

/// Format an amount as `R$ 1.234,56`.
pub fn format_brl(valor: f64) -> String {
    let cents = (valor.abs() * 100.0).round() as u64;
    let reais = (cents / 100).to_string();
    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, ch) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if valor < 0.0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, cents % 100)
}

/// Parse a `dd/mm/yyyy` date.
pub fn parse_br_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}
