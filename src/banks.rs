//! Bank code tables.

/// Display names of the banks the extractor recognizes.
const BANK_NAMES: &[(&str, &str)] = &[
    ("001", "Banco do Brasil"),
    ("033", "Santander"),
    ("077", "Banco Inter"),
    ("104", "Caixa Econômica Federal"),
    ("140", "Nu Invest"),
    ("197", "Stone Pagamentos"),
    ("237", "Bradesco"),
    ("260", "Nubank"),
    ("290", "PagSeguro"),
    ("341", "Itaú"),
    ("403", "Cora"),
    ("422", "Banco Safra"),
    ("748", "Sicredi"),
    ("756", "Bancoob"),
];

/// Bank codes accepted by FEBRABAN validation.
pub const KNOWN_BANK_CODES: &[&str] = &[
    "001", "033", "104", "237", "341", "748", "756", "077", "260", "290", "403", "422", "140",
    "197",
];

/// Display name for a bank code; unknown codes render as `Banco <code>`.
pub fn bank_name(code: &str) -> String {
    BANK_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("Banco {}", code))
}

/// Whether a bank code is in the known set.
pub fn is_known_bank(code: &str) -> bool {
    KNOWN_BANK_CODES.contains(&code)
}
