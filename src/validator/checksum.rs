//! FEBRABAN check digit arithmetic.
//!
//! All functions take ASCII digit strings and return `None` when the input
//! holds anything else.

fn digit_values(digits: &str) -> Option<Vec<u32>> {
    digits.chars().map(|c| c.to_digit(10)).collect()
}

/// Modulo-10 check digit used by the three linha digitável blocks.
///
/// Weights alternate 2,1,2,1… from the rightmost digit; products above 9
/// are replaced by the sum of their digits.
pub fn modulo10(digits: &str) -> Option<u32> {
    let values = digit_values(digits)?;
    let sum: u32 = values
        .iter()
        .rev()
        .zip([2u32, 1].iter().cycle())
        .map(|(&d, &weight)| {
            let product = d * weight;
            if product > 9 {
                product / 10 + product % 10
            } else {
                product
            }
        })
        .sum();

    Some(match sum % 10 {
        0 => 0,
        rest => 10 - rest,
    })
}

/// Modulo-11 check digit of the 43 código de barras digits around the DV.
///
/// Weights cycle 2..=9 from the rightmost digit; results 0, 10 and 11
/// collapse to 1.
pub fn modulo11(digits: &str) -> Option<u32> {
    let values = digit_values(digits)?;
    let sum: u32 = values
        .iter()
        .rev()
        .zip((2u32..=9).cycle())
        .map(|(&d, weight)| d * weight)
        .sum();

    Some(match 11 - sum % 11 {
        0 | 10 | 11 => 1,
        dv => dv,
    })
}

const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

fn cnpj_digit(values: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = values.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        rest if rest < 2 => 0,
        rest => 11 - rest,
    }
}

/// Both CNPJ check digits computed from the 12-digit base.
///
/// The second digit is weighted over the base followed by the computed
/// first digit, so a wrong first digit never shifts the expected second one.
/// Digits past the base are ignored.
pub fn cnpj_check_digits(digits: &str) -> Option<(u32, u32)> {
    let values = digit_values(digits)?;
    if values.len() < 12 {
        return None;
    }
    let mut base = values[..12].to_vec();
    let first = cnpj_digit(&base, &CNPJ_WEIGHTS_1);
    base.push(first);
    let second = cnpj_digit(&base, &CNPJ_WEIGHTS_2);
    Some((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulo10_known_values() {
        // Banco do Brasil sample field "001900000"
        assert_eq!(modulo10("001900000"), Some(9));
        assert_eq!(modulo10("0000000000"), Some(0));
        assert_eq!(modulo10("9"), Some(1));
        assert_eq!(modulo10("12a"), None);
    }

    #[test]
    fn test_modulo10_round_trip() {
        for prefix in ["001900000", "0123456789", "9876543210", "3419112345"] {
            let dv = modulo10(prefix).unwrap();
            let block = format!("{}{}", prefix, dv);
            let (body, check) = block.split_at(block.len() - 1);
            assert_eq!(modulo10(body).unwrap().to_string(), check);
        }
    }

    #[test]
    fn test_modulo11_collapses_to_one() {
        // 43 zeros: sum 0, 11 - 0 = 11 -> 1
        assert_eq!(modulo11(&"0".repeat(43)), Some(1));
    }

    #[test]
    fn test_modulo11_weights_wrap() {
        // Single 1 at position 9 from the right gets weight 2 again.
        let digits = format!("1{}", "0".repeat(8));
        // sum = 2, 11 - 2 = 9
        assert_eq!(modulo11(&digits), Some(9));
        // Rightmost digit weight 2: "5" -> 10, 11 - 10 = 1
        assert_eq!(modulo11("5"), Some(1));
        // "3" -> 6, 11 - 6 = 5
        assert_eq!(modulo11("3"), Some(5));
    }

    #[test]
    fn test_cnpj_check_digits() {
        assert_eq!(cnpj_check_digits("11222333000181"), Some((8, 1)));
        assert_eq!(cnpj_check_digits("112223330001"), Some((8, 1)));
        assert_eq!(cnpj_check_digits("1122233"), None);
    }
}
