//! Normalization of formatted market figures (`"$1.2B"`, `"45.3M"`).

use rust_decimal::Decimal;
use std::str::FromStr;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Multiplier for a magnitude suffix.
fn suffix_multiplier(suffix: char) -> Option<Decimal> {
    match suffix.to_ascii_uppercase() {
        'K' => Some(Decimal::from(1_000u64)),
        'M' => Some(Decimal::from(1_000_000u64)),
        'B' => Some(Decimal::from(1_000_000_000u64)),
        'T' => Some(Decimal::from(1_000_000_000_000u64)),
        _ => None,
    }
}

/// Parse a formatted figure into a plain number.
///
/// Strips whitespace, currency symbols, thousands separators, a leading
/// `+` and a trailing `%`, then expands a `K`/`M`/`B`/`T` suffix. The
/// arithmetic is done in decimal so `"1.2B"` is exactly `1_200_000_000`.
///
/// Returns `None` when nothing numeric remains.
pub fn normalize(raw: &str) -> Option<f64> {
    // Going through the decimal text keeps "875.28" the same f64 as the literal.
    let value = normalize_decimal(raw)?;
    f64::from_str(&value.normalize().to_string()).ok()
}

/// Like [`normalize`], but keeps the exact decimal value.
pub fn normalize_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    let cleaned = cleaned.strip_suffix('%').unwrap_or(&cleaned);
    let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned);

    let (digits, multiplier) = match cleaned.chars().last() {
        Some(last) => match suffix_multiplier(last) {
            Some(m) => (&cleaned[..cleaned.len() - last.len_utf8()], m),
            None => (cleaned, Decimal::ONE),
        },
        None => return None,
    };

    // "-$5" arrives here as "-5" since the symbol was stripped above.
    let value = Decimal::from_str(digits).ok()?;
    value.checked_mul(multiplier)
}

/// Parse a formatted figure, falling back to `0.0` when it is not numeric.
pub fn normalize_or_zero(raw: &str) -> f64 {
    normalize(raw).unwrap_or_else(|| {
        tracing::debug!(raw, "Unparseable numeric value, using 0");
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_suffix_expansion() {
        assert_eq!(normalize("45.3K"), Some(45_300.0));
        assert_eq!(normalize("45.3M"), Some(45_300_000.0));
        assert_eq!(normalize("134.2M"), Some(134_200_000.0));
        assert_eq!(normalize("1.2B"), Some(1_200_000_000.0));
        assert_eq!(normalize("2.16T"), Some(2_160_000_000_000.0));
    }

    #[test]
    fn test_currency_and_separators() {
        assert_eq!(normalize("$1.2B"), Some(1_200_000_000.0));
        assert_eq!(normalize("$192B"), Some(192_000_000_000.0));
        assert_eq!(normalize("1,234.5"), Some(1234.5));
        assert_eq!(normalize(" € 12 "), Some(12.0));
    }

    #[test]
    fn test_signs_and_percent() {
        assert_eq!(normalize("-3.21%"), Some(-3.21));
        assert_eq!(normalize("+2.76%"), Some(2.76));
        assert_eq!(normalize("-$5"), Some(-5.0));
    }

    #[test]
    fn test_decimal_is_exact() {
        assert_eq!(normalize_decimal("$1.2B"), Some(dec!(1200000000)));
        assert_eq!(normalize_decimal("0.1K"), Some(dec!(100)));
        assert_eq!(normalize_decimal("-3.21%"), Some(dec!(-3.21)));
        assert_eq!(normalize_decimal("abc"), None);
    }

    #[test]
    fn test_lowercase_suffix() {
        assert_eq!(normalize("8.7m"), Some(8_700_000.0));
    }

    #[test]
    fn test_plain_number() {
        assert_eq!(normalize("875.28"), Some(875.28));
    }

    #[test]
    fn test_not_numeric() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("$"), None);
        assert_eq!(normalize("N/A"), None);
        assert_eq!(normalize("M"), None);
        assert_eq!(normalize_or_zero("N/A"), 0.0);
    }

    #[test]
    fn test_suffix_ordering_is_by_magnitude() {
        // "$1.75T" must outrank "$790B".
        let trillion = normalize("$1.75T").unwrap();
        let billion = normalize("$790B").unwrap();
        assert!(trillion > billion);
    }
}
