//! Field-level coercion and text normalization.

use compwatch_core::PriceRange;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

/// `true` if every comma in `s` separates a group of exactly three integer
/// digits. Comma decimals such as `"1.299,00"` or `"12,5"` fail.
fn commas_are_thousands(s: &str) -> bool {
    if !s.contains(',') {
        return true;
    }
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if frac_part.contains(',') {
        return false;
    }
    let mut groups = int_part.split(',');
    let head = groups.next().unwrap_or_default().trim_start_matches(['-', '+']);
    (1..=3).contains(&head.len())
        && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

/// Parses a price such as `"12.99"`, `"$1,299.00"` or `"EUR 15"`.
///
/// Commas are read as thousands separators only. A value that uses a comma
/// as the decimal mark is rejected rather than guessed at.
///
/// # Errors
///
/// Returns the rejection reason if the value is not a finite number, uses a
/// comma decimal mark, or lies outside `range`.
pub fn parse_price(raw: &str, range: Option<PriceRange>) -> Result<f64, String> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .trim_start_matches(|c: char| CURRENCY_SYMBOLS.contains(&c) || c.is_ascii_uppercase())
        .trim_end_matches(|c: char| CURRENCY_SYMBOLS.contains(&c) || c.is_ascii_uppercase())
        .trim();
    if !commas_are_thousands(stripped) {
        return Err(format!("ambiguous decimal separator in price '{trimmed}'"));
    }
    let digits: String = stripped
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();

    let value = digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid price '{trimmed}'"))?;

    if let Some(PriceRange { min, max }) = range {
        if value < min || value > max {
            return Err(format!("price {value} outside range [{min}, {max}]"));
        }
    }
    Ok(value)
}

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-cases each whitespace-separated word: `"men's clothing"` becomes
/// `"Men's Clothing"`.
#[must_use]
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// `None` for missing, empty or whitespace-only values.
#[must_use]
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_decorated_prices() {
        assert_eq!(parse_price("12.99", None), Ok(12.99));
        assert_eq!(parse_price(" $1,299.00 ", None), Ok(1299.0));
        assert_eq!(parse_price("€15", None), Ok(15.0));
        assert_eq!(parse_price("EUR 15.5", None), Ok(15.5));
        assert_eq!(parse_price("0", None), Ok(0.0));
    }

    #[test]
    fn garbage_and_non_finite_prices_are_rejected() {
        assert!(parse_price("abc", None).is_err());
        assert!(parse_price("", None).is_err());
        assert!(parse_price("NaN", None).is_err());
        assert!(parse_price("inf", None).is_err());
    }

    #[test]
    fn comma_decimal_prices_are_rejected() {
        for raw in ["1.299,00", "12,5", "€ 9,99", "1,2,3", "1,299.00,5"] {
            let err = parse_price(raw, None).unwrap_err();
            assert!(err.contains("ambiguous decimal separator"), "{raw}: {err}");
        }
        assert_eq!(parse_price("1,299", None), Ok(1299.0));
        assert_eq!(parse_price("12,345,678.5", None), Ok(12_345_678.5));
        assert_eq!(parse_price("-1,000", None), Ok(-1000.0));
    }

    #[test]
    fn range_is_inclusive() {
        let range = Some(PriceRange { min: 0.0, max: 100.0 });
        assert_eq!(parse_price("100", range), Ok(100.0));
        assert_eq!(parse_price("0", range), Ok(0.0));
        let err = parse_price("100.01", range).unwrap_err();
        assert!(err.contains("outside range"), "got: {err}");
        assert!(parse_price("-1", range).is_err());
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("men's clothing"), "Men's Clothing");
        assert_eq!(title_case("  ELECTRONICS  "), "Electronics");
        assert_eq!(title_case(&title_case("jewelery")), "Jewelery");
    }

    #[test]
    fn collapse_whitespace_normalizes_runs() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn present_treats_blank_as_missing() {
        assert_eq!(present(Some("  x ")), Some("x"));
        assert_eq!(present(Some("   ")), None);
        assert_eq!(present(None), None);
    }
}
