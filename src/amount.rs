use crate::schema::Cell;
use log::warn;

/// Parses heterogeneous numeric text into a signed amount. Total function:
/// any unparseable input degrades to 0.0 so a single bad cell never aborts
/// a normalization pass.
///
/// Handles currency symbols, thousands commas and parenthesized negatives.
/// European "1.234,56" formatting is not specifically handled; with both
/// separators present and more than two digits after the point the value
/// falls through to 0.0.
pub fn parse_amount(cell: Option<&Cell>) -> f64 {
    match cell {
        None | Some(Cell::Empty) => 0.0,
        Some(Cell::Number(n)) => *n,
        Some(Cell::Text(s)) => parse_amount_text(s),
    }
}

pub fn parse_amount_text(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let lowered = trimmed.to_lowercase();
    if matches!(lowered.as_str(), "nan" | "null" | "none") {
        return 0.0;
    }

    // Keep only characters that can carry numeric meaning.
    let mut cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '(' | ')' | '-'))
        .collect();

    // Parentheses in the original input mark a negative amount.
    let is_negative = trimmed.contains('(') && trimmed.contains(')');
    if is_negative {
        cleaned.retain(|c| c != '(' && c != ')');
    }

    cleaned = resolve_separators(cleaned);

    if cleaned.is_empty() {
        return 0.0;
    }

    let amount = match cleaned.parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            warn!("Could not convert amount '{}'", raw);
            return 0.0;
        }
    };

    if is_negative {
        -amount
    } else {
        amount
    }
}

/// Disambiguates comma/point usage. With both present the comma is a
/// thousands separator, but only when the fractional part after the point
/// has at most two digits. A lone comma is a decimal point when exactly one
/// occurs with at most two digits after it, otherwise a thousands separator.
fn resolve_separators(cleaned: String) -> String {
    let has_comma = cleaned.contains(',');
    let has_point = cleaned.contains('.');

    if has_comma && has_point {
        let parts: Vec<&str> = cleaned.split('.').collect();
        if parts.len() == 2 && parts[1].len() <= 2 {
            return format!("{}.{}", parts[0].replace(',', ""), parts[1]);
        }
        cleaned
    } else if has_comma {
        let parts: Vec<&str> = cleaned.split(',').collect();
        if parts.len() == 2 && parts[1].len() <= 2 {
            format!("{}.{}", parts[0], parts[1])
        } else {
            cleaned.replace(',', "")
        }
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_and_thousands() {
        assert_eq!(parse_amount_text("$1,234.56"), 1234.56);
        assert_eq!(parse_amount_text("1,234"), 1234.0);
        assert_eq!(parse_amount_text("$2,500,000.00"), 2_500_000.0);
    }

    #[test]
    fn test_parenthesized_negative() {
        assert_eq!(parse_amount_text("(500)"), -500.0);
        assert_eq!(parse_amount_text("($1,250.75)"), -1250.75);
    }

    #[test]
    fn test_unparseable_degrades_to_zero() {
        assert_eq!(parse_amount_text(""), 0.0);
        assert_eq!(parse_amount_text("abc"), 0.0);
        assert_eq!(parse_amount_text("   "), 0.0);
        assert_eq!(parse_amount_text("nan"), 0.0);
        assert_eq!(parse_amount_text("NULL"), 0.0);
        assert_eq!(parse_amount_text("none"), 0.0);
        assert_eq!(parse_amount_text("-"), 0.0);
    }

    #[test]
    fn test_single_comma_as_decimal_point() {
        assert_eq!(parse_amount_text("1234,56"), 1234.56);
        assert_eq!(parse_amount_text("17,5"), 17.5);
    }

    #[test]
    fn test_european_grouping_is_a_known_gap() {
        // Both separators with a long fractional segment fall through.
        assert_eq!(parse_amount_text("1.234,56"), 0.0);
    }

    #[test]
    fn test_plain_negative() {
        assert_eq!(parse_amount_text("-250.25"), -250.25);
    }

    #[test]
    fn test_cell_variants() {
        assert_eq!(parse_amount(None), 0.0);
        assert_eq!(parse_amount(Some(&Cell::Empty)), 0.0);
        assert_eq!(parse_amount(Some(&Cell::Number(-42.5))), -42.5);
        assert_eq!(parse_amount(Some(&Cell::from("$99.99"))), 99.99);
    }
}
