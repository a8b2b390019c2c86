use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// Amounts as printed on the statement: `1.234,56`, `50,00`, `1.234,56-`.
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d{1,3}(?:\.\d{3})+|\d+)(?:,\d+)?-?").expect("valid amount regex")
});

/// Normalize an amount cell into a Decimal.
///
/// Handles formats like:
/// - "1.234,56" -> 1234.56 (dot thousands, comma decimals)
/// - "1.234,56-" -> -1234.56 (trailing minus)
/// - "$ 50,00" -> 50.00
/// - "1.000" -> 1000 (a lone dot followed by three digits groups thousands)
/// - "1234.56" -> 1234.56 (already normalized)
///
/// Returns None when the cell is empty or not a number.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$')
        .collect();

    let (negative, unsigned) = if let Some(rest) = compact.strip_suffix('-') {
        (true, rest)
    } else if let Some(rest) = compact.strip_prefix('-') {
        (true, rest)
    } else {
        (false, compact.strip_prefix('+').unwrap_or(&compact))
    };

    if unsigned.is_empty() {
        return None;
    }

    let plain = if unsigned.contains(',') {
        unsigned.replace('.', "").replace(',', ".")
    } else {
        let dots = unsigned.matches('.').count();
        let groups_thousands = dots > 1
            || unsigned
                .split_once('.')
                .is_some_and(|(_, frac)| frac.len() == 3);
        if groups_thousands {
            unsigned.replace('.', "")
        } else {
            unsigned.to_string()
        }
    };

    let value = Decimal::from_str(&plain).ok()?;
    Some(if negative { -value } else { value })
}

/// Find every amount-looking substring in a line, left to right.
pub fn find_amounts(text: &str) -> Vec<&str> {
    AMOUNT_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// True if the text contains something that could be an amount.
pub fn looks_numeric(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-' | '+' | '$' | ' '))
}
