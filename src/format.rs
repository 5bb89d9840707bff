//! Display helpers for money amounts: two decimals with a thousands
//! separator, and the reverse parse for user-typed figures.

/// `1234.5` becomes `"1 234.50"` (or `"1,234.50"` without `use_space`).
pub fn format_number(value: f64, use_space: bool) -> String {
    let separator = if use_space { ' ' } else { ',' };
    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

pub fn format_currency(value: f64, symbol: &str, use_space: bool) -> String {
    format!("{symbol}{}", format_number(value, use_space))
}

/// Reads back a figure typed with currency symbols or thousands
/// separators. Anything unparsable yields `default`.
pub fn parse_formatted_number(text: &str, default: f64) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | ',' | ' ' | '\u{a0}'))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}
