use once_cell::sync::Lazy;
use regex::Regex;

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap());

/// Parses a currency-formatted amount such as `"$1,234.50"`, `"(1,000)"` or
/// `"$(1,000)"`.
///
/// Parentheses mark a negative value. Anything other than a plain decimal or
/// exponent number once currency marks are removed yields `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut cleaned = raw
        .replace(',', "")
        .replace('$', "")
        .replace('%', "")
        .replace("USD", "");
    cleaned.retain(|c| !c.is_whitespace());

    let (negative, body) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    if !AMOUNT.is_match(body) {
        return None;
    }

    let number: f64 = body.parse().ok()?;
    if !number.is_finite() {
        return None;
    }

    Some(if negative { -number } else { number })
}

/// Coerces a loose JSON cell into a number. Only finite numbers and parseable
/// strings survive; booleans, arrays and objects are unknown.
pub fn normalize_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Divides, returning `None` for an unknown operand or a zero denominator.
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let result = n / d;
    result.is_finite().then_some(result)
}

/// Formats an amount as `$1,234,567.89`, negatives as `-$1,234.00`.
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::new();
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, fraction)
}
