use thiserror::Error;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a human-readable amount.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount must not be negative")]
    Negative,

    #[error("invalid amount format")]
    InvalidFormat,

    #[error("amount is too large")]
    Overflow,
}

/// Parse a non-negative decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000, ".5" -> 50.
/// Digits beyond the second decimal place are truncated.
pub fn parse_amount(input: &str) -> Result<Cents, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    if input.starts_with('-') {
        return Err(ParseAmountError::Negative);
    }
    let input = input.strip_prefix('+').unwrap_or(input);

    let (units_str, decimals_str) = match input.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (input, ""),
    };

    if units_str.is_empty() && decimals_str.is_empty() {
        return Err(ParseAmountError::InvalidFormat);
    }
    if !is_digits(units_str) || !is_digits(decimals_str) {
        return Err(ParseAmountError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseAmountError::Overflow)?
    };

    // Pad to exactly two digits: "5" -> 50 cents, "05" -> 5 cents, "999" -> 99 cents
    let fraction: i64 = decimals_str
        .chars()
        .chain(std::iter::repeat('0'))
        .take(2)
        .fold(0, |acc, c| acc * 10 + i64::from(c as u8 - b'0'));

    units
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction))
        .ok_or(ParseAmountError::Overflow)
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}
