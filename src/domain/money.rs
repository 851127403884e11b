use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For EUR/USD, 1 unit = 100 cents, so €50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a plain decimal string, without thousand separators.
/// Example: 123456 -> "1234.56", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
/// Digits beyond the second decimal place are truncated.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, decimal_str) = digits.split_once('.').unwrap_or((digits, ""));
    if (units_str.is_empty() && decimal_str.is_empty())
        || decimal_str.contains('.')
        || !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimal_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        // "5" means 50 cents
        1 => i64::from(decimal_str.as_bytes()[0] - b'0') * 10,
        _ => decimal_str[..2]
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

/// `part / whole * 100`, or `0` when `whole` is not positive.
///
/// A zero denominator never raises: "no transactions" and "zero-value
/// transactions" both come out as `0`.
pub fn percentage_of(part: Cents, whole: Cents) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Relative change from `baseline` to `current`, in percent, measured against
/// `|baseline|` so a negative baseline does not flip the sign of the result.
pub fn change_pct(baseline: Cents, current: Cents) -> f64 {
    if baseline == 0 {
        return 0.0;
    }
    // Subtract in floating point: the i64 difference can overflow
    (current as f64 - baseline as f64) / baseline.unsigned_abs() as f64 * 100.0
}

/// Average amount per transaction in whole cents, `0` when there are none.
pub fn average_cents(total: Cents, count: i64) -> Cents {
    if count > 0 { total / count } else { 0 }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::Overflow => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(123456), "1234.56");
        assert_eq!(format_cents(100), "1.00");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
        assert_eq!(format_cents(100_000_000), "1000000.00");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents(" 1234.56 "), Ok(123456));
        assert_eq!(parse_cents("100.999"), Ok(10099)); // Truncates
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert!(parse_cents("abc").is_err());
        assert!(parse_cents("12.34.56").is_err());
        assert!(parse_cents("1,234.56").is_err());
        assert!(parse_cents("").is_err());
        assert!(parse_cents(".").is_err());
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::InvalidFormat)
        );
    }

    #[test]
    fn test_formatted_amounts_parse_back() {
        for cents in [0, 7, -7, 123456, -99999] {
            assert_eq!(parse_cents(&format_cents(cents)), Ok(cents));
        }
    }

    #[test]
    fn test_percentage_guards_zero_denominator() {
        assert_eq!(percentage_of(300, 1000), 30.0);
        assert_eq!(percentage_of(300, 0), 0.0);
        assert_eq!(percentage_of(0, 0), 0.0);
        assert_eq!(percentage_of(300, -10), 0.0);
    }

    #[test]
    fn test_change_pct_uses_absolute_baseline() {
        assert_eq!(change_pct(1000, 1500), 50.0);
        assert_eq!(change_pct(200, 100), -50.0);
        // Loss shrinking from -200 to -100 is an improvement
        assert_eq!(change_pct(-200, -100), 50.0);
        assert_eq!(change_pct(0, 500), 0.0);
        let swing = change_pct(i64::MIN, i64::MAX);
        assert!(swing.is_finite() && (swing - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_cents() {
        assert_eq!(average_cents(1000, 4), 250);
        assert_eq!(average_cents(1000, 3), 333);
        assert_eq!(average_cents(1000, 0), 0);
    }
}
