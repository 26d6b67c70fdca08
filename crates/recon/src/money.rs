//! Amount helpers. Stored amounts are integer cents, never floats.

use crate::error::ReconError;

/// Parse a decimal currency string into cents.
///
/// Accepts an optional sign, currency symbols (`¥`, `￥`, `$`), the `元`
/// suffix and `,` thousands separators. More than two decimal places is an
/// error rather than a silent rounding.
pub fn parse_amount(raw: &str) -> Result<i64, ReconError> {
    let err = |reason: &str| ReconError::AmountParse {
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '¥' | '￥' | '$' | '元' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Err(err("empty"));
    }

    let negative = cleaned.starts_with('-');
    let s = cleaned.trim_start_matches(['-', '+']);

    let (units, frac) = match s.split_once('.') {
        Some((u, f)) => (u, f),
        None => (s, ""),
    };
    if units.is_empty() && frac.is_empty() {
        return Err(err("no digits"));
    }
    if !units.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err("not a number"));
    }

    let units: i64 = if units.is_empty() {
        0
    } else {
        units.parse().map_err(|_| ReconError::AmountOverflow {
            value: raw.to_string(),
        })?
    };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| err("bad cents"))? * 10,
        2 => frac.parse().map_err(|_| err("bad cents"))?,
        _ => return Err(err("too many decimal places")),
    };

    let minor = units
        .checked_mul(100)
        .and_then(|u| u.checked_add(cents))
        .ok_or_else(|| ReconError::AmountOverflow {
            value: raw.to_string(),
        })?;
    Ok(if negative { -minor } else { minor })
}

/// Convert a floating amount (as found in JSON) to cents, rounding half away
/// from zero.
pub fn cents_from_f64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let cents = (value * 100.0).round();
    if cents.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    Some(cents as i64)
}

/// Render cents as a plain two-decimal amount, e.g. `219.67`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_decorated_amounts() {
        assert_eq!(parse_amount("219.67").unwrap(), 21967);
        assert_eq!(parse_amount("¥1,024.5").unwrap(), 102450);
        assert_eq!(parse_amount("88元").unwrap(), 8800);
        assert_eq!(parse_amount("-3.05").unwrap(), -305);
        assert_eq!(parse_amount(".5").unwrap(), 50);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("12.345").is_err());
        assert!(parse_amount("12a").is_err());
        assert!(parse_amount(".").is_err());
        assert!(matches!(
            parse_amount("99999999999999999999"),
            Err(ReconError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn float_conversion_rounds() {
        assert_eq!(cents_from_f64(219.67), Some(21967));
        assert_eq!(cents_from_f64(0.005), Some(1));
        assert_eq!(cents_from_f64(f64::NAN), None);
    }

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_cents(21967), "219.67");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-1050), "-10.50");
    }
}
