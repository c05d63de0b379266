//! Parsing and formatting of currency amounts typed by users.
//!
//! Amounts are whole currency units. Users may write `50k`, `1.5m`, `2_000`
//! or `1,000,000`; the result must be a non-negative integer.

use crate::errors::{Error, Result};

const SUFFIXES: [(char, i64); 4] = [
    ('k', 1_000),
    ('m', 1_000_000),
    ('b', 1_000_000_000),
    ('t', 1_000_000_000_000),
];

fn invalid(input: &str) -> Error {
    Error::InvalidAmount {
        input: input.to_string(),
    }
}

/// Parses a user-typed amount such as `50k` into whole units.
///
/// Fractions are only allowed together with a suffix and must land on a whole
/// number (`1.5k` is 1500, `1.0005k` is rejected).
pub fn parse_amount(input: &str) -> Result<i64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect::<String>()
        .to_lowercase();

    if cleaned.is_empty() {
        return Err(invalid(input));
    }

    let (number, multiplier) = match cleaned.chars().last() {
        Some(last) => SUFFIXES
            .iter()
            .find(|(suffix, _)| *suffix == last)
            .map_or((cleaned.as_str(), 1), |(_, m)| {
                (&cleaned[..cleaned.len() - last.len_utf8()], *m)
            }),
        None => return Err(invalid(input)),
    };

    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid(input));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid(input));
    }
    if !fraction.is_empty() && multiplier == 1 {
        return Err(invalid(input));
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid(input))?
    };
    let mut value = whole_value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid(input))?;

    // Scale the fractional digits one at a time so `1.5m` stays exact
    let mut scale = multiplier;
    for digit in fraction.chars() {
        if scale % 10 != 0 {
            if digit != '0' {
                return Err(invalid(input));
            }
            continue;
        }
        scale /= 10;
        let d = i64::from(digit.to_digit(10).ok_or_else(|| invalid(input))?);
        value = value
            .checked_add(d * scale)
            .ok_or_else(|| invalid(input))?;
    }

    Ok(value)
}

/// Formats an amount with thousands separators (`1234567` → `1,234,567`).
#[must_use]
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
