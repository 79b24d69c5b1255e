//! Locale-aware (pt-BR) number parsing and formatting.
//!
//! Parsing is lenient: anything that does not read as a number becomes zero,
//! so a stray character in a price field never aborts a recalculation.
//! Callers that need strict validation should use [`parse_number_strict`].

use std::str::FromStr;

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Currency prefix used by [`format_currency`].
pub const CURRENCY_SYMBOL: &str = "R$";

/// Parse a pt-BR formatted number, returning `None` when it is not numeric.
///
/// Accepts an optional `R$` prefix, an optional `%` suffix, `.` as thousands
/// separator and `,` as decimal separator. A string without any comma is read
/// as a plain decimal (`"1234.5"`), so machine-written values also parse.
pub fn parse_number_strict(input: &str) -> Option<Decimal> {
    let cleaned: String = input
        .trim()
        .trim_start_matches(CURRENCY_SYMBOL)
        .trim_end_matches('%')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    Decimal::from_str(&normalized).ok()
}

/// Parse a pt-BR formatted number, coercing malformed input to zero.
pub fn parse_number(input: &str) -> Decimal {
    match parse_number_strict(input) {
        Some(value) => value,
        None => {
            if !input.trim().is_empty() {
                tracing::debug!("Coercing non-numeric input {:?} to zero", input);
            }
            Decimal::ZERO
        }
    }
}

/// Parse a pt-BR number and clamp negatives to zero.
pub fn parse_non_negative(input: &str) -> Decimal {
    clamp_non_negative(parse_number(input))
}

/// Clamp a value to zero from below.
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    if value.is_sign_negative() {
        Decimal::ZERO
    } else {
        value
    }
}

/// Largest quantity, price, rate or percentage accepted from input.
///
/// Products of bounded inputs stay well inside the `Decimal` range for any
/// realistic budget; totals beyond it saturate instead of overflowing.
pub const MAX_INPUT_VALUE: Decimal = dec!(1000000000000);

/// Clamp an input value to `[0, MAX_INPUT_VALUE]`.
pub fn clamp_input(value: Decimal) -> Decimal {
    if value > MAX_INPUT_VALUE {
        tracing::warn!("Value {} above {} clamped", value, MAX_INPUT_VALUE);
        return MAX_INPUT_VALUE;
    }
    clamp_non_negative(value)
}

/// Format a number with `places` decimals, `.` thousands and `,` decimals.
pub fn format_decimal(value: Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (text.as_str(), ""),
    };

    let mut out = String::with_capacity(text.len() + 8);
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));

    if places > 0 {
        out.push(',');
        let mut frac: String = frac_part.chars().take(places as usize).collect();
        while frac.len() < places as usize {
            frac.push('0');
        }
        out.push_str(&frac);
    }

    out
}

/// Format an amount of money as `R$ 1.234,56`.
pub fn format_currency(value: Decimal) -> String {
    let body = format_decimal(value.abs(), 2);
    let negative = value.round_dp(2).is_sign_negative() && !value.round_dp(2).is_zero();
    if negative {
        format!("-{} {}", CURRENCY_SYMBOL, body)
    } else {
        format!("{} {}", CURRENCY_SYMBOL, body)
    }
}

/// Format a percent value (25 = 25 %) as `25,00%`.
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_decimal(value, 2))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
