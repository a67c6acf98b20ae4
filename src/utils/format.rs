//! Display formatting for printed vouchers

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Round to `precision` decimal digits, ties to even
pub fn round_amount(amount: &BigDecimal, precision: u32) -> BigDecimal {
    amount.with_scale_round(i64::from(precision), RoundingMode::HalfEven)
}

/// Format an amount with `,` thousands separators and exactly `precision`
/// decimal digits (en locale, e.g. `1,234.50`).
pub fn format_amount(amount: &BigDecimal, precision: u32) -> String {
    let rounded = round_amount(amount, precision);
    let negative = rounded < BigDecimal::from(0);
    let digits = rounded.abs().to_string();

    let (integer_part, fraction_part) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let grouped = integer_part
        .parse::<u128>()
        .map(|value| value.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| integer_part.to_string());

    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        formatted.push('-');
    }
    formatted.push_str(&grouped);
    if let Some(fraction) = fraction_part {
        formatted.push('.');
        formatted.push_str(fraction);
    }
    formatted
}

/// Voucher number as printed (`001`, `042`, `1234`)
pub fn format_voucher_number(number: u32) -> String {
    format!("{:03}", number)
}

/// Voucher date as printed (`2024年01月05日`)
pub fn format_voucher_date(date: NaiveDate) -> String {
    date.format("%Y年%m月%d日").to_string()
}
