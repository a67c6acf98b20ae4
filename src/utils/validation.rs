//! Validation utilities

use crate::types::*;

/// Voucher capacities a printed sheet supports
pub const SUPPORTED_CAPACITIES: [usize; 2] = [2, 3];

/// Largest number of decimal digits amounts may be rounded to
pub const MAX_AMOUNT_PRECISION: u32 = 18;

/// Validate that voucher numbering starts at 1 or above
pub fn validate_start_number(start_number: u32) -> VoucherResult<()> {
    if start_number == 0 {
        return Err(VoucherError::Config(
            "start_number must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Validate the number of vouchers printed per sheet
pub fn validate_capacity(capacity: usize) -> VoucherResult<()> {
    if SUPPORTED_CAPACITIES.contains(&capacity) {
        Ok(())
    } else {
        Err(VoucherError::InvalidCapacity(capacity))
    }
}

/// Validate the number of decimal digits amounts are rounded to
pub fn validate_amount_precision(precision: u32) -> VoucherResult<()> {
    if precision > MAX_AMOUNT_PRECISION {
        return Err(VoucherError::Config(format!(
            "amount_precision must be at most {}, got {}",
            MAX_AMOUNT_PRECISION, precision
        )));
    }
    Ok(())
}

/// Validate that a page dimension is a finite, positive number of millimetres
pub fn validate_positive_mm(name: &str, value: f64) -> VoucherResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(VoucherError::Config(format!(
            "{} must be a positive number of millimetres, got {}",
            name, value
        )))
    }
}

/// Validate a fallback account reference
pub fn validate_fallback_account(name: &str, account: &AccountRef) -> VoucherResult<()> {
    if account.is_empty() {
        return Ok(());
    }

    if account.to_string().chars().any(char::is_control) {
        return Err(VoucherError::Config(format!(
            "{} cannot contain control characters",
            name
        )));
    }

    Ok(())
}
