//! Voucher construction from classified bank rows

use bigdecimal::BigDecimal;

use crate::traits::*;
use crate::types::*;
use crate::utils::format::round_amount;

/// Build numbered, balanced vouchers from `transactions`.
///
/// Rows whose amount is zero (before or after rounding to `precision` digits,
/// ties to even) are skipped. Every other row becomes one voucher, numbered
/// contiguously from `start_number` in input order. The whole batch fails on
/// the first row with a negative amount or with both columns filled.
pub fn build_vouchers<R: AccountResolver + ?Sized>(
    transactions: &[Transaction],
    resolver: &R,
    start_number: u32,
    precision: u32,
) -> VoucherResult<Vec<Voucher>> {
    VoucherBuilder::new(resolver)
        .start_number(start_number)
        .precision(precision)
        .build(transactions)
}

/// Voucher builder configured with a resolver, numbering and precision
pub struct VoucherBuilder<'r, R: AccountResolver + ?Sized> {
    resolver: &'r R,
    start_number: u32,
    precision: u32,
}

impl<'r, R: AccountResolver + ?Sized> VoucherBuilder<'r, R> {
    /// Create a builder numbering from 1 at two decimal digits
    pub fn new(resolver: &'r R) -> Self {
        Self {
            resolver,
            start_number: 1,
            precision: 2,
        }
    }

    /// Set the number of the first voucher
    pub fn start_number(mut self, start_number: u32) -> Self {
        self.start_number = start_number;
        self
    }

    /// Set the number of decimal digits amounts are rounded to
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Build the vouchers
    pub fn build(&self, transactions: &[Transaction]) -> VoucherResult<Vec<Voucher>> {
        let mut vouchers = Vec::with_capacity(transactions.len());

        for (index, transaction) in transactions.iter().enumerate() {
            let Some(magnitude) = effective_magnitude(index, transaction)? else {
                tracing::debug!(index, line = transaction.line, "skipping zero-amount row");
                continue;
            };

            let amount = round_amount(magnitude, self.precision);
            if amount == BigDecimal::from(0) {
                tracing::warn!(
                    index,
                    line = transaction.line,
                    amount = %magnitude,
                    precision = self.precision,
                    "skipping row that rounds to zero"
                );
                continue;
            }

            let number = self.next_number(vouchers.len())?;
            let resolved = self.resolver.resolve(&transaction.description);

            vouchers.push(Voucher {
                number,
                date: transaction.date,
                description: transaction.description.clone(),
                debit: VoucherLeg {
                    account: resolved.accounts.debit,
                    amount: amount.clone(),
                },
                credit: VoucherLeg {
                    account: resolved.accounts.credit,
                    amount,
                },
                precision: self.precision,
                source: resolved.source,
            });
        }

        Ok(vouchers)
    }

    fn next_number(&self, issued: usize) -> VoucherResult<u32> {
        u32::try_from(issued)
            .ok()
            .and_then(|offset| self.start_number.checked_add(offset))
            .ok_or(VoucherError::NumberingOverflow {
                start: self.start_number,
                count: issued + 1,
            })
    }
}

/// The non-zero column of a row, `None` when both are zero
fn effective_magnitude(index: usize, transaction: &Transaction) -> VoucherResult<Option<&BigDecimal>> {
    let zero = BigDecimal::from(0);
    let debit = &transaction.debit_amount;
    let credit = &transaction.credit_amount;

    let invalid = |reason: String| VoucherError::InvalidAmount {
        index,
        line: transaction.line,
        description: transaction.description.clone(),
        reason,
    };

    if *debit < zero || *credit < zero {
        return Err(invalid(format!(
            "amounts must not be negative (debit {}, credit {})",
            debit, credit
        )));
    }

    match (*debit != zero, *credit != zero) {
        (false, false) => Ok(None),
        (true, false) => Ok(Some(debit)),
        (false, true) => Ok(Some(credit)),
        (true, true) => Err(invalid(format!(
            "both debit ({}) and credit ({}) columns are filled",
            debit, credit
        ))),
    }
}
