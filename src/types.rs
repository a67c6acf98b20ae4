//! Core types and data structures for the voucher system

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::format::{format_amount, format_voucher_date, format_voucher_number};

/// Summary printed on a voucher whose bank row carried no description
pub const DEFAULT_DESCRIPTION: &str = "银行流水";

/// Reference to a chart-of-accounts entry, e.g. `1002 银行存款`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "AccountSpec")]
pub struct AccountRef {
    /// Account code (may be empty when only a name is configured)
    pub code: String,
    /// Human-readable account name
    pub name: String,
}

impl AccountRef {
    /// Create an account reference from a code and a name
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Parse the single-string form used in configuration files.
    ///
    /// A leading numeric token is taken as the account code and the rest as
    /// the name; any other text is treated as a bare name.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let is_code = |token: &str| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit());

        match text.split_once(char::is_whitespace) {
            Some((code, name)) if is_code(code) => Self::new(code, name.trim()),
            None if is_code(text) => Self::new(text, ""),
            _ => Self::new("", text),
        }
    }

    /// Whether neither a code nor a name has been configured
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.name.is_empty()
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code.is_empty(), self.name.is_empty()) {
            (true, _) => write!(f, "{}", self.name),
            (false, true) => write!(f, "{}", self.code),
            (false, false) => write!(f, "{} {}", self.code, self.name),
        }
    }
}

/// Accepted spellings of an account in JSON documents
#[derive(Deserialize)]
#[serde(untagged)]
enum AccountSpec {
    Text(String),
    Detailed {
        #[serde(default)]
        code: String,
        #[serde(default)]
        name: String,
    },
}

impl From<AccountSpec> for AccountRef {
    fn from(spec: AccountSpec) -> Self {
        match spec {
            AccountSpec::Text(text) => AccountRef::parse(&text),
            AccountSpec::Detailed { code, name } => AccountRef::new(code, name),
        }
    }
}

/// A debit/credit account pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPair {
    pub debit: AccountRef,
    pub credit: AccountRef,
}

impl AccountPair {
    /// Create a new account pair
    pub fn new(debit: AccountRef, credit: AccountRef) -> Self {
        Self { debit, credit }
    }

    /// Split the pair into a `(debit, credit)` tuple
    pub fn into_tuple(self) -> (AccountRef, AccountRef) {
        (self.debit, self.credit)
    }
}

/// One bank statement row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// 1-based line in the source file, 0 when built in memory
    pub line: usize,
    /// Booking date
    pub date: NaiveDate,
    /// Free-text summary from the bank
    pub description: String,
    /// Magnitude in the statement's debit column
    pub debit_amount: BigDecimal,
    /// Magnitude in the statement's credit column
    pub credit_amount: BigDecimal,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        debit_amount: BigDecimal,
        credit_amount: BigDecimal,
    ) -> Self {
        Self {
            line: 0,
            date,
            description: description.into(),
            debit_amount,
            credit_amount,
        }
    }

    /// Record the source line this row was read from
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Whether both amount columns are zero
    pub fn is_zero(&self) -> bool {
        let zero = BigDecimal::from(0);
        self.debit_amount == zero && self.credit_amount == zero
    }
}

/// Keyword to account-pair classification rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Substring searched for in the transaction description
    pub keyword: String,
    pub debit_account: AccountRef,
    pub credit_account: AccountRef,
}

impl MappingRule {
    /// Create a new mapping rule
    pub fn new(keyword: impl Into<String>, debit_account: AccountRef, credit_account: AccountRef) -> Self {
        Self {
            keyword: keyword.into(),
            debit_account,
            credit_account,
        }
    }
}

/// How a voucher's accounts were chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    /// Matched the rule at `index` in configuration order
    Rule { index: usize, keyword: String },
    /// No rule matched; fallback accounts were used
    Fallback,
}

impl MatchSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, MatchSource::Fallback)
    }
}

/// Result of resolving a description against the rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMatch {
    pub accounts: AccountPair,
    pub source: MatchSource,
}

/// One side of a voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherLeg {
    pub account: AccountRef,
    pub amount: BigDecimal,
}

/// A numbered double-entry accounting record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Sequence number within the run
    pub number: u32,
    pub date: NaiveDate,
    /// Description copied from the bank row
    pub description: String,
    pub debit: VoucherLeg,
    pub credit: VoucherLeg,
    /// Decimal digits the amount was rounded to
    pub precision: u32,
    /// How the account pair was resolved
    pub source: MatchSource,
}

impl Voucher {
    /// The voucher amount (identical on both legs)
    pub fn amount(&self) -> &BigDecimal {
        &self.debit.amount
    }

    /// Check if the voucher is balanced (debit = credit)
    pub fn is_balanced(&self) -> bool {
        self.debit.amount == self.credit.amount
    }

    /// Number as printed, zero padded to three digits
    pub fn formatted_number(&self) -> String {
        format_voucher_number(self.number)
    }

    /// Date as printed, e.g. `2024年01月05日`
    pub fn formatted_date(&self) -> String {
        format_voucher_date(self.date)
    }

    /// Amount as printed, with thousands separators
    pub fn formatted_amount(&self) -> String {
        format_amount(self.amount(), self.precision)
    }

    /// Description as printed; blank bank summaries get a generic label
    pub fn display_description(&self) -> &str {
        let trimmed = self.description.trim();
        if trimmed.is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            trimmed
        }
    }
}

/// Rectangle reserved for one voucher, in millimetres from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// A voucher assigned to a slot on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// 0-based slot within the page
    pub slot: usize,
    pub cell: CellGeometry,
    pub voucher: Voucher,
}

/// One printed sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based page index within the run
    pub index: usize,
    /// Slots reserved on the sheet, filled or not
    pub capacity: usize,
    /// Height shared by every slot
    pub cell_height_mm: f64,
    pub placements: Vec<Placement>,
}

impl Page {
    /// Vouchers on this page in slot order
    pub fn vouchers(&self) -> impl Iterator<Item = &Voucher> {
        self.placements.iter().map(|p| &p.voucher)
    }

    /// Number of filled slots
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Whether some reserved slots are left unused
    pub fn is_partial(&self) -> bool {
        self.placements.len() < self.capacity
    }
}

/// Errors that can occur while turning statements into vouchers
#[derive(Debug, thiserror::Error)]
pub enum VoucherError {
    #[error("Invalid amount in transaction #{index} at line {line} ({description:?}): {reason}")]
    InvalidAmount {
        index: usize,
        /// Statement line of the row, 0 for rows built in memory
        line: usize,
        description: String,
        reason: String,
    },
    #[error("Invalid capacity: {0} vouchers per page (expected 2 or 3)")]
    InvalidCapacity(usize),
    #[error(
        "Layout overflow: cell {dimension} would be {computed_mm:.2} mm \
         (page {page_mm} mm, margin {margin_mm} mm, spacing {spacing_mm} mm)"
    )]
    LayoutOverflow {
        dimension: &'static str,
        computed_mm: f64,
        page_mm: f64,
        margin_mm: f64,
        spacing_mm: f64,
    },
    #[error("Voucher numbering overflow: starting at {start} cannot number {count} vouchers")]
    NumberingOverflow { start: u32, count: usize },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Statement error at line {line}: {message}")]
    Ingest { line: usize, message: String },
    #[error("Statement is missing required columns: {0}")]
    MissingColumns(String),
    #[error("Unable to decode statement: {0}")]
    Encoding(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for voucher operations
pub type VoucherResult<T> = Result<T, VoucherError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_account_ref_parse_code_and_name() {
        let account = AccountRef::parse("1002 银行存款");
        assert_eq!(account.code, "1002");
        assert_eq!(account.name, "银行存款");
        assert_eq!(account.to_string(), "1002 银行存款");
    }

    #[test]
    fn test_account_ref_parse_name_only() {
        let account = AccountRef::parse("管理费用-工资");
        assert_eq!(account.code, "");
        assert_eq!(account.to_string(), "管理费用-工资");

        let code_only = AccountRef::parse(" 6602 ");
        assert_eq!(code_only, AccountRef::new("6602", ""));
        assert_eq!(code_only.to_string(), "6602");
    }

    #[test]
    fn test_account_ref_deserialize_both_forms() {
        let from_text: AccountRef = serde_json::from_str("\"2211 应付职工薪酬\"").unwrap();
        let from_object: AccountRef =
            serde_json::from_str(r#"{"code": "2211", "name": "应付职工薪酬"}"#).unwrap();
        assert_eq!(from_text, from_object);
    }

    #[test]
    fn test_voucher_display_helpers() {
        let account = AccountRef::new("1002", "银行存款");
        let amount = BigDecimal::from_str("12345.60").unwrap();
        let voucher = Voucher {
            number: 7,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            description: "  ".to_string(),
            debit: VoucherLeg {
                account: account.clone(),
                amount: amount.clone(),
            },
            credit: VoucherLeg { account, amount },
            precision: 2,
            source: MatchSource::Fallback,
        };

        assert!(voucher.is_balanced());
        assert_eq!(voucher.formatted_number(), "007");
        assert_eq!(voucher.formatted_date(), "2024年01月05日");
        assert_eq!(voucher.formatted_amount(), "12,345.60");
        assert_eq!(voucher.display_description(), DEFAULT_DESCRIPTION);
    }
}
