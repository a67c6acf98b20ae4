//! # Voucher Core
//!
//! Turns bank statement exports into standardized double-entry accounting
//! vouchers and prints them two or three to a sheet.
//!
//! ## Features
//!
//! - **Keyword classification**: ordered first-match rules with fallback accounts
//! - **Balanced vouchers**: contiguous numbering, half-to-even rounding, debit = credit by construction
//! - **Page layout**: fixed-capacity sheets with consistent cell geometry, including a trailing partial sheet
//! - **Statement ingestion**: CSV with UTF-8/GBK decoding and bank header aliases
//! - **PDF output**: one combined document or one file per voucher
//!
//! ## Quick Start
//!
//! ```rust
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//! use voucher_core::{build_vouchers, layout, AccountPair, AccountRef, LayoutSettings, MappingMatcher, MappingRule, Transaction};
//!
//! let rules = vec![MappingRule::new(
//!     "工资",
//!     AccountRef::parse("2211 应付职工薪酬"),
//!     AccountRef::parse("1002 银行存款"),
//! )];
//! let fallback = AccountPair::new(AccountRef::parse("1002 银行存款"), AccountRef::parse("2241 其他应付款"));
//! let matcher = MappingMatcher::new(&rules, &fallback);
//!
//! let rows = vec![Transaction::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!     "工资发放",
//!     BigDecimal::from(0),
//!     BigDecimal::from(5000),
//! )];
//! let vouchers = build_vouchers(&rows, &matcher, 1, 2).unwrap();
//! let pages = layout(vouchers, &LayoutSettings::new(3, 12.0, 6.0, 297.0)).unwrap();
//! assert_eq!(pages.len(), 1);
//! ```

pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod render;
pub mod traits;
pub mod types;
pub mod utils;
pub mod voucher;

// Re-export commonly used types
pub use config::*;
pub use pipeline::*;
pub use traits::*;
pub use types::*;
pub use voucher::*;

pub use utils::init_tracing;
