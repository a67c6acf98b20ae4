//! Output backends for laid-out voucher pages

pub mod pdf;

pub use pdf::*;
