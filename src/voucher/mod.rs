//! Voucher module containing classification, construction and page layout

pub mod builder;
pub mod layout;
pub mod matcher;

pub use builder::*;
pub use layout::*;
pub use matcher::*;
