//! Traits at the seams between classification, layout and output

use crate::config::Settings;
use crate::types::*;

/// Resolves a bank description to the accounts its voucher posts to
///
/// Implementations must be pure: the same description always yields the same
/// match, and resolving never mutates shared state.
pub trait AccountResolver {
    /// Resolve a description to an account pair and report how it was chosen
    fn resolve(&self, description: &str) -> AccountMatch;
}

/// Output backend for laid-out voucher pages
///
/// Renderers receive the complete page sequence only after layout succeeded
/// for the whole run.
pub trait VoucherRenderer {
    /// Draw every page, in order
    fn render(&mut self, pages: &[Page], settings: &Settings) -> VoucherResult<()>;
}
