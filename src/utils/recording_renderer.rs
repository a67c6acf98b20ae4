//! In-memory renderer for testing

use crate::config::Settings;
use crate::traits::VoucherRenderer;
use crate::types::*;

/// Renderer that keeps a copy of every page it is given
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pages: Vec<Page>,
    renders: usize,
}

impl RecordingRenderer {
    /// Create an empty recording renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages received by the most recent render
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of times render was called
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Clear all data (useful for testing)
    pub fn clear(&mut self) {
        self.pages.clear();
        self.renders = 0;
    }
}

impl VoucherRenderer for RecordingRenderer {
    fn render(&mut self, pages: &[Page], _settings: &Settings) -> VoucherResult<()> {
        self.pages = pages.to_vec();
        self.renders += 1;
        Ok(())
    }
}
