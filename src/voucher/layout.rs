//! Pagination and in-page geometry for printed vouchers
//!
//! All coordinates are millimetres measured from the top-left corner of the
//! sheet. Every slot on every page has the same height, so a trailing partial
//! page keeps the fold and cut lines of the full ones.

use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::validation::validate_capacity;

/// A4 portrait width
pub const A4_WIDTH_MM: f64 = 210.0;
/// A4 portrait height
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Sheet geometry used to place vouchers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Vouchers per sheet, 2 or 3
    pub capacity: usize,
    pub margin_mm: f64,
    /// Vertical gap between adjacent cells
    pub spacing_mm: f64,
    pub page_height_mm: f64,
    pub page_width_mm: f64,
}

impl LayoutSettings {
    /// Create settings for an A4-wide sheet
    pub fn new(capacity: usize, margin_mm: f64, spacing_mm: f64, page_height_mm: f64) -> Self {
        Self {
            capacity,
            margin_mm,
            spacing_mm,
            page_height_mm,
            page_width_mm: A4_WIDTH_MM,
        }
    }

    /// Override the sheet width
    pub fn with_page_width(mut self, page_width_mm: f64) -> Self {
        self.page_width_mm = page_width_mm;
        self
    }

    /// Height shared by every slot on a sheet
    pub fn cell_height_mm(&self) -> VoucherResult<f64> {
        validate_capacity(self.capacity)?;

        let slots = self.capacity as f64;
        let height = (self.page_height_mm - 2.0 * self.margin_mm - (slots - 1.0) * self.spacing_mm)
            / slots;
        self.ensure_positive("height", height, self.page_height_mm)
    }

    /// Width of every cell
    pub fn cell_width_mm(&self) -> VoucherResult<f64> {
        let width = self.page_width_mm - 2.0 * self.margin_mm;
        self.ensure_positive("width", width, self.page_width_mm)
    }

    /// Top edge of the slot at `slot` (0-based)
    pub fn slot_origin_mm(&self, slot: usize, cell_height_mm: f64) -> f64 {
        self.margin_mm + slot as f64 * (cell_height_mm + self.spacing_mm)
    }

    fn ensure_positive(&self, dimension: &'static str, value: f64, page_mm: f64) -> VoucherResult<f64> {
        // NaN fails this comparison too.
        if value > 0.0 {
            Ok(value)
        } else {
            Err(VoucherError::LayoutOverflow {
                dimension,
                computed_mm: value,
                page_mm,
                margin_mm: self.margin_mm,
                spacing_mm: self.spacing_mm,
            })
        }
    }
}

/// Number of sheets needed for `voucher_count` vouchers
pub fn page_count(voucher_count: usize, capacity: usize) -> VoucherResult<usize> {
    validate_capacity(capacity)?;
    Ok(voucher_count.div_ceil(capacity))
}

/// Group vouchers into sheets of `settings.capacity` and place each one.
///
/// Geometry is validated before any page is produced. The last page may hold
/// fewer vouchers than its capacity; it is not padded.
pub fn layout(vouchers: Vec<Voucher>, settings: &LayoutSettings) -> VoucherResult<Vec<Page>> {
    let cell_height_mm = settings.cell_height_mm()?;
    let cell_width_mm = settings.cell_width_mm()?;
    let capacity = settings.capacity;

    let mut pages = Vec::with_capacity(page_count(vouchers.len(), capacity)?);
    let mut remaining = vouchers.into_iter().peekable();

    while remaining.peek().is_some() {
        let placements = remaining
            .by_ref()
            .take(capacity)
            .enumerate()
            .map(|(slot, voucher)| Placement {
                slot,
                cell: CellGeometry {
                    x_mm: settings.margin_mm,
                    y_mm: settings.slot_origin_mm(slot, cell_height_mm),
                    width_mm: cell_width_mm,
                    height_mm: cell_height_mm,
                },
                voucher,
            })
            .collect();

        pages.push(Page {
            index: pages.len(),
            capacity,
            cell_height_mm,
            placements,
        });
    }

    tracing::debug!(
        pages = pages.len(),
        capacity,
        cell_height_mm,
        "laid out voucher pages"
    );

    Ok(pages)
}

/// Cell covering the whole printable area, for one voucher per sheet
pub fn single_page_cell(settings: &LayoutSettings) -> VoucherResult<CellGeometry> {
    let height_mm = settings.page_height_mm - 2.0 * settings.margin_mm;
    let height_mm = settings.ensure_positive("height", height_mm, settings.page_height_mm)?;
    let width_mm = settings.cell_width_mm()?;

    Ok(CellGeometry {
        x_mm: settings.margin_mm,
        y_mm: settings.margin_mm,
        width_mm,
        height_mm,
    })
}
