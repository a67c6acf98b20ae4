//! PDF output via printpdf
//!
//! Layout coordinates are measured from the top of the sheet; PDF space
//! starts at the bottom-left corner. [`CellFrame`] does the conversion so the
//! drawing code can work top-down.

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::traits::VoucherRenderer;
use crate::types::*;
use crate::voucher::single_page_cell;

const LAYER_NAME: &str = "vouchers";
const DOCUMENT_TITLE: &str = "记账凭证";
const PADDING_MM: f64 = 6.0;
const LINE_HEIGHT_MM: f64 = 6.0;
const PT_TO_MM: f64 = 25.4 / 72.0;
const SIGNATURE_LABELS: [&str; 5] = ["制单", "审核", "出纳", "记账", "复核"];

fn render_error<E: std::fmt::Debug>(err: E) -> VoucherError {
    VoucherError::Render(format!("{:?}", err))
}

/// Writes every page of a run into one PDF file
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    output: PathBuf,
}

impl PdfRenderer {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl VoucherRenderer for PdfRenderer {
    fn render(&mut self, pages: &[Page], settings: &Settings) -> VoucherResult<()> {
        if pages.is_empty() {
            return Err(VoucherError::Render("no voucher pages to render".to_string()));
        }

        let mut sheets = Sheets::new(settings);
        let font = load_font(&sheets.doc, settings)?;

        for page in pages {
            let layer = sheets.next_layer();
            for placement in &page.placements {
                let frame = CellFrame::new(&placement.cell, settings.page_height_mm);
                draw_voucher(&layer, &font, &frame, &placement.voucher, settings);
            }
        }

        save(sheets.doc, &self.output)?;
        tracing::info!(
            path = %self.output.display(),
            pages = pages.len(),
            "wrote voucher PDF"
        );
        Ok(())
    }
}

/// Writes each voucher to its own full-page PDF, `voucher_NNN.pdf`
#[derive(Debug, Clone)]
pub struct SingleVoucherPdfRenderer {
    output_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl SingleVoucherPdfRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            written: Vec::new(),
        }
    }

    /// Files written by the last render, in voucher order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// File name used for a voucher
    pub fn file_name(voucher: &Voucher) -> String {
        format!("voucher_{}.pdf", voucher.formatted_number())
    }
}

impl VoucherRenderer for SingleVoucherPdfRenderer {
    fn render(&mut self, pages: &[Page], settings: &Settings) -> VoucherResult<()> {
        let cell = single_page_cell(&settings.layout())?;
        fs::create_dir_all(&self.output_dir)?;
        self.written.clear();

        for voucher in pages.iter().flat_map(Page::vouchers) {
            let mut sheets = Sheets::new(settings);
            let font = load_font(&sheets.doc, settings)?;
            let layer = sheets.next_layer();
            draw_voucher(
                &layer,
                &font,
                &CellFrame::new(&cell, settings.page_height_mm),
                voucher,
                settings,
            );

            let path = self.output_dir.join(Self::file_name(voucher));
            save(sheets.doc, &path)?;
            self.written.push(path);
        }

        tracing::info!(
            dir = %self.output_dir.display(),
            files = self.written.len(),
            "wrote single voucher PDFs"
        );
        Ok(())
    }
}

/// A document plus the sheets handed out so far
struct Sheets {
    doc: PdfDocumentReference,
    first: Option<(printpdf::PdfPageIndex, printpdf::PdfLayerIndex)>,
    width: Mm,
    height: Mm,
}

impl Sheets {
    fn new(settings: &Settings) -> Self {
        let width = Mm(settings.page_width_mm as f32);
        let height = Mm(settings.page_height_mm as f32);
        let (doc, page, layer) = PdfDocument::new(DOCUMENT_TITLE, width, height, LAYER_NAME);
        Self {
            doc,
            first: Some((page, layer)),
            width,
            height,
        }
    }

    /// The document's first sheet on the first call, a new sheet afterwards
    fn next_layer(&mut self) -> PdfLayerReference {
        let (page, layer) = match self.first.take() {
            Some(first) => first,
            None => self.doc.add_page(self.width, self.height, LAYER_NAME),
        };
        self.doc.get_page(page).get_layer(layer)
    }
}

fn load_font(doc: &PdfDocumentReference, settings: &Settings) -> VoucherResult<IndirectFontRef> {
    if let Some(path) = &settings.font_path {
        match File::open(path) {
            Ok(file) => {
                tracing::debug!(path = %path.display(), "using configured font");
                return doc
                    .add_external_font(BufReader::new(file))
                    .map_err(render_error);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "configured font could not be opened");
            }
        }
    }

    tracing::warn!("no CJK font available; Chinese text may not display correctly");
    doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_error)
}

fn save(doc: PdfDocumentReference, path: &Path) -> VoucherResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file)).map_err(render_error)
}

/// A cell in PDF coordinates
struct CellFrame {
    left: f64,
    top: f64,
    bottom: f64,
    width: f64,
}

impl CellFrame {
    fn new(cell: &CellGeometry, page_height_mm: f64) -> Self {
        let top = page_height_mm - cell.y_mm;
        Self {
            left: cell.x_mm,
            top,
            bottom: top - cell.height_mm,
            width: cell.width_mm,
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn centre_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// Approximate advance width: full-width glyphs take one em, others half
fn text_width_mm(text: &str, size_pt: f64) -> f64 {
    let ems: f64 = text
        .chars()
        .map(|c| if c.is_ascii() { 0.5 } else { 1.0 })
        .sum();
    ems * size_pt * PT_TO_MM
}

/// Cut `text` so it fits in `max_mm`
fn fit_text(text: &str, size_pt: f64, max_mm: f64) -> Cow<'_, str> {
    if text_width_mm(text, size_pt) <= max_mm {
        return Cow::Borrowed(text);
    }
    let mut fitted = String::new();
    for c in text.chars() {
        fitted.push(c);
        if text_width_mm(&fitted, size_pt) > max_mm {
            fitted.pop();
            break;
        }
    }
    Cow::Owned(fitted)
}

fn point(x: f64, y: f64) -> (Point, bool) {
    (Point::new(Mm(x as f32), Mm(y as f32)), false)
}

fn text_at(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, size_pt: f64, x: f64, y: f64) {
    layer.use_text(text, size_pt as f32, Mm(x as f32), Mm(y as f32), font);
}

fn text_centred(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, size_pt: f64, centre: f64, y: f64) {
    let x = centre - text_width_mm(text, size_pt) / 2.0;
    text_at(layer, font, text, size_pt, x, y);
}

fn text_right(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, size_pt: f64, right: f64, y: f64) {
    let x = right - text_width_mm(text, size_pt);
    text_at(layer, font, text, size_pt, x, y);
}

fn hline(layer: &PdfLayerReference, x1: f64, x2: f64, y: f64) {
    layer.add_line(Line {
        points: vec![point(x1, y), point(x2, y)],
        is_closed: false,
    });
}

fn vline(layer: &PdfLayerReference, x: f64, y1: f64, y2: f64) {
    layer.add_line(Line {
        points: vec![point(x, y1), point(x, y2)],
        is_closed: false,
    });
}

fn rect(layer: &PdfLayerReference, left: f64, bottom: f64, width: f64, height: f64) {
    layer.add_line(Line {
        points: vec![
            point(left, bottom),
            point(left + width, bottom),
            point(left + width, bottom + height),
            point(left, bottom + height),
        ],
        is_closed: true,
    });
}

fn draw_voucher(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    frame: &CellFrame,
    voucher: &Voucher,
    settings: &Settings,
) {
    layer.set_outline_thickness(0.8);
    rect(layer, frame.left, frame.bottom, frame.width, frame.top - frame.bottom);
    layer.set_outline_thickness(0.5);

    // Header
    let title_y = frame.top - PADDING_MM;
    text_centred(layer, font, &settings.company_name, 14.0, frame.centre_x(), title_y - 2.0);
    text_centred(layer, font, DOCUMENT_TITLE, 12.0, frame.centre_x(), title_y - LINE_HEIGHT_MM - 1.0);

    let info_y = title_y - LINE_HEIGHT_MM * 2.0 - 2.0;
    text_at(layer, font, "凭证字：记", 10.0, frame.left + PADDING_MM, info_y);
    text_right(
        layer,
        font,
        &format!("编号：{}", voucher.formatted_number()),
        10.0,
        frame.right() - PADDING_MM,
        info_y,
    );
    text_at(
        layer,
        font,
        &format!("日期：{}", voucher.formatted_date()),
        10.0,
        frame.left + PADDING_MM,
        info_y - LINE_HEIGHT_MM,
    );

    // Table: header, debit, credit and total rows
    let table_top = info_y - LINE_HEIGHT_MM * 2.0;
    let table_left = frame.left + PADDING_MM;
    let table_width = frame.width - 2.0 * PADDING_MM;
    let summary_width = table_width * 0.25;
    let account_width = table_width * 0.38;
    let amount_width = (table_width - summary_width - account_width) / 2.0;
    let table_height = LINE_HEIGHT_MM * 4.0 + 4.0;
    let table_bottom = table_top - table_height;

    let account_x = table_left + summary_width;
    let debit_x = account_x + account_width;
    let credit_x = debit_x + amount_width;

    rect(layer, table_left, table_bottom, table_width, table_height);
    for x in [account_x, debit_x, credit_x] {
        vline(layer, x, table_bottom, table_top);
    }
    for row in 1..4 {
        let y = table_top - row as f64 * LINE_HEIGHT_MM;
        hline(layer, table_left, table_left + table_width, y);
    }

    let header_y = table_top - LINE_HEIGHT_MM + 1.0;
    text_centred(layer, font, "摘要", 10.0, table_left + summary_width / 2.0, header_y);
    text_centred(layer, font, "科目", 10.0, account_x + account_width / 2.0, header_y);
    text_centred(layer, font, "借方金额", 10.0, debit_x + amount_width / 2.0, header_y);
    text_centred(layer, font, "贷方金额", 10.0, credit_x + amount_width / 2.0, header_y);

    let amount = voucher.formatted_amount();
    let debit_y = table_top - LINE_HEIGHT_MM * 2.0 + 1.0;
    let description = fit_text(voucher.display_description(), 10.0, summary_width - 4.0);
    text_at(layer, font, &description, 10.0, table_left + 2.0, debit_y);
    let debit_account = voucher.debit.account.to_string();
    text_at(layer, font, &fit_text(&debit_account, 10.0, account_width - 4.0), 10.0, account_x + 2.0, debit_y);
    text_right(layer, font, &amount, 10.0, debit_x + amount_width - 2.0, debit_y);

    let credit_y = debit_y - LINE_HEIGHT_MM;
    let credit_account = voucher.credit.account.to_string();
    text_at(layer, font, &fit_text(&credit_account, 10.0, account_width - 4.0), 10.0, account_x + 2.0, credit_y);
    text_right(layer, font, &amount, 10.0, credit_x + amount_width - 2.0, credit_y);

    let total_y = credit_y - LINE_HEIGHT_MM;
    text_at(layer, font, "合计", 10.0, table_left + 2.0, total_y);
    text_right(layer, font, &amount, 10.0, debit_x + amount_width - 2.0, total_y);
    text_right(layer, font, &amount, 10.0, credit_x + amount_width - 2.0, total_y);

    // Signatures
    let footer_y = frame.bottom + PADDING_MM + 2.0;
    let column = table_width / SIGNATURE_LABELS.len() as f64;
    for (i, label) in SIGNATURE_LABELS.iter().enumerate() {
        text_at(
            layer,
            font,
            &format!("{}：________", label),
            9.0,
            table_left + column * i as f64,
            footer_y,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voucher::layout;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn vouchers(count: u32) -> Vec<Voucher> {
        (1..=count)
            .map(|number| Voucher {
                number,
                date: NaiveDate::from_ymd_opt(2024, 1, number).unwrap(),
                description: format!("Payment {}", number),
                debit: VoucherLeg {
                    account: AccountRef::new("6602", "Admin expenses"),
                    amount: BigDecimal::from(number * 100),
                },
                credit: VoucherLeg {
                    account: AccountRef::new("1002", "Bank"),
                    amount: BigDecimal::from(number * 100),
                },
                precision: 2,
                source: MatchSource::Fallback,
            })
            .collect()
    }

    #[test]
    fn test_text_width_and_fit() {
        let size = 10.0;
        assert!(text_width_mm("工资", size) > text_width_mm("ab", size));
        let fitted = fit_text("一二三四五六七八九十", size, 3.0 * size * PT_TO_MM + 0.1);
        assert_eq!(fitted, "一二三");
        assert!(matches!(fit_text("short", size, 100.0), Cow::Borrowed(_)));
    }

    #[test]
    fn test_cell_frame_flips_to_pdf_space() {
        let cell = CellGeometry {
            x_mm: 12.0,
            y_mm: 105.0,
            width_mm: 186.0,
            height_mm: 87.0,
        };
        let frame = CellFrame::new(&cell, 297.0);
        assert_eq!(frame.top, 192.0);
        assert_eq!(frame.bottom, 105.0);
        assert_eq!(frame.right(), 198.0);
    }

    #[test]
    fn test_render_multi_voucher_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("vouchers.pdf");
        let settings = Settings::default();
        let pages = layout(vouchers(4), &settings.layout()).unwrap();

        let mut renderer = PdfRenderer::new(&output);
        renderer.render(&pages, &settings).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_one_pdf_page_per_layout_page() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();

        for count in [1, 3, 4, 7] {
            let output = dir.path().join(format!("vouchers_{}.pdf", count));
            let pages = layout(vouchers(count), &settings.layout()).unwrap();
            PdfRenderer::new(&output).render(&pages, &settings).unwrap();

            let document = lopdf::Document::load(&output).unwrap();
            assert_eq!(document.get_pages().len(), pages.len(), "{} vouchers", count);
        }
    }

    #[test]
    fn test_render_single_vouchers() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let pages = layout(vouchers(3), &settings.layout()).unwrap();

        let mut renderer = SingleVoucherPdfRenderer::new(dir.path().join("single"));
        renderer.render(&pages, &settings).unwrap();

        let names: Vec<String> = renderer
            .written()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["voucher_001.pdf", "voucher_002.pdf", "voucher_003.pdf"]);
        for path in renderer.written() {
            let document = lopdf::Document::load(path).unwrap();
            assert_eq!(document.get_pages().len(), 1);
        }
    }

    #[test]
    fn test_render_without_pages_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = PdfRenderer::new(dir.path().join("empty.pdf"));
        assert!(matches!(
            renderer.render(&[], &Settings::default()),
            Err(VoucherError::Render(_))
        ));
    }
}
