pub mod capture;
pub mod delivery;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod model;
pub mod output;
pub mod parsing;
pub mod template;

use capture::CaptureReport;
use chrono::Datelike;
use error::ConsumoError;
use extraction::{PageRenderer, PdfExtractor};
use model::ParsedStatement;
use std::path::Path;
use template::Template;

/// Main API entry point: split a statement PDF into per-person transaction tables.
///
/// Two-digit years in transaction dates are resolved against the current year.
pub fn parse_statement_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    template: &Template,
) -> Result<ParsedStatement, ConsumoError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    tracing::debug!(
        pages = pages.len(),
        backend = extractor.backend_name(),
        "pages extracted"
    );
    parsing::parse_statement(&pages, template, chrono::Local::now().year())
}

/// Capture variant: write one cropped image per person section into `out_dir`.
pub fn capture_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    renderer: &dyn PageRenderer,
    template: &Template,
    dpi: u32,
    out_dir: &Path,
) -> Result<CaptureReport, ConsumoError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    capture::capture_statement(pdf_bytes, &pages, template, renderer, dpi, out_dir)
}
