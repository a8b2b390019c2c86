pub mod pdftoppm;
pub mod pdftotext;

use crate::error::ConsumoError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in PDF points, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A positioned word as produced by the text extraction backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub rect: Rect,
    pub text: String,
    pub block: usize,
    pub line: usize,
    pub word: usize,
}

/// Content extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Zero-based page index within the document.
    pub page_index: usize,
    pub width: f32,
    pub height: f32,
    pub tokens: Vec<Token>,
}

impl PageContent {
    /// Plain text of the page, tokens joined in extraction order.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract positioned word tokens from PDF bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, ConsumoError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Trait for rasterizing single PDF pages, used by the capture variant.
pub trait PageRenderer {
    /// Render the zero-based page `page_index` at `dpi` dots per inch.
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<RgbImage, ConsumoError>;
}
