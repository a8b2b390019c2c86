use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConsumoError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("{tool} not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PopplerNotFound { tool: &'static str },

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("pdftoppm failed on page {page} with exit code {code}: {stderr}")]
    PdftoppmFailed {
        page: usize,
        code: i32,
        stderr: String,
    },

    #[error("'{marker}' marker not found in the PDF. Cannot determine start page.")]
    StartMarkerNotFound { marker: String },

    #[error("failed to load template from {path}: {reason}")]
    TemplateLoad { path: PathBuf, reason: String },

    #[error("invalid template: {0}")]
    TemplateInvalid(String),

    #[error("capture region for '{name}' is empty")]
    EmptyCapture { name: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Excel error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
