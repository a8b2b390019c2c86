use consumo_core::error::ConsumoError;
use consumo_core::extraction::pdftoppm::PdftoppmRenderer;
use consumo_core::extraction::pdftotext::PdftotextExtractor;
use std::path::PathBuf;

use super::resolve_template;

pub fn run(
    pdf_file: PathBuf,
    out_dir: PathBuf,
    dpi: Option<u32>,
    template_file: Option<PathBuf>,
) -> Result<(), ConsumoError> {
    let template = resolve_template(template_file.as_deref())?;
    let pdf_bytes = std::fs::read(&pdf_file)?;
    let extractor = PdftotextExtractor::new();
    let renderer = PdftoppmRenderer::new();
    let dpi = dpi.unwrap_or(template.capture.dpi);

    let report =
        consumo_core::capture_pdf(&pdf_bytes, &extractor, &renderer, &template, dpi, &out_dir)?;

    eprintln!(
        "Saved {} capture(s) to {}",
        report.files.len(),
        out_dir.display()
    );
    for file in &report.files {
        println!("{}", file.display());
    }
    for w in &report.warnings {
        eprintln!("  warning: {}", w.message);
    }

    Ok(())
}
