use consumo_core::error::ConsumoError;
use consumo_core::extraction::pdftotext::PdftotextExtractor;
use consumo_core::output::table::StatementTable;
use consumo_core::output::{text, xlsx};
use std::path::PathBuf;

use super::resolve_template;
use crate::output;

pub fn run(
    pdf_file: PathBuf,
    output_format: &str,
    xlsx_file: Option<PathBuf>,
    txt_file: Option<PathBuf>,
    template_file: Option<PathBuf>,
) -> Result<(), ConsumoError> {
    let template = resolve_template(template_file.as_deref())?;
    let pdf_bytes = std::fs::read(&pdf_file)?;
    let extractor = PdftotextExtractor::new();
    let parsed = consumo_core::parse_statement_pdf(&pdf_bytes, &extractor, &template)?;
    let table = StatementTable::from_parsed(&parsed, &template.section_title);

    match output_format {
        "json" => output::json::print(&parsed)?,
        _ => output::table::print(&parsed, &table),
    }

    if let Some(path) = &xlsx_file {
        xlsx::write_xlsx(&table, path)?;
        eprintln!("Workbook written to {}", path.display());
    }
    if let Some(path) = &txt_file {
        text::write_text(&table, path)?;
        eprintln!("Text report written to {}", path.display());
    }

    if !parsed.warnings.is_empty() {
        for w in &parsed.warnings {
            match w.page_index {
                Some(page) => eprintln!("  warning (page {}): {}", page + 1, w.message),
                None => eprintln!("  warning: {}", w.message),
            }
        }
    }

    Ok(())
}
