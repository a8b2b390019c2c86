use super::format_amount;
use super::table::{Cell, StatementTable};
use crate::error::ConsumoError;
use crate::model::Column;
use std::path::Path;

const DESCRIPTION_WIDTH: usize = 50;

fn cell_text(cell: Cell<'_>) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(text) => text.to_string(),
        Cell::Amount(value) => format_amount(value),
    }
}

/// Column widths: widest cell or label plus two, description fixed.
fn column_widths(table: &StatementTable) -> [usize; 5] {
    let mut widths = Column::ALL.map(|c| c.label().chars().count());
    for row in &table.rows {
        for (k, cell) in row.cells().into_iter().enumerate() {
            widths[k] = widths[k].max(cell_text(cell).chars().count());
        }
    }
    let mut widths = widths.map(|w| w + 2);
    widths[1] = DESCRIPTION_WIDTH;
    widths
}

/// Render the fixed-width text report.
///
/// Amounts are right-aligned, everything else left-aligned, and trailing
/// whitespace is stripped from every line.
pub fn render_text(table: &StatementTable) -> String {
    let widths = column_widths(table);
    let mut out = String::new();

    if let Some(title) = &table.title {
        let total: usize = widths.iter().sum();
        let pad = total.saturating_sub(title.chars().count()) / 2;
        out.push_str(&format!("{}{}", " ".repeat(pad), title).trim_end());
        out.push_str("\n\n");
    }

    for row in &table.rows {
        let mut line = String::new();
        for (cell, width) in row.cells().into_iter().zip(widths) {
            let text = cell_text(cell);
            match cell {
                Cell::Amount(_) => line.push_str(&format!("{text:>width$}")),
                _ => line.push_str(&format!("{text:<width$}")),
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

pub fn write_text(table: &StatementTable, path: &Path) -> Result<(), ConsumoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_text(table))?;
    tracing::info!(path = %path.display(), rows = table.rows.len(), "text report written");
    Ok(())
}
