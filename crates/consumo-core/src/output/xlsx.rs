use super::format_amount;
use super::table::{Cell, StatementTable};
use crate::error::ConsumoError;
use crate::model::Column;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::path::Path;

pub const SHEET_NAME: &str = "Transactions";

/// Accounting layout with a `$` sign and a dash for zero.
pub const ACCOUNTING_FORMAT: &str = r#"_-$ * #,##0.00_-;-$ * #,##0.00_-;_-$ * "-"??_-;_-@_-"#;

const AMOUNT_COLUMN_WIDTH: f64 = 20.0;

/// Write the report as a single-sheet workbook.
///
/// The title, when present, is merged across the five columns of the first
/// row; data starts on the second row either way.
pub fn write_xlsx(table: &StatementTable, path: &Path) -> Result<(), ConsumoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    if let Some(title) = &table.title {
        let title_format = Format::new()
            .set_bold()
            .set_font_size(14)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        sheet.merge_range(0, 0, 0, 4, title, &title_format)?;
    }

    write_rows(sheet, table)?;
    size_columns(sheet, table)?;

    workbook.save(path)?;
    tracing::info!(path = %path.display(), rows = table.rows.len(), "workbook written");
    Ok(())
}

fn write_rows(sheet: &mut Worksheet, table: &StatementTable) -> Result<(), ConsumoError> {
    let plain = Format::new();
    let framed = Format::new().set_border(FormatBorder::Dotted);
    let money = Format::new().set_num_format(ACCOUNTING_FORMAT);
    let framed_money = money.clone().set_border(FormatBorder::Dotted);

    for (offset, row) in table.rows.iter().enumerate() {
        let r = offset as u32 + 1;
        let is_framed = row.is_framed();
        for (c, cell) in row.cells().into_iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Amount(value) => match amount_value(&value) {
                    Some(number) => {
                        let format = if is_framed { &framed_money } else { &money };
                        sheet.write_number_with_format(r, c, number, format)?;
                    }
                    None => {
                        tracing::warn!(
                            row = r,
                            column = c,
                            amount = %value,
                            "amount not representable, cell left empty"
                        );
                        if is_framed {
                            sheet.write_blank(r, c, &framed)?;
                        }
                    }
                },
                Cell::Text(text) => {
                    let format = if is_framed { &framed } else { &plain };
                    sheet.write_string_with_format(r, c, text, format)?;
                }
                Cell::Empty if is_framed => {
                    sheet.write_blank(r, c, &framed)?;
                }
                Cell::Empty => {}
            }
        }
    }
    Ok(())
}

/// Spreadsheet number for an amount; `None` when it has no finite `f64` form.
fn amount_value(value: &Decimal) -> Option<f64> {
    value.to_f64().filter(|n| n.is_finite())
}

fn size_columns(sheet: &mut Worksheet, table: &StatementTable) -> Result<(), ConsumoError> {
    for (k, column) in Column::ALL.iter().enumerate() {
        let width = if column.is_amount() {
            AMOUNT_COLUMN_WIDTH
        } else {
            let widest = table
                .rows
                .iter()
                .map(|row| match row.cells()[k] {
                    Cell::Empty => 0,
                    Cell::Text(text) => text.chars().count(),
                    Cell::Amount(value) => format_amount(value).len(),
                })
                .max()
                .unwrap_or(0)
                .max(column.label().chars().count());
            (widest + 2) as f64
        };
        sheet.set_column_width(k as u16, width)?;
    }
    Ok(())
}
