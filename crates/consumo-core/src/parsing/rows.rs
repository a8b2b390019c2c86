use crate::extraction::Token;
use crate::layout::columns::ColumnMap;
use crate::model::{Column, Row};
use crate::parsing::dates::{is_transaction_date, parse_transaction_date};
use crate::parsing::normalize::repair_cell;
use crate::parsing::values::{find_amounts, looks_numeric, normalize_amount};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Raw text per column for one visual row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCells {
    pub date: String,
    pub description: String,
    pub voucher: String,
    pub amount_a: String,
    pub amount_b: String,
}

impl RowCells {
    pub fn cell(&self, column: Column) -> &str {
        match column {
            Column::Date => &self.date,
            Column::Description => &self.description,
            Column::Voucher => &self.voucher,
            Column::AmountA => &self.amount_a,
            Column::AmountB => &self.amount_b,
        }
    }

    fn cell_mut(&mut self, column: Column) -> &mut String {
        match column {
            Column::Date => &mut self.date,
            Column::Description => &mut self.description,
            Column::Voucher => &mut self.voucher,
            Column::AmountA => &mut self.amount_a,
            Column::AmountB => &mut self.amount_b,
        }
    }
}

/// Outcome of running one visual row through the extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// The date cell did not look like a transaction date.
    Rejected { date_cell: String },
    Accepted {
        row: Row,
        /// None when the date has the right shape but is not a calendar date.
        date: Option<NaiveDate>,
        /// Amount cells that were present but could not be normalized.
        invalid_amounts: Vec<(Column, String)>,
    },
}

/// Distribute a visual row's tokens over the column map.
///
/// Each token goes to the first column containing its left edge; tokens
/// outside every column are dropped.
pub fn assign_cells(tokens: &[&Token], map: &ColumnMap) -> RowCells {
    let mut parts: Vec<(Column, Vec<&str>)> =
        map.order().into_iter().map(|c| (c, Vec::new())).collect();

    for token in tokens {
        if let Some(column) = map.column_at(token.rect.x0) {
            if let Some((_, words)) = parts.iter_mut().find(|(c, _)| *c == column) {
                words.push(token.text.as_str());
            }
        }
    }

    let mut cells = RowCells::default();
    for (column, words) in parts {
        *cells.cell_mut(column) = repair_cell(&words.join(" "));
    }

    // Amounts printed flush against the voucher number land in its column.
    if cells.amount_a.is_empty() {
        if let Some((voucher, rest)) = cells.voucher.split_once(' ') {
            if looks_numeric(rest) {
                let (voucher, rest) = (voucher.to_string(), rest.trim().to_string());
                cells.voucher = voucher;
                cells.amount_a = rest;
            }
        }
    }

    cells
}

/// Turn a visual row into a transaction row, or reject it as noise.
pub fn extract_row(
    tokens: &[&Token],
    map: &ColumnMap,
    owner: &str,
    reference_year: i32,
) -> Extracted {
    let cells = assign_cells(tokens, map);

    if !is_transaction_date(&cells.date) {
        return Extracted::Rejected {
            date_cell: cells.date,
        };
    }

    let mut invalid_amounts = Vec::new();
    let mut amount = |column: Column| -> Option<Decimal> {
        let raw = cells.cell(column);
        if raw.is_empty() {
            return None;
        }
        let value = normalize_amount(raw);
        if value.is_none() {
            invalid_amounts.push((column, raw.to_string()));
        }
        value
    };
    let amount_a = amount(Column::AmountA);
    let amount_b = amount(Column::AmountB);

    let date = parse_transaction_date(&cells.date, reference_year);

    Extracted::Accepted {
        row: Row::Transaction {
            owner: owner.to_string(),
            date: cells.date.clone(),
            description: cells.description.clone(),
            voucher: cells.voucher.clone(),
            amount_a,
            amount_b,
        },
        date,
        invalid_amounts,
    }
}

/// Build the closing total row from the text of the total's visual row.
///
/// The last two amounts on the row are the two currency totals; with fewer
/// than two amounts both stay empty.
pub fn total_row(owner: &str, label: &str, row_text: &str) -> Row {
    let amounts = find_amounts(row_text);
    let (amount_a, amount_b) = match amounts.as_slice() {
        [.., a, b] => (normalize_amount(a), normalize_amount(b)),
        _ => (None, None),
    };

    Row::Total {
        owner: owner.to_string(),
        label: label.to_string(),
        amount_a,
        amount_b,
    }
}
