use crate::model::{Column, ParsedStatement, Row};
use rust_decimal::Decimal;

/// One row of the flattened report.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    /// `--- Consumos NAME ---`, shown in the description column.
    SectionHeading { name: String, text: String },
    /// The column labels repeated under each heading.
    ColumnHeading,
    Transaction {
        date: String,
        description: String,
        voucher: String,
        amount_a: Option<Decimal>,
        amount_b: Option<Decimal>,
    },
    Total {
        label: String,
        amount_a: Option<Decimal>,
        amount_b: Option<Decimal>,
    },
    /// Spacer after each total.
    Blank,
}

/// Content of one cell as the writers see it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Empty,
    Text(&'a str),
    Amount(Decimal),
}

impl Cell<'_> {
    fn from_amount(value: Option<Decimal>) -> Self {
        value.map_or(Cell::Empty, Cell::Amount)
    }
}

impl TableRow {
    /// Cells in [`Column::ALL`] order.
    pub fn cells(&self) -> [Cell<'_>; 5] {
        match self {
            TableRow::SectionHeading { text, .. } => {
                [Cell::Empty, Cell::Text(text), Cell::Empty, Cell::Empty, Cell::Empty]
            }
            TableRow::ColumnHeading => Column::ALL.map(|c| Cell::Text(c.label())),
            TableRow::Transaction {
                date,
                description,
                voucher,
                amount_a,
                amount_b,
            } => [
                Cell::Text(date),
                Cell::Text(description),
                Cell::Text(voucher),
                Cell::from_amount(*amount_a),
                Cell::from_amount(*amount_b),
            ],
            TableRow::Total {
                label,
                amount_a,
                amount_b,
            } => [
                Cell::Empty,
                Cell::Text(label),
                Cell::Empty,
                Cell::from_amount(*amount_a),
                Cell::from_amount(*amount_b),
            ],
            TableRow::Blank => [Cell::Empty; 5],
        }
    }

    /// Column heading and total rows get dotted borders in the workbook.
    pub fn is_framed(&self) -> bool {
        matches!(self, TableRow::ColumnHeading | TableRow::Total { .. })
    }
}

/// The whole report: optional title plus rows for every person.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementTable {
    pub title: Option<String>,
    pub rows: Vec<TableRow>,
}

impl StatementTable {
    /// Lay out a parsed statement person by person, in first-appearance order.
    pub fn from_parsed(parsed: &ParsedStatement, section_title: &str) -> Self {
        let title = parsed
            .latest_date
            .map(|d| format!("Monthly Consumption {}", d.format("%B")));

        let mut rows = Vec::new();
        for person in &parsed.persons {
            rows.push(TableRow::SectionHeading {
                name: person.name.clone(),
                text: format!("--- {} {} ---", section_title, person.name),
            });
            rows.push(TableRow::ColumnHeading);
            for row in &person.rows {
                match row {
                    Row::Transaction {
                        date,
                        description,
                        voucher,
                        amount_a,
                        amount_b,
                        ..
                    } => rows.push(TableRow::Transaction {
                        date: date.clone(),
                        description: description.clone(),
                        voucher: voucher.clone(),
                        amount_a: *amount_a,
                        amount_b: *amount_b,
                    }),
                    Row::Total {
                        label,
                        amount_a,
                        amount_b,
                        ..
                    } => {
                        rows.push(TableRow::Total {
                            label: label.clone(),
                            amount_a: *amount_a,
                            amount_b: *amount_b,
                        });
                        rows.push(TableRow::Blank);
                    }
                }
            }
        }

        StatementTable { title, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PersonStatement;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn parsed() -> ParsedStatement {
        ParsedStatement {
            persons: vec![
                PersonStatement {
                    name: "JUAN PEREZ".into(),
                    rows: vec![
                        Row::Transaction {
                            owner: "JUAN PEREZ".into(),
                            date: "05-Ene-24".into(),
                            description: "SUPERMERCADO".into(),
                            voucher: "000101".into(),
                            amount_a: Some(dec!(600)),
                            amount_b: None,
                        },
                        Row::Total {
                            owner: "JUAN PEREZ".into(),
                            label: "TOTAL CONSUMOS DE JUAN PEREZ".into(),
                            amount_a: Some(dec!(600)),
                            amount_b: Some(dec!(0)),
                        },
                    ],
                },
                PersonStatement {
                    name: "ANA GOMEZ".into(),
                    rows: Vec::new(),
                },
            ],
            latest_date: NaiveDate::from_ymd_opt(2024, 3, 14),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_layout_per_person() {
        let table = StatementTable::from_parsed(&parsed(), "Consumos");
        assert_eq!(table.title.as_deref(), Some("Monthly Consumption March"));
        assert_eq!(table.rows.len(), 7);
        assert!(matches!(&table.rows[0], TableRow::SectionHeading { text, .. } if text == "--- Consumos JUAN PEREZ ---"));
        assert_eq!(table.rows[1], TableRow::ColumnHeading);
        assert!(matches!(table.rows[2], TableRow::Transaction { .. }));
        assert!(matches!(table.rows[3], TableRow::Total { .. }));
        assert_eq!(table.rows[4], TableRow::Blank);
        assert!(matches!(&table.rows[5], TableRow::SectionHeading { name, .. } if name == "ANA GOMEZ"));
        assert_eq!(table.rows[6], TableRow::ColumnHeading);
    }

    #[test]
    fn test_no_title_without_dates() {
        let mut p = parsed();
        p.latest_date = None;
        assert_eq!(StatementTable::from_parsed(&p, "Consumos").title, None);
    }

    #[test]
    fn test_total_cells_put_label_in_description() {
        let table = StatementTable::from_parsed(&parsed(), "Consumos");
        assert_eq!(
            table.rows[3].cells(),
            [
                Cell::Empty,
                Cell::Text("TOTAL CONSUMOS DE JUAN PEREZ"),
                Cell::Empty,
                Cell::Amount(dec!(600)),
                Cell::Amount(dec!(0)),
            ]
        );
        assert!(table.rows[3].is_framed());
        assert!(!table.rows[2].is_framed());
    }
}
