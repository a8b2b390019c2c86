use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data columns of the statement's transaction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Date,
    Description,
    Voucher,
    /// Amount in local currency (PESOS).
    AmountA,
    /// Amount in foreign currency (DÓLARES).
    AmountB,
}

impl Column {
    /// Output column order.
    pub const ALL: [Column; 5] = [
        Column::Date,
        Column::Description,
        Column::Voucher,
        Column::AmountA,
        Column::AmountB,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Column::Date => "FECHA",
            Column::Description => "DESCRIPCIÓN",
            Column::Voucher => "NRO. CUPÓN",
            Column::AmountA => "PESOS",
            Column::AmountB => "DÓLARES",
        }
    }

    pub fn is_amount(&self) -> bool {
        matches!(self, Column::AmountA | Column::AmountB)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One extracted row of a person's statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    Transaction {
        owner: String,
        date: String,
        description: String,
        voucher: String,
        amount_a: Option<Decimal>,
        amount_b: Option<Decimal>,
    },
    Total {
        owner: String,
        label: String,
        amount_a: Option<Decimal>,
        amount_b: Option<Decimal>,
    },
}

impl Row {
    pub fn owner(&self) -> &str {
        match self {
            Row::Transaction { owner, .. } | Row::Total { owner, .. } => owner,
        }
    }

    pub fn amounts(&self) -> (Option<Decimal>, Option<Decimal>) {
        match self {
            Row::Transaction {
                amount_a, amount_b, ..
            }
            | Row::Total {
                amount_a, amount_b, ..
            } => (*amount_a, *amount_b),
        }
    }

    pub fn is_total(&self) -> bool {
        matches!(self, Row::Total { .. })
    }
}

/// All rows attributed to one person, in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonStatement {
    pub name: String,
    pub rows: Vec<Row>,
}

impl PersonStatement {
    pub fn transactions(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| !r.is_total())
    }

    pub fn total(&self) -> Option<&Row> {
        self.rows.iter().rev().find(|r| r.is_total())
    }
}

/// A non-fatal condition noticed while scanning a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Zero-based page index, when tied to a location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
    pub message: String,
}

/// Result of parsing a statement into per-person transaction tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedStatement {
    /// Persons in order of first appearance.
    pub persons: Vec<PersonStatement>,
    /// Most recent transaction date, used for report titles.
    pub latest_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

impl ParsedStatement {
    pub fn person(&self, name: &str) -> Option<&PersonStatement> {
        self.persons.iter().find(|p| p.name == name)
    }

    /// Append a row under `owner`, creating the person on first sight.
    pub(crate) fn push_row(&mut self, row: Row) {
        let owner = row.owner();
        match self.persons.iter_mut().find(|p| p.name == owner) {
            Some(person) => person.rows.push(row),
            None => self.persons.push(PersonStatement {
                name: owner.to_string(),
                rows: vec![row],
            }),
        }
    }

    /// Register a person with no rows yet, keeping first-appearance order.
    pub(crate) fn ensure_person(&mut self, name: &str) {
        if self.person(name).is_none() {
            self.persons.push(PersonStatement {
                name: name.to_string(),
                rows: Vec::new(),
            });
        }
    }

    pub(crate) fn observe_date(&mut self, date: NaiveDate) {
        if self.latest_date.map_or(true, |latest| date > latest) {
            self.latest_date = Some(date);
        }
    }
}
