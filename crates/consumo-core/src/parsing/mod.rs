pub mod dates;
pub mod normalize;
pub mod rows;
pub mod values;

use crate::error::ConsumoError;
use crate::extraction::{PageContent, Token};
use crate::layout::columns::{is_column_header, locate_columns, ColumnMap};
use crate::layout::grouper::{cluster_rows, group_lines, visual_row, Line};
use crate::layout::sections::{LineClass, ScanState};
use crate::model::{ParseWarning, ParsedStatement};
use crate::template::Template;
use rows::{extract_row, total_row, Extracted};

/// Parse extracted pages into per-person transaction tables.
///
/// The section detector decides which person owns each line; within a
/// section, table header lines resolve the column map and every other line
/// contributes its tokens to the rows of the current page. Those tokens are
/// buffered and clustered into visual rows whenever the structure changes
/// (new column header, new person, total, end marker, end of page), so
/// cells split across extraction lines still meet on one row.
///
/// `reference_year` picks the century for two-digit years.
pub fn parse_statement(
    pages: &[PageContent],
    template: &Template,
    reference_year: i32,
) -> Result<ParsedStatement, ConsumoError> {
    let mut parser = StatementParser {
        template,
        reference_year,
        parsed: ParsedStatement::default(),
        owner: None,
        columns: None,
        unmapped_lines: 0,
        pending: Vec::new(),
    };

    let mut state = ScanState::new();
    let mut last_page = 0;
    for page in pages {
        if state.is_done() {
            break;
        }
        state = state.enter_page(page, template);
        if !state.is_scanning() {
            continue;
        }

        let lines = group_lines(&page.tokens);
        for line in &lines {
            let (next, class) = state.step(page.page_index, line, template);
            state = next;
            parser.handle(page, line, class);
            if state.is_done() {
                break;
            }
        }
        parser.flush(page.page_index);
        last_page = page.page_index;
    }
    parser.close_section(last_page);

    let scan = state.finish(template)?;
    let mut parsed = parser.parsed;
    let mut warnings = scan.warnings;
    warnings.append(&mut parsed.warnings);
    parsed.warnings = warnings;

    tracing::info!(
        persons = parsed.persons.len(),
        rows = parsed.persons.iter().map(|p| p.rows.len()).sum::<usize>(),
        "statement parsed"
    );
    Ok(parsed)
}

struct StatementParser<'t> {
    template: &'t Template,
    reference_year: i32,
    parsed: ParsedStatement,
    /// Name of the open section.
    owner: Option<String>,
    columns: Option<ColumnMap>,
    /// Detail lines of the open section dropped for lack of a column map.
    unmapped_lines: usize,
    /// Detail tokens of the current page not yet turned into rows.
    pending: Vec<Token>,
}

impl StatementParser<'_> {
    fn handle(&mut self, page: &PageContent, line: &Line, class: LineClass) {
        match class {
            LineClass::Ignored | LineClass::Outside => {}
            LineClass::EndMarker => {
                self.flush(page.page_index);
                self.close_section(page.page_index);
            }
            LineClass::Header(name) => {
                self.flush(page.page_index);
                self.close_section(page.page_index);
                self.parsed.ensure_person(&name);
                let row = visual_row(&page.tokens, line, self.template.row_y_tolerance);
                self.columns = is_column_header(self.template, &row.text)
                    .then(|| locate_columns(self.template, &row, &name));
                self.owner = Some(name);
            }
            LineClass::Total(name) => {
                self.flush(page.page_index);
                let label = format!("{} {}", self.template.total_label, name);
                let row = visual_row(&page.tokens, line, self.template.row_y_tolerance);
                self.parsed.push_row(total_row(&name, &label, &row.text));
                self.close_section(page.page_index);
            }
            LineClass::Detail => {
                // Header labels may be split across blocks; judge the whole row.
                let row = visual_row(&page.tokens, line, self.template.row_y_tolerance);
                if is_column_header(self.template, &row.text) {
                    self.flush(page.page_index);
                    if let Some(owner) = self.owner.as_deref() {
                        self.columns = Some(locate_columns(self.template, &row, owner));
                    }
                } else if self.columns.is_some() {
                    self.pending.extend(line.tokens.iter().cloned());
                } else if self.owner.is_some() {
                    self.unmapped_lines += 1;
                }
            }
        }
    }

    /// Close the open section, warning when it took detail lines but never
    /// found a column header.
    fn close_section(&mut self, page_index: usize) {
        if let Some(owner) = self.owner.take() {
            if self.columns.is_none() && self.unmapped_lines > 0 {
                let message = format!(
                    "no column header found for {}; {} detail line(s) ignored",
                    owner, self.unmapped_lines
                );
                tracing::warn!("{message}");
                self.parsed.warnings.push(ParseWarning {
                    page_index: Some(page_index),
                    message,
                });
            }
        }
        self.columns = None;
        self.unmapped_lines = 0;
    }

    /// Turn buffered detail tokens into rows for the open section.
    fn flush(&mut self, page_index: usize) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let (Some(owner), Some(columns)) = (self.owner.as_deref(), self.columns.as_ref()) else {
            return;
        };

        for cells in cluster_rows(&pending, self.template.row_y_tolerance) {
            match extract_row(&cells, columns, owner, self.reference_year) {
                Extracted::Rejected { date_cell } => {
                    tracing::trace!(page = page_index + 1, date = %date_cell, "row rejected");
                }
                Extracted::Accepted {
                    row,
                    date,
                    invalid_amounts,
                } => {
                    for (column, raw) in invalid_amounts {
                        let message = format!(
                            "could not read {} amount '{}' for {}; left empty",
                            column, raw, owner
                        );
                        tracing::warn!("{message}");
                        self.parsed.warnings.push(ParseWarning {
                            page_index: Some(page_index),
                            message,
                        });
                    }
                    if let Some(date) = date {
                        self.parsed.observe_date(date);
                    }
                    self.parsed.push_row(row);
                }
            }
        }
    }
}
