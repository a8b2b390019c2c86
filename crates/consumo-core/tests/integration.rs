//! Integration tests for the statement pipeline end to end.
//!
//! Uses a MockExtractor that returns pre-built PageContent and a mock
//! renderer producing blank pages, so these tests run without poppler-utils.

use consumo_core::delivery::{deliver, read_report_blocks, Directory, DryRunSender};
use consumo_core::error::ConsumoError;
use consumo_core::extraction::{PageContent, PageRenderer, PdfExtractor, Rect, Token};
use consumo_core::model::Row;
use consumo_core::output::table::StatementTable;
use consumo_core::output::text::render_text;
use consumo_core::output::xlsx::write_xlsx;
use consumo_core::template::builtin::load_preset;
use consumo_core::{capture_pdf, parse_statement_pdf};
use image::{Rgb, RgbImage};
use rust_decimal_macros::dec;
use std::time::Duration;

struct MockExtractor {
    pages: Vec<PageContent>,
}

impl PdfExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageContent>, ConsumoError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct BlankRenderer;

impl PageRenderer for BlankRenderer {
    fn render_page(
        &self,
        _pdf_bytes: &[u8],
        _page_index: usize,
        dpi: u32,
    ) -> Result<RgbImage, ConsumoError> {
        let scale = dpi as f32 / 72.0;
        Ok(RgbImage::from_pixel(
            (612.0 * scale) as u32,
            (792.0 * scale) as u32,
            Rgb([255, 255, 255]),
        ))
    }
}

/// Page builder: each call to `line` adds one extraction line of `(x, text)` cells.
struct PageBuilder {
    index: usize,
    block: usize,
    tokens: Vec<Token>,
}

impl PageBuilder {
    fn new(index: usize) -> Self {
        PageBuilder {
            index,
            block: 0,
            tokens: Vec::new(),
        }
    }

    fn line(mut self, y: f32, cells: &[(f32, &str)]) -> Self {
        let mut word = 0;
        for (x, text) in cells {
            let mut cx = *x;
            for w in text.split_whitespace() {
                let width = 6.0 * w.chars().count() as f32;
                self.tokens.push(Token {
                    rect: Rect::new(cx, y, cx + width, y + 9.0),
                    text: w.to_string(),
                    block: self.block,
                    line: 0,
                    word,
                });
                cx += width + 4.0;
                word += 1;
            }
        }
        self.block += 1;
        self
    }

    fn header(self, y: f32) -> Self {
        self.line(
            y,
            &[
                (40.0, "FECHA"),
                (100.0, "DESCRIPCIÓN"),
                (300.0, "NRO. CUPÓN"),
                (400.0, "PESOS"),
                (490.0, "DÓLARES"),
            ],
        )
    }

    fn txn(self, y: f32, date: &str, desc: &str, voucher: &str, pesos: &str, dolares: &str) -> Self {
        let cells: Vec<(f32, &str)> = [
            (40.0, date),
            (100.0, desc),
            (300.0, voucher),
            (400.0, pesos),
            (490.0, dolares),
        ]
        .into_iter()
        .filter(|(_, t)| !t.is_empty())
        .collect();
        self.line(y, &cells)
    }

    fn build(self) -> PageContent {
        PageContent {
            page_index: self.index,
            width: 612.0,
            height: 792.0,
            tokens: self.tokens,
        }
    }
}

fn two_person_statement() -> Vec<PageContent> {
    vec![
        PageBuilder::new(0)
            .line(30.0, &[(36.0, "Resumen de cuenta")])
            .line(700.0, &[(36.0, "Página 1 de 3")])
            .build(),
        PageBuilder::new(1)
            .line(30.0, &[(36.0, "DETALLE DEL MES")])
            .line(80.0, &[(36.0, "Consumos JUAN PEREZ")])
            .header(100.0)
            .txn(120.0, "05-Ene-24", "SUPERMERCADO", "000101", "600,00", "")
            .txn(135.0, "12-Ene-24", "FARMACIA", "000102", "400,00", "")
            .line(780.0, &[(36.0, "Página 2 de 3")])
            .build(),
        PageBuilder::new(2)
            .txn(60.0, "20-Ene-24", "SUSCRIPCION STREAMING", "000103", "", "50,00")
            .line(90.0, &[(36.0, "TOTAL CONSUMOS DE JUAN PEREZ"), (400.0, "1.000,00"), (490.0, "50,00")])
            .line(130.0, &[(36.0, "Consumos ANA GOMEZ")])
            .header(150.0)
            .txn(170.0, "28-Ene-24", "LIBRERIA", "000201", "1.234,56", "")
            .line(190.0, &[(36.0, "TOTAL CONSUMOS DE ANA GOMEZ"), (400.0, "1.234,56"), (490.0, "0,00")])
            .line(230.0, &[(36.0, "Impuestos, cargos e intereses")])
            .txn(260.0, "30-Ene-24", "IVA", "", "99,00", "")
            .build(),
    ]
}

// ---------------------------------------------------------------------------
// Test 1: Section spanning a page break, totals read from the total line
// ---------------------------------------------------------------------------
#[test]
fn section_across_pages_collects_rows_and_total() {
    let template = load_preset("detalle").unwrap();
    let extractor = MockExtractor {
        pages: two_person_statement(),
    };

    let parsed = parse_statement_pdf(&[], &extractor, &template).unwrap();

    let names: Vec<_> = parsed.persons.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["JUAN PEREZ", "ANA GOMEZ"]);

    let juan = parsed.person("JUAN PEREZ").unwrap();
    assert_eq!(juan.transactions().count(), 3);
    match juan.total() {
        Some(Row::Total {
            label,
            amount_a,
            amount_b,
            ..
        }) => {
            assert_eq!(label, "TOTAL CONSUMOS DE JUAN PEREZ");
            assert_eq!(*amount_a, Some(dec!(1000.00)));
            assert_eq!(*amount_b, Some(dec!(50.00)));
        }
        other => panic!("expected a total row, got {other:?}"),
    }

    match &juan.rows[2] {
        Row::Transaction {
            description,
            amount_a,
            amount_b,
            ..
        } => {
            assert_eq!(description, "SUSCRIPCION STREAMING");
            assert_eq!(*amount_a, None);
            assert_eq!(*amount_b, Some(dec!(50.00)));
        }
        other => panic!("expected a transaction, got {other:?}"),
    }

    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
}

// ---------------------------------------------------------------------------
// Test 2: Nothing after the end marker is read
// ---------------------------------------------------------------------------
#[test]
fn end_marker_stops_parsing() {
    let template = load_preset("detalle").unwrap();
    let extractor = MockExtractor {
        pages: two_person_statement(),
    };

    let parsed = parse_statement_pdf(&[], &extractor, &template).unwrap();
    let ana = parsed.person("ANA GOMEZ").unwrap();
    assert_eq!(ana.transactions().count(), 1);
    assert_eq!(
        parsed.latest_date,
        chrono::NaiveDate::from_ymd_opt(2024, 1, 28)
    );
}

// ---------------------------------------------------------------------------
// Test 3: Missing start marker is fatal
// ---------------------------------------------------------------------------
#[test]
fn missing_start_marker_is_an_error() {
    let template = load_preset("detalle").unwrap();
    let extractor = MockExtractor {
        pages: vec![PageBuilder::new(0)
            .line(80.0, &[(36.0, "Consumos JUAN PEREZ")])
            .build()],
    };

    let err = parse_statement_pdf(&[], &extractor, &template).unwrap_err();
    assert!(matches!(err, ConsumoError::StartMarkerNotFound { .. }));
}

// ---------------------------------------------------------------------------
// Test 4: Text report splits back into the same people for delivery
// ---------------------------------------------------------------------------
#[test]
fn text_report_round_trips_into_delivery_blocks() {
    let template = load_preset("detalle").unwrap();
    let extractor = MockExtractor {
        pages: two_person_statement(),
    };
    let parsed = parse_statement_pdf(&[], &extractor, &template).unwrap();
    let table = StatementTable::from_parsed(&parsed, &template.section_title);
    let text = render_text(&table);

    assert!(text.starts_with(' '));
    assert!(text.contains("Monthly Consumption January"));

    let blocks = read_report_blocks(&text, &template.section_title);
    let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["JUAN PEREZ", "ANA GOMEZ"]);

    // Column heading + 3 transactions + total
    assert_eq!(blocks[0].body.lines().count(), 5);
    assert!(blocks[0].body.contains("1,000.00"));
    // Column heading + 1 transaction + total
    assert_eq!(blocks[1].body.lines().count(), 3);

    let directory = Directory::from_json(
        r#"{ "Juan Perez": { "UID": "U1", "send_message": true } }"#,
    )
    .unwrap();
    let report = deliver(&blocks, &directory, &DryRunSender, Duration::ZERO);
    assert_eq!(report.sent, vec!["JUAN PEREZ".to_string()]);
    assert_eq!(report.skipped.len(), 1);
}

// ---------------------------------------------------------------------------
// Test 5: Workbook output for a parsed statement
// ---------------------------------------------------------------------------
#[test]
fn workbook_is_written_for_parsed_statement() {
    let template = load_preset("detalle").unwrap();
    let extractor = MockExtractor {
        pages: two_person_statement(),
    };
    let parsed = parse_statement_pdf(&[], &extractor, &template).unwrap();
    let table = StatementTable::from_parsed(&parsed, &template.section_title);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output_excel").join("consumos.xlsx");
    write_xlsx(&table, &path).unwrap();
    assert!(path.exists());
}

// ---------------------------------------------------------------------------
// Test 6: Capture writes one image per section, numbering repeated names
// ---------------------------------------------------------------------------
#[test]
fn capture_writes_one_image_per_section() {
    let template = load_preset("detalle").unwrap();
    let mut pages = two_person_statement();
    // A second JUAN PEREZ section on the last page, before the end marker
    let last = pages.pop().unwrap();
    let mut tokens = last.tokens;
    tokens.retain(|t| t.rect.y0 < 200.0);
    let extra = PageBuilder::new(2)
        .line(300.0, &[(36.0, "Consumos JUAN PEREZ")])
        .header(320.0)
        .txn(340.0, "29-Ene-24", "PEAJE", "000301", "10,00", "")
        .line(360.0, &[(36.0, "TOTAL CONSUMOS DE JUAN PEREZ"), (400.0, "10,00"), (490.0, "0,00")])
        .build();
    let offset = tokens.iter().map(|t| t.block).max().unwrap_or(0) + 1;
    tokens.extend(extra.tokens.into_iter().map(|mut t| {
        t.block += offset;
        t
    }));
    pages.push(PageContent { tokens, ..last });

    let extractor = MockExtractor { pages };
    let dir = tempfile::tempdir().unwrap();
    let report = capture_pdf(&[], &extractor, &BlankRenderer, &template, 72, dir.path()).unwrap();

    let names: Vec<_> = report
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "Consumos JUAN PEREZ.jpg",
            "Consumos ANA GOMEZ.jpg",
            "Consumos JUAN PEREZ (2).jpg",
        ]
    );
    assert!(report.files.iter().all(|p| p.exists()));

    // First JUAN PEREZ section runs from page 2 into page 3
    let pages_used: Vec<_> = report.plans[0].slices.iter().map(|s| s.page).collect();
    assert_eq!(pages_used, vec![1, 2]);
    assert!(report.warnings.is_empty());
}
