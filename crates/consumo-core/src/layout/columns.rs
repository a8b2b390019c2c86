use crate::extraction::Token;
use crate::layout::grouper::Line;
use crate::model::Column;
use crate::parsing::normalize::normalize_label;
use crate::template::Template;

/// Half-open horizontal interval `[x0, x1)` owned by one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpan {
    pub column: Column,
    pub x0: f32,
    /// `f32::INFINITY` for the rightmost column.
    pub x1: f32,
}

impl ColumnSpan {
    pub fn contains(&self, x: f32) -> bool {
        self.x0 <= x && x < self.x1
    }
}

/// Resolved column intervals for one section, in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    spans: Vec<ColumnSpan>,
}

impl ColumnMap {
    pub fn new(spans: Vec<ColumnSpan>) -> Self {
        ColumnMap { spans }
    }

    pub fn spans(&self) -> &[ColumnSpan] {
        &self.spans
    }

    /// First column whose interval contains `x`.
    pub fn column_at(&self, x: f32) -> Option<Column> {
        self.spans.iter().find(|s| s.contains(x)).map(|s| s.column)
    }

    pub fn order(&self) -> Vec<Column> {
        self.spans.iter().map(|s| s.column).collect()
    }
}

/// Detect a table header line: the date label plus at least one amount label.
pub fn is_column_header(template: &Template, text: &str) -> bool {
    let upper = text.to_uppercase();
    let has = |column: Column| {
        template
            .column_def(column)
            .is_some_and(|def| upper.contains(&def.label.to_uppercase()))
    };
    has(Column::Date) && (has(Column::AmountA) || has(Column::AmountB))
}

/// Resolve column intervals from a confirmed header line.
pub fn locate_columns(template: &Template, line: &Line, section_name: &str) -> ColumnMap {
    let order = column_order(template, &line.text, section_name);

    let candidates: Vec<&Token> = line
        .tokens
        .iter()
        .filter(|t| (t.rect.y0 - line.rect.y0).abs() < template.header_y_tolerance)
        .collect();

    let starts: Vec<f32> = order
        .iter()
        .map(|&column| {
            let Some(def) = template.column_def(column) else {
                return 0.0;
            };
            let x = match find_label_x(&candidates, &def.label) {
                Some(x) => x,
                None => {
                    tracing::debug!(
                        label = %def.label,
                        default_x = def.default_x,
                        "column label not found, using default"
                    );
                    def.default_x
                }
            };
            (x - template.column_tolerance).max(0.0)
        })
        .collect();

    let spans = order
        .iter()
        .enumerate()
        .map(|(k, &column)| {
            let x1 = if k == 0 {
                template.first_column_right_edge
            } else {
                starts.get(k + 1).copied().unwrap_or(f32::INFINITY)
            };
            ColumnSpan {
                column,
                x0: starts[k],
                x1,
            }
        })
        .collect();

    let map = ColumnMap::new(spans);
    tracing::debug!(section = %section_name, spans = ?map.spans(), "column map resolved");
    map
}

/// Expected column order for a section, honoring the per-name override when
/// the header text lists the reordered labels in the override's order.
fn column_order(template: &Template, header_text: &str, section_name: &str) -> Vec<Column> {
    let default = template.default_order();
    let Some(alternate) = template.override_for(section_name) else {
        return default;
    };

    let upper = header_text.to_uppercase();
    let moved: Vec<Option<usize>> = alternate
        .iter()
        .zip(&default)
        .filter(|(alt, def)| alt != def)
        .map(|(alt, _)| {
            template
                .column_def(*alt)
                .and_then(|d| upper.find(&d.label.to_uppercase()))
        })
        .collect();

    let confirmed = !moved.is_empty()
        && moved.iter().all(Option::is_some)
        && moved.windows(2).all(|w| w[0] < w[1]);

    if confirmed {
        tracing::debug!(section = %section_name, order = ?alternate, "column order override applied");
        alternate.to_vec()
    } else {
        default
    }
}

/// Leftmost x of a token, or run of adjacent tokens, containing the label.
fn find_label_x(tokens: &[&Token], label: &str) -> Option<f32> {
    let key = normalize_label(label);
    if key.is_empty() {
        return None;
    }
    let max_run = label.split_whitespace().count().max(1);

    (0..tokens.len()).find_map(|i| {
        let mut joined = String::new();
        for token in tokens.iter().skip(i).take(max_run) {
            joined.push_str(&normalize_label(&token.text));
            if joined.contains(&key) {
                return Some(tokens[i].rect.x0);
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::Rect;
    use crate::layout::grouper::group_lines;
    use crate::template::builtin::load_preset_def;
    use crate::template::compile;

    fn header_line(words: &[(&str, f32)]) -> Line {
        let tokens: Vec<Token> = words
            .iter()
            .enumerate()
            .map(|(i, (text, x))| Token {
                rect: Rect::new(*x, 200.0, *x + 30.0, 210.0),
                text: text.to_string(),
                block: 0,
                line: 0,
                word: i,
            })
            .collect();
        group_lines(&tokens).remove(0)
    }

    fn detalle() -> Template {
        compile(load_preset_def("detalle").unwrap()).unwrap()
    }

    #[test]
    fn test_is_column_header() {
        let t = detalle();
        assert!(is_column_header(&t, "FECHA DESCRIPCIÓN NRO. CUPÓN PESOS DÓLARES"));
        assert!(is_column_header(&t, "Fecha Dólares"));
        assert!(!is_column_header(&t, "FECHA DESCRIPCIÓN"));
        assert!(!is_column_header(&t, "PESOS DÓLARES"));
    }

    #[test]
    fn test_locate_columns_with_tolerance() {
        let t = detalle();
        let line = header_line(&[
            ("FECHA", 40.0),
            ("DESCRIPCIÓN", 100.0),
            ("NRO.", 310.0),
            ("CUPÓN", 330.0),
            ("PESOS", 400.0),
            ("DÓLARES", 490.0),
        ]);
        let map = locate_columns(&t, &line, "JUAN PEREZ");
        let spans = map.spans();
        assert_eq!(spans[0], ColumnSpan { column: Column::Date, x0: 34.0, x1: 95.0 });
        assert_eq!(spans[1], ColumnSpan { column: Column::Description, x0: 94.0, x1: 304.0 });
        assert_eq!(spans[2], ColumnSpan { column: Column::Voucher, x0: 304.0, x1: 394.0 });
        assert_eq!(spans[3], ColumnSpan { column: Column::AmountA, x0: 394.0, x1: 484.0 });
        assert_eq!(spans[4].x0, 484.0);
        assert!(spans[4].x1.is_infinite());
    }

    #[test]
    fn test_missing_labels_use_defaults() {
        let t = detalle();
        let line = header_line(&[("FECHA", 40.0), ("PESOS", 400.0)]);
        let map = locate_columns(&t, &line, "JUAN PEREZ");
        let starts: Vec<f32> = map.spans().iter().map(|s| s.x0).collect();
        assert_eq!(starts, vec![34.0, 89.0, 294.0, 394.0, 474.0]);
    }

    #[test]
    fn test_tolerance_floors_at_zero() {
        let t = detalle();
        let line = header_line(&[("FECHA", 2.0), ("PESOS", 400.0)]);
        let map = locate_columns(&t, &line, "JUAN PEREZ");
        assert_eq!(map.spans()[0].x0, 0.0);
    }

    #[test]
    fn test_column_at_first_match_wins() {
        let t = detalle();
        let line = header_line(&[("FECHA", 40.0), ("DESCRIPCIÓN", 95.0), ("PESOS", 400.0)]);
        let map = locate_columns(&t, &line, "JUAN PEREZ");
        // Date keeps its fixed right edge, overlapping the description start.
        assert_eq!(map.column_at(90.0), Some(Column::Date));
        assert_eq!(map.column_at(96.0), Some(Column::Description));
        assert_eq!(map.column_at(10.0), None);
        assert_eq!(map.column_at(5000.0), Some(Column::AmountB));
    }

    #[test]
    fn test_override_applies_when_header_confirms_order() {
        let mut def = load_preset_def("detalle").unwrap();
        def.column_order_overrides.insert(
            "Ana Gomez".into(),
            vec![
                Column::Date,
                Column::Description,
                Column::Voucher,
                Column::AmountB,
                Column::AmountA,
            ],
        );
        let t = compile(def).unwrap();
        let swapped = header_line(&[("FECHA", 40.0), ("DÓLARES", 400.0), ("PESOS", 490.0)]);

        let map = locate_columns(&t, &swapped, "ANA GOMEZ");
        assert_eq!(map.order()[3], Column::AmountB);
        assert_eq!(map.spans()[3].x0, 394.0);
        assert_eq!(map.spans()[4].x0, 484.0);

        // Same header for someone without an override keeps the default order
        let map = locate_columns(&t, &swapped, "JUAN PEREZ");
        assert_eq!(map.order()[3], Column::AmountA);

        // Override is not applied when the header shows the usual order
        let usual = header_line(&[("FECHA", 40.0), ("PESOS", 400.0), ("DÓLARES", 490.0)]);
        let map = locate_columns(&t, &usual, "ANA GOMEZ");
        assert_eq!(map.order()[3], Column::AmountA);
    }
}
