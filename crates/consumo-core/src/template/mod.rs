pub mod builtin;
pub mod schema;

use crate::error::ConsumoError;
use crate::model::Column;
use crate::parsing::normalize::normalize_name;
use regex::Regex;
use schema::{CaptureDef, ColumnDef, EndMarkerDef, TemplateDef};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A validated statement template with its patterns compiled.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub start_marker: String,
    pub end_markers: Vec<EndMarkerDef>,
    pub header_pattern: Regex,
    pub total_label: String,
    pub section_title: String,
    pub columns: Vec<ColumnDef>,
    pub column_tolerance: f32,
    pub first_column_right_edge: f32,
    pub header_y_tolerance: f32,
    pub row_y_tolerance: f32,
    /// Keyed by normalized person name.
    pub column_order_overrides: HashMap<String, Vec<Column>>,
    pub capture: CaptureDef,
}

impl Template {
    pub fn column_def(&self, column: Column) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Expected column order on the header line.
    pub fn default_order(&self) -> Vec<Column> {
        self.columns.iter().map(|c| c.column).collect()
    }

    pub fn override_for(&self, name: &str) -> Option<&[Column]> {
        self.column_order_overrides
            .get(&normalize_name(name))
            .map(Vec::as_slice)
    }

    /// True if the line text holds one of the end markers.
    pub fn is_end_marker(&self, text: &str, top: f32) -> bool {
        self.end_markers.iter().any(|m| {
            text.contains(&m.text) && m.max_top.map_or(true, |max_top| top < max_top)
        })
    }
}

/// Load a template from a JSON file.
pub fn load_template(path: &Path) -> Result<Template, ConsumoError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConsumoError::TemplateLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let def: TemplateDef =
        serde_json::from_str(&content).map_err(|e| ConsumoError::TemplateLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    compile(def)
}

/// Parse a template from a JSON string (no file path context).
pub fn parse_template_str(json: &str) -> Result<Template, ConsumoError> {
    let def: TemplateDef = serde_json::from_str(json)?;
    compile(def)
}

/// Validate a template definition and compile its patterns.
pub fn compile(def: TemplateDef) -> Result<Template, ConsumoError> {
    if def.start_marker.trim().is_empty() {
        return Err(ConsumoError::TemplateInvalid(
            "start_marker must not be empty".into(),
        ));
    }

    if def.total_label.trim().is_empty() {
        return Err(ConsumoError::TemplateInvalid(
            "total_label must not be empty".into(),
        ));
    }

    if def.end_markers.iter().any(|m| m.text.trim().is_empty()) {
        return Err(ConsumoError::TemplateInvalid(
            "end marker text must not be empty".into(),
        ));
    }

    let header_pattern = Regex::new(&def.header_pattern).map_err(|e| {
        ConsumoError::TemplateInvalid(format!("invalid header_pattern: {e}"))
    })?;
    if header_pattern.captures_len() < 2 {
        return Err(ConsumoError::TemplateInvalid(
            "header_pattern must capture the person name in group 1".into(),
        ));
    }

    validate_columns(&def.columns)?;

    let configured: HashSet<Column> = def.columns.iter().map(|c| c.column).collect();
    let mut column_order_overrides = HashMap::new();
    for (name, order) in def.column_order_overrides {
        let ordered: HashSet<Column> = order.iter().copied().collect();
        if ordered != configured || order.len() != configured.len() {
            return Err(ConsumoError::TemplateInvalid(format!(
                "column order override for '{}' must list each configured column once",
                name
            )));
        }
        column_order_overrides.insert(normalize_name(&name), order);
    }

    if def.capture.dpi == 0 {
        return Err(ConsumoError::TemplateInvalid(
            "capture dpi must be positive".into(),
        ));
    }

    Ok(Template {
        name: def.name,
        start_marker: def.start_marker,
        end_markers: def.end_markers,
        header_pattern,
        total_label: def.total_label,
        section_title: def.section_title,
        columns: def.columns,
        column_tolerance: def.column_tolerance,
        first_column_right_edge: def.first_column_right_edge,
        header_y_tolerance: def.header_y_tolerance,
        row_y_tolerance: def.row_y_tolerance,
        column_order_overrides,
        capture: def.capture,
    })
}

fn validate_columns(columns: &[ColumnDef]) -> Result<(), ConsumoError> {
    if columns.is_empty() {
        return Err(ConsumoError::TemplateInvalid(
            "columns must not be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for col in columns {
        if col.label.trim().is_empty() {
            return Err(ConsumoError::TemplateInvalid(format!(
                "column '{:?}' has an empty label",
                col.column
            )));
        }
        if !seen.insert(col.column) {
            return Err(ConsumoError::TemplateInvalid(format!(
                "column '{:?}' is listed twice",
                col.column
            )));
        }
    }

    if !seen.contains(&Column::Date) {
        return Err(ConsumoError::TemplateInvalid(
            "columns must include the date column".into(),
        ));
    }

    if !columns.iter().any(|c| c.column.is_amount()) {
        return Err(ConsumoError::TemplateInvalid(
            "columns must include at least one amount column".into(),
        ));
    }

    Ok(())
}
