use crate::model::Column;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A statement template: the markers, patterns and column geometry of one
/// statement layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// Substring that must appear on a page before any section is scanned.
    pub start_marker: String,
    /// Lines containing any of these stop the scan.
    pub end_markers: Vec<EndMarkerDef>,
    /// Regex whose first capture group is the person name.
    pub header_pattern: String,
    /// Label that precedes the person name on the closing total line.
    pub total_label: String,
    /// Word used in section headings and capture file names.
    pub section_title: String,
    /// Expected columns, left to right.
    pub columns: Vec<ColumnDef>,
    #[serde(default = "default_column_tolerance")]
    pub column_tolerance: f32,
    #[serde(default = "default_first_column_right_edge")]
    pub first_column_right_edge: f32,
    #[serde(default = "default_y_tolerance")]
    pub header_y_tolerance: f32,
    #[serde(default = "default_y_tolerance")]
    pub row_y_tolerance: f32,
    /// Alternate column order keyed by person name.
    #[serde(default)]
    pub column_order_overrides: BTreeMap<String, Vec<Column>>,
    #[serde(default)]
    pub capture: CaptureDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndMarkerDef {
    pub text: String,
    /// Only match lines whose top edge is above this y (points).
    #[serde(default)]
    pub max_top: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub column: Column,
    pub label: String,
    /// Left edge used when the label is not found on the header line.
    pub default_x: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureDef {
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_margin")]
    pub margin_px: u32,
    #[serde(default = "default_placeholder")]
    pub placeholder_name: String,
}

impl Default for CaptureDef {
    fn default() -> Self {
        CaptureDef {
            dpi: default_dpi(),
            margin_px: default_margin(),
            placeholder_name: default_placeholder(),
        }
    }
}

fn default_column_tolerance() -> f32 {
    6.0
}

fn default_first_column_right_edge() -> f32 {
    95.0
}

fn default_y_tolerance() -> f32 {
    5.0
}

fn default_dpi() -> u32 {
    300
}

fn default_margin() -> u32 {
    30
}

fn default_placeholder() -> String {
    "Persona XXX".into()
}
