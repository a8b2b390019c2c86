use crate::error::ConsumoError;
use crate::template::schema::TemplateDef;
use crate::template::{compile, Template};

const DETALLE_JSON: &str = include_str!("../../../../templates/detalle.json");

/// Available predefined templates.
pub const PRESETS: &[&str] = &["detalle"];

/// Load the definition of a predefined template by name.
pub fn load_preset_def(name: &str) -> Result<TemplateDef, ConsumoError> {
    match name {
        "detalle" => Ok(serde_json::from_str(DETALLE_JSON)?),
        _ => Err(ConsumoError::TemplateInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

/// Load and compile a predefined template by name.
pub fn load_preset(name: &str) -> Result<Template, ConsumoError> {
    compile(load_preset_def(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    #[test]
    fn test_load_detalle_preset() {
        let t = load_preset("detalle").unwrap();
        assert_eq!(t.start_marker, "DETALLE");
        assert_eq!(t.end_markers.len(), 2);
        assert_eq!(t.columns.len(), 5);
        assert_eq!(t.columns[0].column, Column::Date);
        assert_eq!(t.column_tolerance, 6.0);
        assert_eq!(t.capture.dpi, 300);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("xyz").is_err());
    }
}
