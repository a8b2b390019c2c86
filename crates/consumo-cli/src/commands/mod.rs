pub mod capture;
pub mod parse;
pub mod send;
pub mod template;

use consumo_core::error::ConsumoError;
use consumo_core::template::{builtin, load_template, Template};
use std::path::Path;

/// Custom template from a file, or the built-in default.
pub fn resolve_template(path: Option<&Path>) -> Result<Template, ConsumoError> {
    let template = match path {
        Some(path) => load_template(path)?,
        None => builtin::load_preset("detalle")?,
    };
    tracing::debug!(template = %template.name, "template resolved");
    Ok(template)
}
