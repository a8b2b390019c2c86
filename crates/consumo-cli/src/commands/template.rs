use consumo_core::error::ConsumoError;
use consumo_core::template::{builtin, load_template};
use std::path::Path;

pub fn list() -> Result<(), ConsumoError> {
    println!("Available predefined templates:\n");
    for name in builtin::PRESETS {
        let def = builtin::load_preset_def(name)?;
        println!("  {:<8} {} (v{})", name, def.name, def.version);
        if let Some(ref desc) = def.description {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), ConsumoError> {
    let def = builtin::load_preset_def(preset)?;
    println!("{}", serde_json::to_string_pretty(&def)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), ConsumoError> {
    let template = load_template(file)?;
    println!("Valid template: {}", template.name);
    println!("  start marker: {}", template.start_marker);
    println!(
        "  end markers:  {}",
        template
            .end_markers
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  columns:      {}",
        template
            .columns
            .iter()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    );
    if !template.column_order_overrides.is_empty() {
        println!(
            "  overrides:    {} person(s)",
            template.column_order_overrides.len()
        );
    }
    Ok(())
}
