use consumo_core::error::ConsumoError;
use consumo_core::model::ParsedStatement;

pub fn print(parsed: &ParsedStatement) -> Result<(), ConsumoError> {
    let json = serde_json::to_string_pretty(parsed)?;
    println!("{json}");
    Ok(())
}
