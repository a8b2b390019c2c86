/// Normalize a person name to its canonical key.
///
/// Trims, uppercases and collapses internal whitespace runs to a single
/// space, so `" juan  perez "` and `"JUAN PEREZ"` compare equal.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Normalize a column label or header token for containment matching.
///
/// Spaces and dots are dropped and the rest uppercased: `"NRO. CUPÓN"`
/// becomes `"NROCUPÓN"`.
pub fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect::<String>()
        .to_uppercase()
}

/// Collapse the doubled punctuation left behind by glyph-level extraction.
pub fn repair_cell(raw: &str) -> String {
    raw.trim()
        .replace("--", "-")
        .replace(",,", ",")
        .replace(". .", ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  juan   perez "), "JUAN PEREZ");
        assert_eq!(normalize_name("María Núñez"), "MARÍA NÚÑEZ");
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("NRO. CUPÓN"), "NROCUPÓN");
        assert_eq!(normalize_label("Descripción"), "DESCRIPCIÓN");
    }

    #[test]
    fn test_repair_cell() {
        assert_eq!(repair_cell(" 1.234,,56-- "), "1.234,56-");
        assert_eq!(repair_cell("COMPRA. . ONLINE"), "COMPRA. ONLINE");
    }
}
