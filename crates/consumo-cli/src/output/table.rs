use consumo_core::model::{ParsedStatement, Row};
use consumo_core::output::format_amount;
use consumo_core::output::table::StatementTable;
use consumo_core::output::text::render_text;

/// Print the fixed-width report followed by a per-person summary.
pub fn print(parsed: &ParsedStatement, table: &StatementTable) {
    print!("{}", render_text(table));

    if parsed.persons.is_empty() {
        println!("No consumption sections found.");
        return;
    }

    let max_name = parsed
        .persons
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(10);

    println!("=== Summary ===\n");
    for person in &parsed.persons {
        let totals = match person.total() {
            Some(Row::Total {
                amount_a, amount_b, ..
            }) => format!(
                "PESOS {:>12}  DÓLARES {:>10}",
                amount_a.map(format_amount).unwrap_or_else(|| "-".into()),
                amount_b.map(format_amount).unwrap_or_else(|| "-".into()),
            ),
            _ => "no total line".into(),
        };
        println!(
            "  {:<width$}  {:>3} transaction(s)  {}",
            person.name,
            person.transactions().count(),
            totals,
            width = max_name
        );
    }
}
