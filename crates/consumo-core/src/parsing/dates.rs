use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Transaction dates: day, three-letter month (Spanish or English), two-digit
/// year, with optional `-`, `/` or space separators. `05-Ene-24`, `5 Jan 24`.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2})[-/\s]?(jan|ene|feb|mar|abr|apr|may|jun|jul|ago|aug|sep|oct|nov|dic|dec)[-/\s]?(\d{2})$",
    )
    .expect("valid date regex")
});

/// Check whether a date cell has the shape of a transaction date.
pub fn is_transaction_date(cell: &str) -> bool {
    DATE_RE.is_match(cell.trim())
}

/// Parse a transaction date cell.
///
/// Two-digit years are placed in the century of `reference_year`. Returns
/// None when the cell does not match the date shape or names an impossible
/// day (`31-Feb-24`).
pub fn parse_transaction_date(cell: &str, reference_year: i32) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(cell.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let yy: i32 = caps[3].parse().ok()?;
    let year = (reference_year / 100) * 100 + yy;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_lowercase().as_str() {
        "jan" | "ene" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" | "abr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" | "ago" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" | "dic" => 12,
        _ => return None,
    };
    Some(month)
}
