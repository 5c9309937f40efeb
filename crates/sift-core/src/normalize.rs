//! Field normalizers for the ingestion pipeline
//!
//! Each normalizer takes raw values for a column whose role is already
//! fixed and produces cleaned values; rows that fail to clean are dropped
//! and counted by the pipeline, never escalated per-value.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Placeholder used when a description cell is missing entirely
pub const UNKNOWN_DESCRIPTION: &str = "Unknown Transaction";

/// Descriptions are truncated to this many characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Spreadsheet serial dates count days from this epoch
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Which side of an ambiguous numeric date is the month.
///
/// One export uses one convention consistently, so this is decided once per
/// column - mixing interpretations row-by-row would silently corrupt dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    MonthFirst,
    DayFirst,
}

const MONTH_FIRST_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-01-15
    "%Y/%m/%d", // 2024/01/15
    "%m/%d/%Y", // 01/15/2024
    "%m/%d/%y", // 01/15/24
    "%m-%d-%Y", // 01-15-2024
    "%b %d, %Y", // Jan 15, 2024
];

const DAY_FIRST_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-01-15
    "%Y/%m/%d", // 2024/01/15
    "%d/%m/%Y", // 15/01/2024
    "%d/%m/%y", // 15/01/24
    "%d-%m-%Y", // 15-01-2024
    "%d %b %Y", // 15 Jan 2024
];

/// Parse one date string under the given convention
pub fn parse_date(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let formats = match order {
        DateOrder::MonthFirst => MONTH_FIRST_FORMATS,
        DateOrder::DayFirst => DAY_FIRST_FORMATS,
    };

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    None
}

/// Convert a spreadsheet serial date number (days since 1899-12-30)
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Sanity window: serial 1 is 1899-12-31, ~80000 is well past year 2100
    if !(1.0..=200_000.0).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Pick the date convention for a whole column.
///
/// Month-first is the default. When more than a third of values fail under
/// it, the column is re-parsed day-first and the interpretation with
/// strictly fewer failures wins; ties keep month-first.
pub fn choose_date_order(values: &[String]) -> DateOrder {
    let total = values.len();
    if total == 0 {
        return DateOrder::MonthFirst;
    }

    let failures = |order: DateOrder| {
        values
            .iter()
            .filter(|v| parse_date(v, order).is_none())
            .count()
    };

    let month_first_failures = failures(DateOrder::MonthFirst);
    if month_first_failures > std::cmp::max(1, total / 3) {
        let day_first_failures = failures(DateOrder::DayFirst);
        if day_first_failures < month_first_failures {
            return DateOrder::DayFirst;
        }
    }

    DateOrder::MonthFirst
}

/// Parse a raw amount string into a signed decimal.
///
/// Handles, in order: unicode minus, currency symbols and 2-3 letter
/// currency codes, embedded CR/DR tokens, accounting parentheses, leading
/// sign characters, thousands separators, and residual noise. Returns None
/// when nothing numeric remains.
///
/// Sign precedence: CR/DR token > parentheses > leading sign. Export formats
/// variably encode debits as "(50.00)", "-50.00", or "50.00 DR" - all three
/// must normalize to the same signed value.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut s = raw.trim().replace('\u{2212}', "-");
    for sym in ['£', '$', '€', '¥', '₦', '₪', '₹'] {
        s = s.replace(sym, "");
    }
    s.retain(|c| c != ' ');

    // Pull out alphabetic runs: CR/DR carry sign information, anything else
    // (currency codes like NGN, USD) is noise.
    let mut token_sign: Option<Decimal> = None;
    let mut stripped = String::with_capacity(s.len());
    let mut run = String::new();
    for c in s.chars().chain(std::iter::once('\0')) {
        if c.is_alphabetic() {
            run.push(c);
            continue;
        }
        if !run.is_empty() {
            match run.to_ascii_lowercase().as_str() {
                "cr" => token_sign = Some(Decimal::ONE),
                "dr" => token_sign = Some(Decimal::NEGATIVE_ONE),
                _ => {}
            }
            run.clear();
        }
        if c != '\0' {
            stripped.push(c);
        }
    }
    let mut s = stripped;

    let mut paren_sign: Option<Decimal> = None;
    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        paren_sign = Some(Decimal::NEGATIVE_ONE);
        s = s[1..s.len() - 1].to_string();
    }

    let mut leading_sign: Option<Decimal> = None;
    if let Some(rest) = s.strip_prefix('-') {
        leading_sign = Some(Decimal::NEGATIVE_ONE);
        s = rest.to_string();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.to_string();
    }

    s.retain(|c| c != ',');

    // Residue: digits plus at most one decimal point
    let mut digits = String::with_capacity(s.len());
    let mut seen_point = false;
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c == '.' && !seen_point {
            seen_point = true;
            digits.push(c);
        }
    }

    if digits.is_empty() || digits == "." {
        return None;
    }

    let magnitude = Decimal::from_str(&digits).ok()?.round_dp(2);
    let sign = token_sign
        .or(paren_sign)
        .or(leading_sign)
        .unwrap_or(Decimal::ONE);
    Some(magnitude * sign)
}

/// Clean a raw description value.
///
/// Missing cells become the fixed placeholder; present values are trimmed,
/// internal whitespace runs collapse to one space, and the result is
/// truncated to 500 characters. Returns None (drop the row) when the result
/// is empty.
pub fn clean_description(value: Option<&str>) -> Option<String> {
    let raw = match value {
        None => return Some(UNKNOWN_DESCRIPTION.to_string()),
        Some(v) => v,
    };

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    Some(collapsed.chars().take(MAX_DESCRIPTION_LEN).collect())
}
