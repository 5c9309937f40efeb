//! Column role detection over an unlabeled table
//!
//! Header names across banks are inconsistent and sometimes absent or
//! renamed, so each role is resolved by known header aliases first, gated
//! by a content check, with a content-only scan as fallback. Detection is a
//! pure function of the table; the normalizers clean values once roles are
//! fixed.

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ColumnMapping, RoleOverrides};
use crate::normalize::{self, DateOrder};
use crate::table::{Cell, ColumnType, Table};

const DATE_ALIASES: &[&str] = &[
    "date",
    "trans_date",
    "transaction_date",
    "posted_date",
    "value_date",
    "timestamp",
    "datetime",
];

const AMOUNT_ALIASES: &[&str] = &[
    "amount",
    "value",
    "debit",
    "credit",
    "transaction_amount",
    "sum",
    "total",
    "price",
    "amt",
];

const DESCRIPTION_ALIASES: &[&str] = &[
    "description",
    "memo",
    "details",
    "narrative",
    "particulars",
    "remarks",
    "merchant",
];

/// How many non-empty values to sample for content validation
const SAMPLE_SIZE: usize = 10;

/// Infer which column plays each of the three roles.
///
/// Roles resolve in a fixed order (date, amount, description); a column
/// claimed for an earlier role is never reconsidered for a later one.
/// Overrides bypass detection for a role when the named column exists.
/// Fails with [`Error::DetectionFailed`] (carrying the available column
/// names) unless all three roles resolve to distinct columns.
pub fn detect(table: &Table, overrides: &RoleOverrides) -> Result<ColumnMapping> {
    let mut claimed: Vec<usize> = Vec::new();

    let date_idx = resolve_role(
        table,
        overrides.date.as_deref(),
        DATE_ALIASES,
        Some(&date_sample_ok),
        &claimed,
    );
    if let Some(idx) = date_idx {
        claimed.push(idx);
    }

    let amount_idx = resolve_role(
        table,
        overrides.amount.as_deref(),
        AMOUNT_ALIASES,
        Some(&amount_sample_ok),
        &claimed,
    );
    if let Some(idx) = amount_idx {
        claimed.push(idx);
    }

    let description_idx = resolve_role(
        table,
        overrides.description.as_deref(),
        DESCRIPTION_ALIASES,
        None,
        &claimed,
    )
    .or_else(|| {
        // No name match: first text-type column not already claimed
        (0..table.headers.len())
            .find(|i| !claimed.contains(i) && table.column_type(*i) == ColumnType::Text)
    });

    match (date_idx, amount_idx, description_idx) {
        (Some(d), Some(a), Some(desc)) => {
            let mapping = ColumnMapping {
                date: table.headers[d].clone(),
                amount: table.headers[a].clone(),
                description: table.headers[desc].clone(),
            };
            debug!(
                date = %mapping.date,
                amount = %mapping.amount,
                description = %mapping.description,
                "Detected column mapping"
            );
            Ok(mapping)
        }
        _ => Err(Error::DetectionFailed {
            available: table.headers.clone(),
        }),
    }
}

type Validator = dyn Fn(&[&Cell]) -> bool;

/// Resolve one role: override, then alias name match (content-gated for
/// date/amount), then a content-only scan across all columns.
fn resolve_role(
    table: &Table,
    override_name: Option<&str>,
    aliases: &[&str],
    validator: Option<&Validator>,
    claimed: &[usize],
) -> Option<usize> {
    if let Some(name) = override_name {
        if let Some(idx) = table.column_index(name) {
            if !claimed.contains(&idx) {
                return Some(idx);
            }
        }
    }

    // Name match: normalized header contains any alias as a substring
    for (idx, header) in table.headers.iter().enumerate() {
        if claimed.contains(&idx) {
            continue;
        }
        let normalized = header.to_lowercase();
        let normalized = normalized.trim();
        if aliases.iter().any(|a| normalized.contains(a)) {
            match validator {
                Some(check) => {
                    let sample = sample_values(table, idx);
                    if check(&sample) {
                        return Some(idx);
                    }
                    // A name like "Date" over free text must not be accepted
                    // blindly; keep scanning other name matches.
                }
                None => return Some(idx),
            }
        }
    }

    // Fallback: scan all columns regardless of name
    if let Some(check) = validator {
        for idx in 0..table.headers.len() {
            if claimed.contains(&idx) {
                continue;
            }
            let sample = sample_values(table, idx);
            if check(&sample) {
                return Some(idx);
            }
        }
    }

    None
}

fn sample_values(table: &Table, index: usize) -> Vec<&Cell> {
    table
        .column_values(index)
        .into_iter()
        .take(SAMPLE_SIZE)
        .collect()
}

/// At least half the sample must parse as a calendar date under either the
/// month-first or the day-first convention. Numeric cells pass when they sit
/// in the spreadsheet serial date window.
fn date_sample_ok(sample: &[&Cell]) -> bool {
    if sample.is_empty() {
        return false;
    }
    let needed = std::cmp::max(1, sample.len() / 2);

    let parsed = |order: DateOrder| {
        sample
            .iter()
            .filter(|cell| match cell {
                Cell::Number(n) => normalize::serial_to_date(*n).is_some(),
                Cell::Text(s) => normalize::parse_date(s, order).is_some(),
            })
            .count()
    };

    parsed(DateOrder::MonthFirst) >= needed || parsed(DateOrder::DayFirst) >= needed
}

/// At least half the sample must survive amount normalization
fn amount_sample_ok(sample: &[&Cell]) -> bool {
    if sample.is_empty() {
        return false;
    }
    let needed = std::cmp::max(1, sample.len() / 2);

    let parsed = sample
        .iter()
        .filter(|cell| match cell {
            Cell::Number(_) => true,
            Cell::Text(s) => normalize::parse_amount(s).is_some(),
        })
        .count();

    parsed >= needed
}
