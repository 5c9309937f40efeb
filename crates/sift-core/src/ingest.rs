//! End-to-end statement ingestion pipeline
//!
//! Loader -> detector -> normalizers -> classifier. The pipeline is
//! synchronous and operates on one freshly loaded table per call; row-level
//! failures are dropped and counted per stage, and only surface as an error
//! when no row survives at all. Financial exports routinely contain a few
//! header/footer/subtotal rows that are not transactions, so best-effort
//! extraction with auditable loss is the contract.

use std::collections::HashSet;
use std::fmt;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::detect;
use crate::error::{Error, Result};
use crate::models::{ColumnMapping, Direction, ParsedTransaction, RoleOverrides};
use crate::normalize;
use crate::table::{self, Cell};

/// Per-stage counts of rows the pipeline dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    /// Rows whose three role cells were all empty
    pub empty_rows: usize,
    /// Exact duplicate (date, amount, description) raw rows
    pub duplicate_rows: usize,
    pub bad_dates: usize,
    pub bad_amounts: usize,
    pub empty_descriptions: usize,
}

impl RejectionCounts {
    pub fn total(&self) -> usize {
        self.empty_rows
            + self.duplicate_rows
            + self.bad_dates
            + self.bad_amounts
            + self.empty_descriptions
    }
}

impl fmt::Display for RejectionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "empty rows: {}, duplicates: {}, bad dates: {}, bad amounts: {}, empty descriptions: {}",
            self.empty_rows,
            self.duplicate_rows,
            self.bad_dates,
            self.bad_amounts,
            self.empty_descriptions
        )
    }
}

/// Successful pipeline output: the mapping that was used, the surviving
/// transactions in input order, and what was dropped along the way.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub column_mapping: ColumnMapping,
    pub transactions: Vec<ParsedTransaction>,
    pub rejected: RejectionCounts,
}

/// Run the full pipeline over an uploaded statement.
///
/// Suggested categories are not attached here; compose with
/// [`crate::rules::apply_suggestions`] to pre-fill them from a rule set.
pub fn ingest(data: &[u8], filename: &str, overrides: &RoleOverrides) -> Result<IngestOutcome> {
    let table = table::load(data, filename)?;
    let mapping = detect::detect(&table, overrides)?;

    let date_idx = column_index(&table, &mapping.date)?;
    let amount_idx = column_index(&table, &mapping.amount)?;
    let description_idx = column_index(&table, &mapping.description)?;

    let mut rejected = RejectionCounts::default();

    // Pre-clean: drop rows with nothing in any role cell, then exact
    // duplicates of the raw (date, amount, description) triple.
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut raw_rows: Vec<(Option<Cell>, Option<Cell>, Option<Cell>)> = Vec::new();
    for row in &table.rows {
        let date = row[date_idx].clone();
        let amount = row[amount_idx].clone();
        let description = row[description_idx].clone();

        if date.is_none() && amount.is_none() && description.is_none() {
            rejected.empty_rows += 1;
            continue;
        }

        let key = (cell_key(&date), cell_key(&amount), cell_key(&description));
        if !seen.insert(key) {
            rejected.duplicate_rows += 1;
            continue;
        }

        raw_rows.push((date, amount, description));
    }

    // Column-wide date decision: uniformly numeric values are spreadsheet
    // serials; otherwise one month-first/day-first convention is chosen for
    // the entire column, never per row.
    let date_cells: Vec<&Cell> = raw_rows.iter().filter_map(|(d, _, _)| d.as_ref()).collect();
    let serial_dates =
        !date_cells.is_empty() && date_cells.iter().all(|c| c.as_number().is_some());
    let date_order = if serial_dates {
        normalize::DateOrder::MonthFirst
    } else {
        let texts: Vec<String> = date_cells.iter().map(|c| c.as_text()).collect();
        normalize::choose_date_order(&texts)
    };

    let mut transactions = Vec::new();
    for (raw_date, raw_amount, raw_description) in raw_rows {
        let date = raw_date.and_then(|cell| {
            if serial_dates {
                cell.as_number().and_then(normalize::serial_to_date)
            } else {
                normalize::parse_date(&cell.as_text(), date_order)
            }
        });
        let date = match date {
            Some(d) => d,
            None => {
                rejected.bad_dates += 1;
                continue;
            }
        };

        let signed = raw_amount.and_then(|cell| match cell {
            Cell::Number(n) => Decimal::from_f64(n).map(|d| d.round_dp(2)),
            Cell::Text(s) => normalize::parse_amount(&s),
        });
        let signed = match signed {
            Some(a) => a,
            None => {
                rejected.bad_amounts += 1;
                continue;
            }
        };

        let description = match normalize::clean_description(
            raw_description.map(|c| c.as_text()).as_deref(),
        ) {
            Some(d) => d,
            None => {
                rejected.empty_descriptions += 1;
                continue;
            }
        };

        transactions.push(ParsedTransaction {
            date,
            amount: signed.abs(),
            direction: Direction::classify(signed),
            description,
            category_id: None,
            category_name: None,
        });
    }

    if transactions.is_empty() {
        return Err(Error::NoSurvivingRows(rejected));
    }

    debug!(
        kept = transactions.len(),
        dropped = rejected.total(),
        "Ingestion pipeline complete"
    );

    Ok(IngestOutcome {
        column_mapping: mapping,
        transactions,
        rejected,
    })
}

fn column_index(table: &table::Table, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| Error::InvalidData(format!("Column not found: {}", name)))
}

fn cell_key(cell: &Option<Cell>) -> String {
    cell.as_ref().map(|c| c.as_text()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn no_overrides() -> RoleOverrides {
        RoleOverrides::default()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_end_to_end_aliased_statement() {
        let csv = b"Trans Date,Narration,Debit\n2024-01-15,\"Uber ride\",50.00\n2024-01-16,\"Salary deposit\",-1500.00\n";
        let outcome = ingest(csv, "statement.csv", &no_overrides()).unwrap();

        assert_eq!(outcome.column_mapping.date, "Trans Date");
        assert_eq!(outcome.column_mapping.description, "Narration");
        assert_eq!(outcome.column_mapping.amount, "Debit");

        assert_eq!(outcome.transactions.len(), 2);
        let first = &outcome.transactions[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.amount, dec("50.00"));
        assert_eq!(first.direction, Direction::Debit);
        assert_eq!(first.description, "Uber ride");

        let second = &outcome.transactions[1];
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(second.amount, dec("1500.00"));
        assert_eq!(second.direction, Direction::Credit);
        assert_eq!(second.description, "Salary deposit");
    }

    #[test]
    fn test_debit_encodings_all_classify_as_debit() {
        let csv = b"Date,Amount,Description\n\
2024-01-15,-50.00,One\n\
2024-01-16,(50.00),Two\n\
2024-01-17,50.00 DR,Three\n";
        let outcome = ingest(csv, "s.csv", &no_overrides()).unwrap();
        assert_eq!(outcome.transactions.len(), 3);
        for tx in &outcome.transactions {
            assert_eq!(tx.amount, dec("50.00"));
            assert_eq!(tx.direction, Direction::Debit);
        }
    }

    #[test]
    fn test_bad_amount_row_dropped_not_fatal() {
        let csv = b"Date,Amount,Description\n2024-01-15,abc,Junk\n2024-01-16,9.00,Tea\n";
        let outcome = ingest(csv, "s.csv", &no_overrides()).unwrap();
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.rejected.bad_amounts, 1);
        assert_eq!(outcome.transactions[0].description, "Tea");
    }

    #[test]
    fn test_all_bad_amounts_is_no_surviving_rows() {
        let csv = b"Date,Amount,Description\n2024-01-15,abc,One\n2024-01-16,abc,Two\n";
        let result = ingest(csv, "s.csv", &no_overrides());
        match result {
            Err(Error::NoSurvivingRows(counts)) => assert_eq!(counts.bad_amounts, 2),
            other => panic!("expected NoSurvivingRows, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_date_convention_is_column_wide() {
        // Half the rows only parse day-first, which is more than a third of
        // the column; the whole column switches, including the ambiguous
        // rows - never a per-row mix.
        let csv = b"Date,Amount,Description\n\
01/02/2024,1.00,One\n\
03/04/2024,2.00,Two\n\
05/06/2024,3.00,Three\n\
25/06/2024,4.00,Four\n\
26/06/2024,5.00,Five\n\
27/06/2024,6.00,Six\n";
        let outcome = ingest(csv, "s.csv", &no_overrides()).unwrap();
        assert_eq!(outcome.transactions.len(), 6);
        assert_eq!(outcome.rejected.bad_dates, 0);
        assert_eq!(
            outcome.transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert_eq!(
            outcome.transactions[3].date,
            NaiveDate::from_ymd_opt(2024, 6, 25).unwrap()
        );
    }

    #[test]
    fn test_few_day_first_rows_stay_month_first_and_drop() {
        // A single unparsable row is within the tolerated third: the column
        // keeps month-first and the odd row is dropped, not fatal.
        let csv = b"Date,Amount,Description\n\
01/02/2024,1.00,One\n\
03/04/2024,2.00,Two\n\
25/06/2024,3.00,Three\n";
        let outcome = ingest(csv, "s.csv", &no_overrides()).unwrap();
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.rejected.bad_dates, 1);
        assert_eq!(
            outcome.transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_ambiguous_dates_stay_month_first() {
        let csv = b"Date,Amount,Description\n01/02/2024,1.00,One\n03/04/2024,2.00,Two\n";
        let outcome = ingest(csv, "s.csv", &no_overrides()).unwrap();
        assert_eq!(
            outcome.transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(
            outcome.transactions[1].date,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
    }

    #[test]
    fn test_serial_date_column() {
        // Uniformly numeric date column reads as spreadsheet serials. Plain
        // numbers never pass the date content validator, so this path is
        // reached via a manual override, as when a caller maps columns by
        // hand.
        let csv = b"Date,Amount,Description\n45306,50.00,Coffee\n45307,9.00,Tea\n";
        let overrides = RoleOverrides {
            date: Some("Date".to_string()),
            ..Default::default()
        };
        let outcome = ingest(csv, "s.csv", &overrides).unwrap();
        assert_eq!(
            outcome.transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            outcome.transactions[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
    }

    #[test]
    fn test_missing_description_gets_placeholder() {
        let csv = b"Date,Amount,Description\n2024-01-15,50.00,\n";
        let outcome = ingest(csv, "s.csv", &no_overrides()).unwrap();
        assert_eq!(
            outcome.transactions[0].description,
            normalize::UNKNOWN_DESCRIPTION
        );
    }

    #[test]
    fn test_duplicate_rows_dropped() {
        let csv = b"Date,Amount,Description\n\
2024-01-15,50.00,Coffee\n\
2024-01-15,50.00,Coffee\n\
2024-01-16,9.00,Tea\n";
        let outcome = ingest(csv, "s.csv", &no_overrides()).unwrap();
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.rejected.duplicate_rows, 1);
    }

    #[test]
    fn test_zero_amount_is_neutral() {
        let csv = b"Date,Amount,Description\n2024-01-15,0.00,Adjustment\n";
        let outcome = ingest(csv, "s.csv", &no_overrides()).unwrap();
        assert_eq!(outcome.transactions[0].direction, Direction::Neutral);
        assert_eq!(outcome.transactions[0].amount, Decimal::ZERO);
    }
}
