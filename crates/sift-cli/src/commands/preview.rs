//! `sift preview` - run the ingestion pipeline on a local file

use anyhow::{Context, Result};

use sift_core::ingest::ingest;
use sift_core::models::RoleOverrides;

pub fn cmd_preview(
    file: &str,
    date_column: Option<&str>,
    amount_column: Option<&str>,
    description_column: Option<&str>,
) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("Failed to read {}", file))?;

    let overrides = RoleOverrides {
        date: date_column.map(String::from),
        amount: amount_column.map(String::from),
        description: description_column.map(String::from),
    };

    let outcome = ingest(&data, file, &overrides)?;

    println!("Column mapping:");
    println!("  date        <- {}", outcome.column_mapping.date);
    println!("  amount      <- {}", outcome.column_mapping.amount);
    println!("  description <- {}", outcome.column_mapping.description);
    println!();

    println!(
        "{:<12} {:>12}  {:<8} {}",
        "Date", "Amount", "Type", "Description"
    );
    for tx in &outcome.transactions {
        println!(
            "{:<12} {:>12}  {:<8} {}",
            tx.date.to_string(),
            tx.amount.to_string(),
            tx.direction.as_str(),
            tx.description
        );
    }

    println!();
    println!(
        "{} transaction(s), {} row(s) dropped ({})",
        outcome.transactions.len(),
        outcome.rejected.total(),
        outcome.rejected
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_preview_reads_statement() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Date,Amount,Description").unwrap();
        writeln!(file, "2024-01-15,50.00,Uber ride").unwrap();
        file.flush().unwrap();

        let path = file.path().to_str().unwrap().to_string();
        cmd_preview(&path, None, None, None).unwrap();
    }

    #[test]
    fn test_preview_missing_file_errors() {
        assert!(cmd_preview("/no/such/file.csv", None, None, None).is_err());
    }
}
