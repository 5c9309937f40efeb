//! Monthly budget limits per category

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Budget;

fn row_to_budget(row: &Row) -> rusqlite::Result<Budget> {
    let amount_str: String = row.get(3)?;
    let month_str: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        month: NaiveDate::parse_from_str(&month_str, "%Y-%m-%d").unwrap_or_default(),
        created_at: parse_datetime(&created_at),
        category_name: row.get(6)?,
    })
}

const SELECT_BUDGET: &str = r#"
    SELECT b.id, b.user_id, b.category_id, b.amount, b.month, b.created_at, c.name
    FROM budgets b
    INNER JOIN categories c ON b.category_id = c.id
"#;

impl Database {
    /// List a user's budgets, most recent month first
    pub fn list_budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE b.user_id = ? ORDER BY b.month DESC, c.name",
            SELECT_BUDGET
        ))?;

        let budgets = stmt
            .query_map(params![user_id], row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    pub fn get_budget(&self, id: i64, user_id: i64) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                &format!("{} WHERE b.id = ? AND b.user_id = ?", SELECT_BUDGET),
                params![id, user_id],
                row_to_budget,
            )
            .optional()?;
        Ok(budget)
    }

    /// Create a budget for (user, category, month). The month is snapped to
    /// its first day.
    pub fn create_budget(
        &self,
        user_id: i64,
        category_id: i64,
        amount: Decimal,
        month: NaiveDate,
    ) -> Result<Budget> {
        if amount < Decimal::ZERO {
            return Err(Error::InvalidData("Budget amount must be non-negative".to_string()));
        }
        if self.get_visible_category(category_id, user_id)?.is_none() {
            return Err(Error::InvalidData(format!(
                "Category {} not found",
                category_id
            )));
        }

        let month = month.with_day(1).unwrap_or(month);

        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO budgets (user_id, category_id, amount, month) VALUES (?, ?, ?, ?)",
            params![
                user_id,
                category_id,
                amount.round_dp(2).to_string(),
                month.to_string()
            ],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                drop(conn);
                self.get_budget(id, user_id)?
                    .ok_or_else(|| Error::NotFound("Budget not found after creation".to_string()))
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::InvalidData(
                    "A budget for this category and month already exists".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update a budget's amount
    pub fn update_budget(&self, id: i64, user_id: i64, amount: Decimal) -> Result<Budget> {
        if amount < Decimal::ZERO {
            return Err(Error::InvalidData("Budget amount must be non-negative".to_string()));
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE budgets SET amount = ? WHERE id = ? AND user_id = ?",
            params![amount.round_dp(2).to_string(), id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("Budget not found".to_string()));
        }
        drop(conn);

        self.get_budget(id, user_id)?
            .ok_or_else(|| Error::NotFound("Budget not found".to_string()))
    }

    pub fn delete_budget(&self, id: i64, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM budgets WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("Budget not found".to_string()));
        }
        Ok(())
    }
}
