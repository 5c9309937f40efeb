//! Aggregation queries for analytics
//!
//! Amounts are stored as non-negative magnitudes with a separate direction
//! column, so sums never need sign juggling: income is the sum of CREDIT
//! rows, expenses the sum of DEBIT rows.

use chrono::{Duration, NaiveDate};
use rusqlite::params;

use super::Database;
use crate::error::Result;
use crate::models::{CategorySpending, Direction, MonthlyTotal, ReportPeriod, Summary};

impl Database {
    /// Overall financial summary for a date range
    pub fn summary(&self, user_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Summary> {
        let conn = self.conn()?;

        let total_for = |direction: Direction| -> Result<f64> {
            let total: f64 = conn.query_row(
                r#"
                SELECT COALESCE(ROUND(SUM(amount), 2), 0)
                FROM transactions
                WHERE user_id = ? AND direction = ? AND date BETWEEN ? AND ?
                "#,
                params![
                    user_id,
                    direction.as_str(),
                    start.to_string(),
                    end.to_string()
                ],
                |row| row.get(0),
            )?;
            Ok(total)
        };

        let total_income = total_for(Direction::Credit)?;
        let total_expenses = total_for(Direction::Debit)?;

        let transaction_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ? AND date BETWEEN ? AND ?",
            params![user_id, start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;

        Ok(Summary {
            period: ReportPeriod { start, end },
            total_income,
            total_expenses,
            net_balance: ((total_income - total_expenses) * 100.0).round() / 100.0,
            transaction_count,
        })
    }

    /// Spending breakdown by category for one direction, largest first.
    /// Uncategorized transactions are not included.
    pub fn spending_by_category(
        &self,
        user_id: i64,
        direction: Direction,
    ) -> Result<Vec<CategorySpending>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.name, c.color, ROUND(SUM(t.amount), 2), COUNT(t.id)
            FROM transactions t
            INNER JOIN categories c ON t.category_id = c.id
            WHERE t.user_id = ? AND t.direction = ?
            GROUP BY c.id, c.name, c.color
            ORDER BY SUM(t.amount) DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, direction.as_str()], |row| {
                Ok(CategorySpending {
                    category_id: row.get(0)?,
                    category_name: row.get(1)?,
                    color: row.get(2)?,
                    total: row.get(3)?,
                    transaction_count: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Monthly totals per direction for roughly the last `months` months
    pub fn monthly_trends(&self, user_id: i64, months: i64) -> Result<Vec<MonthlyTotal>> {
        let conn = self.conn()?;
        let start = chrono::Utc::now().date_naive() - Duration::days(months * 30);

        let mut stmt = conn.prepare(
            r#"
            SELECT strftime('%Y-%m', date) AS month, direction, ROUND(SUM(amount), 2)
            FROM transactions
            WHERE user_id = ? AND date >= ?
            GROUP BY month, direction
            ORDER BY month, direction
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, start.to_string()], |row| {
                let direction_str: String = row.get(1)?;
                Ok(MonthlyTotal {
                    month: row.get(0)?,
                    direction: direction_str.parse().unwrap_or(Direction::Neutral),
                    total: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
