//! Transaction operations

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Direction, NewTransaction, Transaction};
use crate::normalize::MAX_DESCRIPTION_LEN;

/// Filters for listing a user's transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub direction: Option<Direction>,
    pub category_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(2)?;
    let amount_str: String = row.get(3)?;
    let direction_str: String = row.get(4)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        direction: direction_str.parse().unwrap_or(Direction::Neutral),
        description: row.get(5)?,
        category_id: row.get(6)?,
        notes: row.get(7)?,
        category_name: row.get(8)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

const SELECT_TRANSACTION: &str = r#"
    SELECT t.id, t.user_id, t.date, t.amount, t.direction, t.description,
           t.category_id, t.notes, c.name, t.created_at, t.updated_at
    FROM transactions t
    LEFT JOIN categories c ON t.category_id = c.id
"#;

impl Database {
    /// Insert a transaction for a user.
    ///
    /// Enforces the stored invariants: non-negative amount, non-empty
    /// description within the length cap, and a referenceable category.
    pub fn insert_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Transaction> {
        if tx.amount < Decimal::ZERO {
            return Err(Error::InvalidData(
                "Amount must be non-negative; use direction to encode the sign".to_string(),
            ));
        }
        let description = tx.description.trim();
        if description.is_empty() {
            return Err(Error::InvalidData("Description is required".to_string()));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::InvalidData(format!(
                "Description exceeds {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        if let Some(category_id) = tx.category_id {
            if self.get_visible_category(category_id, user_id)?.is_none() {
                return Err(Error::InvalidData(format!(
                    "Category {} not found",
                    category_id
                )));
            }
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (user_id, date, amount, direction, description, category_id, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.date.to_string(),
                tx.amount.round_dp(2).to_string(),
                tx.direction.as_str(),
                description,
                tx.category_id,
                tx.notes.as_deref().unwrap_or(""),
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_transaction(id, user_id)?
            .ok_or_else(|| Error::NotFound("Transaction not found after insert".to_string()))
    }

    pub fn get_transaction(&self, id: i64, user_id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("{} WHERE t.id = ? AND t.user_id = ?", SELECT_TRANSACTION),
                params![id, user_id],
                row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// List a user's transactions with optional filters, newest first
    pub fn list_transactions(&self, user_id: i64, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut conditions = vec!["t.user_id = ?".to_string()];
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(direction) = query.direction {
            conditions.push("t.direction = ?".to_string());
            params_vec.push(Box::new(direction.as_str().to_string()));
        }
        if let Some(category_id) = query.category_id {
            conditions.push("t.category_id = ?".to_string());
            params_vec.push(Box::new(category_id));
        }
        if let Some(start) = query.start_date {
            conditions.push("t.date >= ?".to_string());
            params_vec.push(Box::new(start.to_string()));
        }
        if let Some(end) = query.end_date {
            conditions.push("t.date <= ?".to_string());
            params_vec.push(Box::new(end.to_string()));
        }

        let limit = if query.limit > 0 { query.limit } else { 100 };
        params_vec.push(Box::new(limit));
        params_vec.push(Box::new(query.offset));

        let sql = format!(
            "{} WHERE {} ORDER BY t.date DESC, t.id DESC LIMIT ? OFFSET ?",
            SELECT_TRANSACTION,
            conditions.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let transactions = stmt
            .query_map(param_refs.as_slice(), row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Partially update a transaction. Only supplied fields change.
    #[allow(clippy::too_many_arguments)]
    pub fn update_transaction(
        &self,
        id: i64,
        user_id: i64,
        date: Option<NaiveDate>,
        amount: Option<Decimal>,
        direction: Option<Direction>,
        description: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Transaction> {
        if self.get_transaction(id, user_id)?.is_none() {
            return Err(Error::NotFound("Transaction not found".to_string()));
        }

        if let Some(amount) = amount {
            if amount < Decimal::ZERO {
                return Err(Error::InvalidData(
                    "Amount must be non-negative; use direction to encode the sign".to_string(),
                ));
            }
        }
        if let Some(description) = description {
            if description.trim().is_empty() {
                return Err(Error::InvalidData("Description is required".to_string()));
            }
        }

        let conn = self.conn()?;
        if let Some(date) = date {
            conn.execute(
                "UPDATE transactions SET date = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                params![date.to_string(), id],
            )?;
        }
        if let Some(amount) = amount {
            conn.execute(
                "UPDATE transactions SET amount = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                params![amount.round_dp(2).to_string(), id],
            )?;
        }
        if let Some(direction) = direction {
            conn.execute(
                "UPDATE transactions SET direction = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                params![direction.as_str(), id],
            )?;
        }
        if let Some(description) = description {
            conn.execute(
                "UPDATE transactions SET description = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                params![description.trim(), id],
            )?;
        }
        if let Some(notes) = notes {
            conn.execute(
                "UPDATE transactions SET notes = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                params![notes, id],
            )?;
        }
        drop(conn);

        self.get_transaction(id, user_id)?
            .ok_or_else(|| Error::NotFound("Transaction not found".to_string()))
    }

    /// Set (or clear) a transaction's category
    pub fn set_transaction_category(
        &self,
        id: i64,
        user_id: i64,
        category_id: Option<i64>,
    ) -> Result<Transaction> {
        if let Some(category_id) = category_id {
            if self.get_visible_category(category_id, user_id)?.is_none() {
                return Err(Error::NotFound("Category not found".to_string()));
            }
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE transactions SET category_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND user_id = ?",
            params![category_id, id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("Transaction not found".to_string()));
        }
        drop(conn);

        self.get_transaction(id, user_id)?
            .ok_or_else(|| Error::NotFound("Transaction not found".to_string()))
    }

    pub fn delete_transaction(&self, id: i64, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("Transaction not found".to_string()));
        }
        Ok(())
    }
}
