//! Keyword category rules
//!
//! Rules are upserted by (user, keyword) so concurrent category assignments
//! for the same keyword can never create duplicates; the unique constraint
//! plus `ON CONFLICT DO UPDATE` serializes them in the store.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::CategoryRule;

fn row_to_rule(row: &Row) -> rusqlite::Result<CategoryRule> {
    let created_at: String = row.get(5)?;
    Ok(CategoryRule {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        keyword: row.get(3)?,
        priority: row.get(4)?,
        created_at: parse_datetime(&created_at),
        category_name: row.get(6)?,
    })
}

impl Database {
    /// List a user's rules in matching order: priority descending, then
    /// most recently created first.
    pub fn list_rules(&self, user_id: i64) -> Result<Vec<CategoryRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.id, r.user_id, r.category_id, r.keyword, r.priority, r.created_at,
                   c.name
            FROM category_rules r
            INNER JOIN categories c ON r.category_id = c.id
            WHERE r.user_id = ?
            ORDER BY r.priority DESC, r.created_at DESC, r.id DESC
            "#,
        )?;

        let rules = stmt
            .query_map(params![user_id], row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    pub fn get_rule(&self, id: i64, user_id: i64) -> Result<Option<CategoryRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                r#"
                SELECT r.id, r.user_id, r.category_id, r.keyword, r.priority, r.created_at,
                       c.name
                FROM category_rules r
                INNER JOIN categories c ON r.category_id = c.id
                WHERE r.id = ? AND r.user_id = ?
                "#,
                params![id, user_id],
                row_to_rule,
            )
            .optional()?;
        Ok(rule)
    }

    /// Create or update the rule for (user, keyword)
    pub fn upsert_rule(
        &self,
        user_id: i64,
        keyword: &str,
        category_id: i64,
        priority: i32,
    ) -> Result<CategoryRule> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::InvalidData("Rule keyword is required".to_string()));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO category_rules (user_id, keyword, category_id, priority)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, keyword)
            DO UPDATE SET category_id = excluded.category_id, priority = excluded.priority
            "#,
            params![user_id, keyword, category_id, priority],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM category_rules WHERE user_id = ? AND keyword = ?",
            params![user_id, keyword],
            |row| row.get(0),
        )?;
        drop(conn);

        self.get_rule(id, user_id)?
            .ok_or_else(|| Error::NotFound("Rule not found after upsert".to_string()))
    }

    pub fn delete_rule(&self, id: i64, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM category_rules WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("Rule not found".to_string()));
        }
        Ok(())
    }

    /// Apply one keyword to every currently-uncategorized transaction of the
    /// owner whose description contains it (case-insensitive). Returns how
    /// many rows were updated.
    pub fn apply_rule_to_uncategorized(
        &self,
        user_id: i64,
        keyword: &str,
        category_id: i64,
    ) -> Result<usize> {
        let conn = self.conn()?;
        let pattern = format!("%{}%", keyword.trim());
        let changed = conn.execute(
            r#"
            UPDATE transactions
            SET category_id = ?, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ? AND category_id IS NULL AND description LIKE ?
            "#,
            params![category_id, user_id, pattern],
        )?;
        Ok(changed)
    }
}
