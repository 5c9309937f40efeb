//! Category operations
//!
//! Users see the shared defaults plus their own categories. Defaults are
//! read-only through this interface.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Category;

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    let created_at: String = row.get(5)?;
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        is_default: row.get(3)?,
        color: row.get(4)?,
        created_at: parse_datetime(&created_at),
    })
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, is_default, color, created_at";

impl Database {
    /// List the categories visible to a user: defaults plus their own
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE is_default = 1 OR user_id = ? ORDER BY name",
            CATEGORY_COLUMNS
        ))?;

        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS),
                params![id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Get a category only if the user may reference it (a default or
    /// their own)
    pub fn get_visible_category(&self, id: i64, user_id: i64) -> Result<Option<Category>> {
        let category = self.get_category(id)?;
        Ok(category.filter(|c| c.is_default || c.user_id == Some(user_id)))
    }

    /// Create a custom category for a user
    pub fn create_category(&self, user_id: i64, name: &str, color: Option<&str>) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name is required".to_string()));
        }

        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO categories (user_id, name, is_default, color) VALUES (?, ?, 0, ?)",
            params![user_id, name, color.unwrap_or("#6B7280")],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                drop(conn);
                self.get_category(id)?
                    .ok_or_else(|| Error::NotFound("Category not found after creation".to_string()))
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::InvalidData(format!(
                    "Category '{}' already exists",
                    name
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update a user's own category (defaults are read-only)
    pub fn update_category(
        &self,
        id: i64,
        user_id: i64,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Category> {
        let conn = self.conn()?;

        let owned: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE id = ? AND user_id = ? AND is_default = 0",
                params![id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(Error::NotFound("Category not found".to_string()));
        }

        if let Some(name) = name {
            conn.execute(
                "UPDATE categories SET name = ? WHERE id = ?",
                params![name.trim(), id],
            )?;
        }
        if let Some(color) = color {
            conn.execute(
                "UPDATE categories SET color = ? WHERE id = ?",
                params![color, id],
            )?;
        }
        drop(conn);

        self.get_category(id)?
            .ok_or_else(|| Error::NotFound("Category not found".to_string()))
    }

    /// Delete a user's own category (defaults are protected)
    pub fn delete_category(&self, id: i64, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ? AND is_default = 0",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound("Category not found".to_string()));
        }
        Ok(())
    }
}
