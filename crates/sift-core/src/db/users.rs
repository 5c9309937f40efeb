//! User accounts, password hashing, and session tokens

use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

/// Username reserved for the no-auth development mode
pub const LOCAL_USER: &str = "local-dev";

fn hash_password(password: &str) -> Result<String> {
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::{Argon2, PasswordHasher};

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    use argon2::password_hash::PasswordHash;
    use argon2::{Argon2, PasswordVerifier};

    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Session tokens are stored hashed; a stolen database never leaks a
/// usable token.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl Database {
    /// Create a user account
    pub fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidData("Username is required".to_string()));
        }
        if password.is_empty() {
            return Err(Error::InvalidData("Password is required".to_string()));
        }

        let conn = self.conn()?;

        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(Error::InvalidData("Username already exists".to_string()));
        }

        let password_hash = hash_password(password)?;
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)",
            params![username, email, password_hash],
        )?;
        let id = conn.last_insert_rowid();

        self.get_user(id)?
            .ok_or_else(|| Error::NotFound("User not found after creation".to_string()))
    }

    /// Verify credentials; returns the user on success
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let conn = self.conn()?;

        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE username = ?",
                params![username.trim()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (id, stored_hash) = match row {
            Some(r) => r,
            None => return Err(Error::Auth("Invalid username or password".to_string())),
        };

        if !verify_password(password, &stored_hash) {
            return Err(Error::Auth("Invalid username or password".to_string()));
        }

        self.get_user(id)?
            .ok_or_else(|| Error::Auth("Invalid username or password".to_string()))
    }

    /// Issue a new session token for a user. The returned token is shown to
    /// the caller once; only its hash is stored.
    pub fn create_session(&self, user_id: i64) -> Result<String> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (user_id, token_hash) VALUES (?, ?)",
            params![user_id, hash_token(&token)],
        )?;
        Ok(token)
    }

    /// Resolve a bearer token to its user, if the session exists
    pub fn user_for_token(&self, token: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user_id: Option<i64> = conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token_hash = ?",
                params![hash_token(token)],
                |row| row.get(0),
            )
            .optional()?;

        match user_id {
            Some(id) => self.get_user(id),
            None => Ok(None),
        }
    }

    /// Revoke one session token
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM sessions WHERE token_hash = ?",
            params![hash_token(token)],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, email, created_at FROM users WHERE id = ?",
                params![id],
                |row| {
                    let created_at: String = row.get(3)?;
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        created_at: parse_datetime(&created_at),
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Update a user's email address
    pub fn update_user_email(&self, id: i64, email: &str) -> Result<User> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET email = ? WHERE id = ?",
            params![email, id],
        )?;
        self.get_user(id)?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Fetch (or lazily create) the development user used when the server
    /// runs with authentication disabled.
    pub fn get_or_create_local_user(&self) -> Result<User> {
        let conn = self.conn()?;
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?",
                params![LOCAL_USER],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);

        match existing {
            Some(id) => self
                .get_user(id)?
                .ok_or_else(|| Error::NotFound("User not found".to_string())),
            None => {
                let token = uuid::Uuid::new_v4().simple().to_string();
                self.create_user(LOCAL_USER, "", &token)
            }
        }
    }
}
