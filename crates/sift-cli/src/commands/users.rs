//! `sift user` - account management

use std::io::{BufRead, Write};

use anyhow::{bail, Result};

use super::open_database;

pub fn cmd_user_add(
    db_path: &str,
    no_encrypt: bool,
    username: &str,
    email: Option<&str>,
) -> Result<()> {
    let db = open_database(db_path, no_encrypt)?;

    eprint!("Password for {}: ", username);
    std::io::stderr().flush()?;
    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let user = db.create_user(username, email.unwrap_or(""), password)?;
    println!("Created user {} (id {})", user.username, user.id);
    Ok(())
}
