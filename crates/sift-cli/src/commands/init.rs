//! `sift init` - create the database and seed defaults

use anyhow::Result;

use super::open_database;

pub fn cmd_init(db_path: &str, no_encrypt: bool) -> Result<()> {
    let db = open_database(db_path, no_encrypt)?;
    db.seed_default_categories()?;

    println!("Initialized database at {}", db.path());
    if no_encrypt {
        println!("⚠️  Database is NOT encrypted (--no-encrypt)");
    }
    Ok(())
}
