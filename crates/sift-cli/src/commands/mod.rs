//! CLI command implementations

mod init;
mod preview;
mod serve;
mod users;

pub use init::cmd_init;
pub use preview::cmd_preview;
pub use serve::cmd_serve;
pub use users::cmd_user_add;

use anyhow::Result;
use sift_core::db::Database;

/// Open the database, honoring the --no-encrypt flag
pub(crate) fn open_database(path: &str, no_encrypt: bool) -> Result<Database> {
    let db = if no_encrypt {
        Database::new_unencrypted(path)?
    } else {
        Database::new(path)?
    };
    Ok(db)
}
