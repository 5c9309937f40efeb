//! `sift serve` - start the web server

use anyhow::Result;

use sift_server::ServerConfig;

use super::open_database;

pub async fn cmd_serve(
    db_path: &str,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
    static_dir: Option<&str>,
) -> Result<()> {
    let db = open_database(db_path, no_encrypt)?;

    let config = ServerConfig {
        require_auth: !no_auth,
        ..Default::default()
    };

    sift_server::serve_with_config(db, host, port, static_dir, config).await
}
