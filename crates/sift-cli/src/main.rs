//! Sift CLI - ingest bank statements, track expenses
//!
//! Usage:
//!   sift init                  Initialize database and default categories
//!   sift preview --file CSV    Run the ingestion pipeline, print the preview
//!   sift user add NAME         Create a user account
//!   sift serve --port 3000     Start the web server

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Preview {
            file,
            date_column,
            amount_column,
            description_column,
        } => commands::cmd_preview(
            &file,
            date_column.as_deref(),
            amount_column.as_deref(),
            description_column.as_deref(),
        ),
        Commands::User { command } => match command {
            UserCommands::Add { username, email } => {
                commands::cmd_user_add(&cli.db, cli.no_encrypt, &username, email.as_deref())
            }
        },
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                no_auth,
                cli.no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
    }
}
