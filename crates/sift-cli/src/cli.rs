//! CLI argument definitions

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Sift - ingest bank statements, track expenses", long_about = None)]
pub struct Cli {
    /// Path to the database file
    #[arg(long, global = true, default_value = "sift.db")]
    pub db: String,

    /// Skip database encryption (not recommended for production)
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// Run the ingestion pipeline on a statement file and print the preview
    /// without persisting anything
    Preview {
        /// Path to a CSV or spreadsheet statement export
        #[arg(short, long)]
        file: String,

        /// Manual date column override
        #[arg(long)]
        date_column: Option<String>,

        /// Manual amount column override
        #[arg(long)]
        amount_column: Option<String>,

        /// Manual description column override
        #[arg(long)]
        description_column: Option<String>,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (local development only)
        #[arg(long)]
        no_auth: bool,

        /// Directory of static files to serve alongside the API
        #[arg(long)]
        static_dir: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user account (prompts for a password on stdin)
    Add {
        username: String,

        /// Email address for the account
        #[arg(long)]
        email: Option<String>,
    },
}
