//! Sift Core Library
//!
//! Shared functionality for the Sift expense tracker:
//! - Statement ingestion pipeline: tabular loader, column role detection,
//!   field normalizers, direction classification
//! - Keyword rule matching for category suggestions
//! - Database access and migrations
//! - Aggregation queries for analytics

pub mod db;
pub mod detect;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod rules;
pub mod table;

pub use db::Database;
pub use error::{Error, Result};
pub use ingest::{ingest, IngestOutcome, RejectionCounts};
pub use models::{
    Budget, Category, CategoryRule, ColumnMapping, Direction, NewTransaction, ParsedTransaction,
    RoleOverrides, Transaction, User,
};
