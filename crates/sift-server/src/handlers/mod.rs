//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analytics;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod import;
pub mod rules;
pub mod transactions;

// Re-export all handlers for use in router
pub use analytics::*;
pub use auth::*;
pub use budgets::*;
pub use categories::*;
pub use import::*;
pub use rules::*;
pub use transactions::*;
