//! Domain models for Sift

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a transaction, derived from the sign of the raw amount.
///
/// Amounts are stored as non-negative magnitudes with the direction carried
/// separately so that aggregation (sum of debits, sum of credits) stays
/// unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Inflow (positive raw amount)
    Credit,
    /// Outflow (negative raw amount)
    Debit,
    /// Zero amount
    Neutral,
}

impl Direction {
    /// Classify a signed amount: `> 0` CREDIT, `< 0` DEBIT, `= 0` NEUTRAL.
    pub fn classify(signed: Decimal) -> Self {
        if signed > Decimal::ZERO {
            Self::Credit
        } else if signed < Decimal::ZERO {
            Self::Debit
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREDIT" => Ok(Self::Credit),
            "DEBIT" => Ok(Self::Debit),
            "NEUTRAL" => Ok(Self::Neutral),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resolved column mapping for one ingested table.
///
/// Each field holds the *original* column name that was assigned to that
/// role, so callers can audit (and override) what the detector decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub amount: String,
    pub description: String,
}

/// Manual per-role column overrides supplied by the caller.
///
/// An override is honored only when the named column exists in the table;
/// otherwise detection runs normally for that role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleOverrides {
    pub date: Option<String>,
    pub amount: Option<String>,
    pub description: Option<String>,
}

/// A transaction produced by the ingestion pipeline, before persistence.
///
/// `category_id`/`category_name` are suggestions filled in by the rule
/// matcher (or left unset for the caller to assign).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    /// Non-negative magnitude, two decimal places
    pub amount: Decimal,
    pub direction: Direction,
    pub description: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
}

/// A transaction to be persisted (accepted back from a reviewed preview,
/// or entered manually).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    /// Non-negative magnitude, two decimal places
    pub amount: Decimal,
    pub direction: Direction,
    pub description: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A stored transaction
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub direction: Direction,
    pub description: String,
    pub category_id: Option<i64>,
    /// Joined category name, for display
    pub category_name: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An expense/income category
///
/// `user_id` is None for shared default categories seeded at init time.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub is_default: bool,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A keyword rule that assigns a category to matching descriptions.
///
/// At most one rule exists per (owner, keyword) pair; rules are upserted,
/// not duplicated. Matching is case-insensitive substring containment.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRule {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub keyword: String,
    pub priority: i32,
    /// Joined category name, for display
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A monthly budget limit for one category
#[derive(Debug, Clone, Serialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    /// Joined category name, for display
    pub category_name: Option<String>,
    pub amount: Decimal,
    /// First day of the month this budget applies to
    pub month: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A user account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Date range for a report
#[derive(Debug, Clone, Serialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Overall financial summary for a period
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub period: ReportPeriod,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    pub transaction_count: i64,
}

/// Spending rollup for one category
#[derive(Debug, Clone, Serialize)]
pub struct CategorySpending {
    pub category_id: i64,
    pub category_name: String,
    pub color: String,
    pub total: f64,
    pub transaction_count: i64,
}

/// One month's total for one direction
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTotal {
    /// "YYYY-MM"
    pub month: String,
    pub direction: Direction,
    pub total: f64,
}
