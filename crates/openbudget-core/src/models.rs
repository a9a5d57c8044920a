//! Domain models for OpenBudget

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest magnitude a `DECIMAL(10,2)` column can hold
const AMOUNT_LIMIT: i64 = 100_000_000;

/// Direction of money flow. Shared by categories, budgets and transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "EXPENSE",
            Self::Income => "INCOME",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "EXPENSE" => Ok(Self::Expense),
            "INCOME" => Ok(Self::Income),
            _ => Err(format!(
                "Invalid type: {} (expected EXPENSE or INCOME)",
                s
            )),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How often a recurring transaction repeats. Stored only, never executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurringFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl std::str::FromStr for RecurringFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            _ => Err(format!(
                "Invalid recurring frequency: {} (expected DAILY, WEEKLY, MONTHLY or YEARLY)",
                s
            )),
        }
    }
}

impl std::fmt::Display for RecurringFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Categories ==========

/// A spending or income category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Hex color code (`#RRGGBB`)
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a category
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        if let Some(color) = non_blank(&self.color) {
            if !is_hex_color(color) {
                return Err(Error::validation(format!(
                    "Invalid color: {} (expected #RRGGBB)",
                    color
                )));
            }
        }
        Ok(())
    }
}

/// The slice of a transaction eager-loaded under a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub id: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

/// A category with its transactions (id/amount/date only)
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithTransactions {
    #[serde(flatten)]
    pub category: Category,
    pub transactions: Vec<TransactionSummary>,
}

// ========== Budgets ==========

/// A spending or income target for one category over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub budget_type: TransactionType,
    pub category_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a budget
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub name: String,
    pub amount: Decimal,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub budget_type: TransactionType,
    pub category_id: String,
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "crate::dates::deserialize")]
    pub end_date: DateTime<Utc>,
}

impl NewBudget {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        check_precision(self.amount)
    }
}

/// A budget with its category and transactions
#[derive(Debug, Clone, Serialize)]
pub struct BudgetWithRelations {
    #[serde(flatten)]
    pub budget: Budget,
    pub category: Category,
    pub transactions: Vec<Transaction>,
}

// ========== Transactions ==========

/// A single income or expense entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub category_id: String,
    pub date: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub budget_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a transaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub category_id: String,
    /// Defaults to now on create; kept as stored on update
    #[serde(default, deserialize_with = "crate::dates::deserialize_optional")]
    pub date: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub budget_id: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        require_text("description", &self.description)?;
        if self.amount < Decimal::ZERO {
            return Err(Error::validation(format!(
                "Amount must be zero or greater (got {})",
                self.amount
            )));
        }
        check_precision(self.amount)
    }
}

/// A transaction with its category and (optional) budget
#[derive(Debug, Clone, Serialize)]
pub struct TransactionWithRelations {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: Category,
    pub budget: Option<Budget>,
}

// ========== Validation helpers ==========

/// True for `#RRGGBB` in either case
pub fn is_hex_color(value: &str) -> bool {
    static COLOR: OnceLock<Regex> = OnceLock::new();
    COLOR
        .get_or_init(|| Regex::new(r"(?i)^#[0-9A-F]{6}$").expect("static color pattern"))
        .is_match(value)
}

/// Treat a whitespace-only optional field as absent
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn check_precision(amount: Decimal) -> Result<()> {
    if crate::db::round_amount(amount).abs() >= Decimal::from(AMOUNT_LIMIT) {
        return Err(Error::validation(format!(
            "Amount {} exceeds the supported precision (10 digits, 2 decimals)",
            amount
        )));
    }
    Ok(())
}
