//! OpenBudget Core Library
//!
//! Shared functionality for the OpenBudget personal finance backend:
//! - Database access, schema setup and connection pooling
//! - Category, budget and transaction stores
//! - Shared list filter builder
//! - Timestamp parsing and storage format

pub mod dates;
pub mod db;
pub mod error;
pub mod models;

pub use db::{
    BudgetFilter, CategoryFilter, Database, DbStats, FilterParams, TransactionFilter,
};
pub use error::{Error, Result};
