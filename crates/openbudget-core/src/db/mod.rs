//! Database access layer with connection pooling and schema setup
//!
//! This module is organized by resource:
//! - `categories` - Category CRUD
//! - `budgets` - Budget CRUD with category/transaction hydration
//! - `transactions` - Transaction CRUD with category/budget hydration
//! - `filter` - Shared list filter builder

use std::str::FromStr;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OptionalExtension;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::info;

use crate::dates;
use crate::error::Result;
use crate::models::{Budget, Category, RecurringFrequency, Transaction, TransactionType};

mod budgets;
mod categories;
mod filter;
mod transactions;

pub use filter::{
    BudgetFilter, CategoryFilter, FilterParams, FilterResult, QueryFilter, TransactionFilter,
};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// How long a connection waits on a locked database before failing (ms)
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Column lists shared by every query that maps rows through the helpers
/// below. Order matters: the `*_from_row` functions read by position.
pub(crate) const CATEGORY_COLUMNS: &str =
    "c.id, c.name, c.type, c.description, c.icon, c.color, c.created_at, c.updated_at";
pub(crate) const BUDGET_COLUMNS: &str = "b.id, b.name, b.amount, b.description, b.type, \
     b.category_id, b.start_date, b.end_date, b.created_at, b.updated_at";
pub(crate) const TRANSACTION_COLUMNS: &str = "t.id, t.type, t.amount, t.description, \
     t.category_id, t.date, t.is_recurring, t.recurring_frequency, t.budget_id, \
     t.created_at, t.updated_at";

pub(crate) const CATEGORY_WIDTH: usize = 8;
pub(crate) const BUDGET_WIDTH: usize = 10;
pub(crate) const TRANSACTION_WIDTH: usize = 11;

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

/// Row counts per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub categories: i64,
    pub budgets: i64,
    pub transactions: i64,
}

impl Database {
    /// Open (or create) a database file and apply the schema
    pub fn new(path: &str) -> Result<Self> {
        // Foreign keys are a per-connection setting in SQLite, so every pooled
        // connection has to switch them on or the cascade rules never fire.
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(&format!(
                "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
                BUSY_TIMEOUT_MS
            ))
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each pooled
    /// connection to `:memory:` would see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "openbudget_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove leftovers from an earlier run with the same pid
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Round-trip a trivial query to prove the database is usable
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Count rows in each table
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?)
        };

        Ok(DbStats {
            categories: count("categories")?,
            budgets: count("budgets")?,
            transactions: count("transactions")?,
        })
    }

    /// Create tables and indexes (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Categories (leaf entity, referenced by budgets and transactions)
            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                type TEXT NOT NULL CHECK (type IN ('EXPENSE', 'INCOME')),
                description TEXT,
                icon TEXT,
                color TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_categories_type ON categories(type);

            -- Budgets (removed together with their category)
            CREATE TABLE IF NOT EXISTS budgets (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                amount TEXT NOT NULL,                      -- DECIMAL(10,2) as text
                description TEXT,
                type TEXT NOT NULL CHECK (type IN ('EXPENSE', 'INCOME')),
                category_id TEXT NOT NULL
                    REFERENCES categories(id) ON DELETE CASCADE ON UPDATE CASCADE,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_budgets_category ON budgets(category_id);
            CREATE INDEX IF NOT EXISTS idx_budgets_start_date ON budgets(start_date);

            -- Transactions (removed with their category, detached from their budget)
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL CHECK (type IN ('EXPENSE', 'INCOME')),
                amount TEXT NOT NULL,                      -- DECIMAL(10,2) as text, >= 0
                description TEXT NOT NULL,
                category_id TEXT NOT NULL
                    REFERENCES categories(id) ON DELETE CASCADE ON UPDATE CASCADE,
                date TEXT NOT NULL,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                recurring_frequency TEXT
                    CHECK (recurring_frequency IN ('DAILY', 'WEEKLY', 'MONTHLY', 'YEARLY')),
                budget_id TEXT
                    REFERENCES budgets(id) ON DELETE SET NULL ON UPDATE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(type);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_budget ON transactions(budget_id);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

// ========== Row mapping ==========

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        msg.into(),
    )
}

fn type_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<TransactionType> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn decimal_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| conversion_error(idx, e.to_string()))
}

/// Map `CATEGORY_COLUMNS` starting at `base`
pub(crate) fn category_from_row(row: &rusqlite::Row, base: usize) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        category_type: type_column(row, base + 2)?,
        description: row.get(base + 3)?,
        icon: row.get(base + 4)?,
        color: row.get(base + 5)?,
        created_at: dates::from_db(row, base + 6)?,
        updated_at: dates::from_db(row, base + 7)?,
    })
}

/// Map `BUDGET_COLUMNS` starting at `base`
pub(crate) fn budget_from_row(row: &rusqlite::Row, base: usize) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        amount: decimal_column(row, base + 2)?,
        description: row.get(base + 3)?,
        budget_type: type_column(row, base + 4)?,
        category_id: row.get(base + 5)?,
        start_date: dates::from_db(row, base + 6)?,
        end_date: dates::from_db(row, base + 7)?,
        created_at: dates::from_db(row, base + 8)?,
        updated_at: dates::from_db(row, base + 9)?,
    })
}

/// Map `TRANSACTION_COLUMNS` starting at `base`
pub(crate) fn transaction_from_row(
    row: &rusqlite::Row,
    base: usize,
) -> rusqlite::Result<Transaction> {
    let frequency: Option<String> = row.get(base + 7)?;
    Ok(Transaction {
        id: row.get(base)?,
        transaction_type: type_column(row, base + 1)?,
        amount: decimal_column(row, base + 2)?,
        description: row.get(base + 3)?,
        category_id: row.get(base + 4)?,
        date: dates::from_db(row, base + 5)?,
        is_recurring: row.get(base + 6)?,
        recurring_frequency: frequency
            .map(|f| f.parse::<RecurringFrequency>())
            .transpose()
            .map_err(|e| conversion_error(base + 7, e))?,
        budget_id: row.get(base + 8)?,
        created_at: dates::from_db(row, base + 9)?,
        updated_at: dates::from_db(row, base + 10)?,
    })
}

/// Round to cents, half away from zero (`12.345` -> `12.35`)
pub(crate) fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Store a money amount as fixed two-decimal text
pub(crate) fn amount_to_db(amount: Decimal) -> String {
    let mut rounded = round_amount(amount);
    rounded.rescale(2);
    rounded.to_string()
}

/// Whether `table` has a row with this id, without mapping or loading relations
pub(crate) fn row_exists(conn: &rusqlite::Connection, table: &str, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?", table),
            [id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Placeholder list for an `IN (...)` clause
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
