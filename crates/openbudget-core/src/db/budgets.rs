//! Budget operations
//!
//! Writes are followed by a separate hydrated read so callers always get
//! the budget together with its category and transactions.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::info;

use super::{
    amount_to_db, budget_from_row, category_from_row, new_id, placeholders, row_exists, transaction_from_row,
    BudgetFilter, Database, BUDGET_COLUMNS, BUDGET_WIDTH, CATEGORY_COLUMNS, TRANSACTION_COLUMNS,
};
use crate::dates;
use crate::error::{Error, Result};
use crate::models::{non_blank, Budget, BudgetWithRelations, Category, NewBudget, Transaction};

pub(crate) const BUDGET_NOT_FOUND: &str = "Budget not found";

fn not_found() -> Error {
    Error::NotFound(BUDGET_NOT_FOUND.to_string())
}

/// Transactions tagged to any of the given budgets, grouped by budget id
fn transactions_by_budget(
    conn: &Connection,
    budget_ids: &[&str],
) -> Result<HashMap<String, Vec<Transaction>>> {
    let mut grouped: HashMap<String, Vec<Transaction>> = HashMap::new();
    if budget_ids.is_empty() {
        return Ok(grouped);
    }

    let sql = format!(
        "SELECT {} FROM transactions t WHERE t.budget_id IN ({}) ORDER BY t.date DESC, t.rowid DESC",
        TRANSACTION_COLUMNS,
        placeholders(budget_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(budget_ids.iter()), |row| {
        transaction_from_row(row, 0)
    })?;

    for row in rows {
        let tx = row?;
        if let Some(budget_id) = tx.budget_id.clone() {
            grouped.entry(budget_id).or_default().push(tx);
        }
    }

    Ok(grouped)
}

/// Attach transactions to budget/category pairs
fn hydrate(
    conn: &Connection,
    rows: Vec<(Budget, Category)>,
) -> Result<Vec<BudgetWithRelations>> {
    let ids: Vec<&str> = rows.iter().map(|(b, _)| b.id.as_str()).collect();
    let mut transactions = transactions_by_budget(conn, &ids)?;

    Ok(rows
        .into_iter()
        .map(|(budget, category)| BudgetWithRelations {
            transactions: transactions.remove(&budget.id).unwrap_or_default(),
            budget,
            category,
        })
        .collect())
}

/// Fetch one budget with its category and transactions
fn fetch_budget_with_relations(conn: &Connection, id: &str) -> Result<Option<BudgetWithRelations>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {}, {} FROM budgets b JOIN categories c ON c.id = b.category_id WHERE b.id = ?",
                BUDGET_COLUMNS, CATEGORY_COLUMNS
            ),
            params![id],
            |row| Ok((budget_from_row(row, 0)?, category_from_row(row, BUDGET_WIDTH)?)),
        )
        .optional()?;

    match row {
        Some(pair) => Ok(hydrate(conn, vec![pair])?.pop()),
        None => Ok(None),
    }
}

impl Database {
    /// Create a budget and return it with its category and transactions
    pub fn create_budget(&self, input: &NewBudget) -> Result<BudgetWithRelations> {
        input.validate()?;
        let conn = self.conn()?;

        let id = new_id();
        let now = dates::to_db(&Utc::now());
        conn.execute(
            r#"
            INSERT INTO budgets (id, name, amount, description, type, category_id, start_date, end_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                id,
                input.name.trim(),
                amount_to_db(input.amount),
                non_blank(&input.description),
                input.budget_type.as_str(),
                input.category_id,
                dates::to_db(&input.start_date),
                dates::to_db(&input.end_date),
                now,
                now,
            ],
        )
        .map_err(Error::from_write)?;

        info!(budget_id = %id, name = %input.name.trim(), "Created budget");

        fetch_budget_with_relations(&conn, &id)?.ok_or_else(not_found)
    }

    /// List budgets matching the filter, newest start date first
    pub fn list_budgets(&self, filter: &BudgetFilter) -> Result<Vec<BudgetWithRelations>> {
        let conn = self.conn()?;
        let built = filter.build();

        let sql = format!(
            "SELECT {}, {} FROM budgets b JOIN categories c ON c.id = b.category_id {} {}",
            BUDGET_COLUMNS, CATEGORY_COLUMNS, built.where_clause, built.order_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(built.params_refs().as_slice(), |row| {
                Ok((budget_from_row(row, 0)?, category_from_row(row, BUDGET_WIDTH)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        hydrate(&conn, rows)
    }

    /// Get a budget with its category and transactions
    pub fn get_budget(&self, id: &str) -> Result<BudgetWithRelations> {
        let conn = self.conn()?;
        fetch_budget_with_relations(&conn, id)?.ok_or_else(not_found)
    }

    /// Fail with `NotFound` unless the budget exists
    pub fn require_budget(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        if !row_exists(&conn, "budgets", id)? {
            return Err(not_found());
        }
        Ok(())
    }

    /// Replace every field of a budget, then return the hydrated record
    pub fn update_budget(&self, id: &str, input: &NewBudget) -> Result<BudgetWithRelations> {
        let conn = self.conn()?;
        if !row_exists(&conn, "budgets", id)? {
            return Err(not_found());
        }
        input.validate()?;

        conn.execute(
            r#"
            UPDATE budgets
            SET name = ?, amount = ?, description = ?, type = ?, category_id = ?,
                start_date = ?, end_date = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                input.name.trim(),
                amount_to_db(input.amount),
                non_blank(&input.description),
                input.budget_type.as_str(),
                input.category_id,
                dates::to_db(&input.start_date),
                dates::to_db(&input.end_date),
                dates::to_db(&Utc::now()),
                id,
            ],
        )
        .map_err(Error::from_write)?;

        fetch_budget_with_relations(&conn, id)?.ok_or_else(not_found)
    }

    /// Delete a budget. Its transactions stay, with `budget_id` cleared.
    pub fn delete_budget(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        if !row_exists(&conn, "budgets", id)? {
            return Err(not_found());
        }

        conn.execute("DELETE FROM budgets WHERE id = ?", params![id])
            .map_err(Error::from_write)?;

        info!(budget_id = %id, "Deleted budget");
        Ok(())
    }
}
